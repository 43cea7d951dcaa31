use winreg::enums::{
    HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS, KEY_READ, KEY_SET_VALUE,
};
use winreg::types::FromRegValue;
use winreg::RegKey;

use super::{Hive, Registry, RegistryError};

/// Live registry access. Each call opens, reads, and releases its own key
/// handle; nothing is kept open across calls.
pub struct WindowsRegistry;

fn root(hive: Hive) -> RegKey {
    RegKey::predef(match hive {
        Hive::CurrentUser => HKEY_CURRENT_USER,
        Hive::Users => HKEY_USERS,
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
    })
}

impl Registry for WindowsRegistry {
    fn subkeys(&self, hive: Hive, path: &str) -> Option<Vec<String>> {
        let key = root(hive).open_subkey_with_flags(path, KEY_READ).ok()?;
        Some(key.enum_keys().filter_map(|k| k.ok()).collect())
    }

    fn string_values(&self, hive: Hive, path: &str) -> Option<Vec<String>> {
        let key = root(hive).open_subkey_with_flags(path, KEY_READ).ok()?;
        Some(
            key.enum_values()
                .filter_map(|v| v.ok())
                .filter_map(|(_, value)| String::from_reg_value(&value).ok())
                .collect(),
        )
    }

    fn string_value(&self, hive: Hive, path: &str, name: &str) -> Option<String> {
        let key = root(hive).open_subkey_with_flags(path, KEY_READ).ok()?;
        key.get_value::<String, _>(name).ok()
    }

    fn dword(&self, hive: Hive, path: &str, name: &str) -> Option<u32> {
        let key = root(hive).open_subkey_with_flags(path, KEY_READ).ok()?;
        key.get_value::<u32, _>(name).ok()
    }

    fn set_dword(
        &self,
        hive: Hive,
        path: &str,
        name: &str,
        data: u32,
    ) -> Result<(), RegistryError> {
        let key = root(hive)
            .open_subkey_with_flags(path, KEY_SET_VALUE)
            .map_err(|_| RegistryError::KeyNotFound(path.to_string()))?;
        key.set_value(name, &data)
            .map_err(|e| RegistryError::Access(e.to_string()))
    }

    fn delete_value(&self, hive: Hive, path: &str, name: &str) -> Result<(), RegistryError> {
        let key = root(hive)
            .open_subkey_with_flags(path, KEY_SET_VALUE)
            .map_err(|_| RegistryError::KeyNotFound(path.to_string()))?;
        key.delete_value(name)
            .map_err(|_| RegistryError::ValueNotFound(name.to_string()))
    }
}
