use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::services::config::ConfigError;

use super::{Hive, Registry, RegistryError};

type KeyValues = BTreeMap<String, SnapshotValue>;
type HiveTree = BTreeMap<String, KeyValues>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SnapshotValue {
    Dword(u32),
    Text(String),
}

/// A captured registry view, in the flat shape of a registry export: each
/// entry maps a full key path to its values. Listing a key implies all of
/// its ancestor keys exist. `accounts` optionally maps SIDs to display
/// names captured alongside the hives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub users: HiveTree,
    #[serde(default)]
    pub current_user: HiveTree,
    #[serde(default)]
    pub local_machine: HiveTree,
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
}

/// In-memory registry with the same lookup semantics as the live one:
/// key and value names match case-insensitively.
pub struct MemoryRegistry {
    inner: Mutex<RegistrySnapshot>,
}

fn eq_ic(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn child_of<'a>(stored: &'a str, path: &str) -> Option<&'a str> {
    let rest = if path.is_empty() {
        stored
    } else {
        if stored.len() <= path.len() || !stored.is_char_boundary(path.len()) {
            return None;
        }
        let (head, tail) = stored.split_at(path.len());
        if !eq_ic(head, path) || !tail.starts_with('\\') {
            return None;
        }
        &tail[1..]
    };
    match rest.split('\\').next() {
        Some("") | None => None,
        Some(seg) => Some(seg),
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::from_snapshot(RegistrySnapshot::default())
    }

    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError(format!("cannot read snapshot {}: {e}", path.display()))
        })?;
        let snapshot: RegistrySnapshot = serde_json::from_str(&raw).map_err(|e| {
            ConfigError(format!("invalid snapshot {}: {e}", path.display()))
        })?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn accounts(&self) -> BTreeMap<String, String> {
        self.inner.lock().expect("snapshot lock").accounts.clone()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.lock().expect("snapshot lock").clone()
    }

    fn with_tree<R>(&self, hive: Hive, f: impl FnOnce(&HiveTree) -> R) -> R {
        let guard = self.inner.lock().expect("snapshot lock");
        f(match hive {
            Hive::CurrentUser => &guard.current_user,
            Hive::Users => &guard.users,
            Hive::LocalMachine => &guard.local_machine,
        })
    }

    fn with_tree_mut<R>(&self, hive: Hive, f: impl FnOnce(&mut HiveTree) -> R) -> R {
        let mut guard = self.inner.lock().expect("snapshot lock");
        f(match hive {
            Hive::CurrentUser => &mut guard.current_user,
            Hive::Users => &mut guard.users,
            Hive::LocalMachine => &mut guard.local_machine,
        })
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for MemoryRegistry {
    fn subkeys(&self, hive: Hive, path: &str) -> Option<Vec<String>> {
        self.with_tree(hive, |tree| {
            let mut exists = path.is_empty();
            let mut children: Vec<String> = Vec::new();
            for stored in tree.keys() {
                if eq_ic(stored, path) {
                    exists = true;
                }
                if let Some(seg) = child_of(stored, path) {
                    exists = true;
                    if !children.iter().any(|c| eq_ic(c, seg)) {
                        children.push(seg.to_string());
                    }
                }
            }
            exists.then_some(children)
        })
    }

    fn string_values(&self, hive: Hive, path: &str) -> Option<Vec<String>> {
        self.with_tree(hive, |tree| {
            if let Some((_, values)) = tree.iter().find(|(k, _)| eq_ic(k, path)) {
                return Some(
                    values
                        .values()
                        .filter_map(|v| match v {
                            SnapshotValue::Text(s) => Some(s.clone()),
                            SnapshotValue::Dword(_) => None,
                        })
                        .collect(),
                );
            }
            // key exists only as an ancestor of stored keys: no values
            tree.keys()
                .any(|stored| child_of(stored, path).is_some())
                .then(Vec::new)
        })
    }

    fn string_value(&self, hive: Hive, path: &str, name: &str) -> Option<String> {
        self.with_tree(hive, |tree| {
            let (_, values) = tree.iter().find(|(k, _)| eq_ic(k, path))?;
            values.iter().find_map(|(n, v)| match v {
                SnapshotValue::Text(s) if eq_ic(n, name) => Some(s.clone()),
                _ => None,
            })
        })
    }

    fn dword(&self, hive: Hive, path: &str, name: &str) -> Option<u32> {
        self.with_tree(hive, |tree| {
            let (_, values) = tree.iter().find(|(k, _)| eq_ic(k, path))?;
            values.iter().find_map(|(n, v)| match v {
                SnapshotValue::Dword(d) if eq_ic(n, name) => Some(*d),
                _ => None,
            })
        })
    }

    fn set_dword(
        &self,
        hive: Hive,
        path: &str,
        name: &str,
        data: u32,
    ) -> Result<(), RegistryError> {
        if !self.key_exists(hive, path) {
            return Err(RegistryError::KeyNotFound(path.to_string()));
        }
        self.with_tree_mut(hive, |tree| {
            let stored = tree
                .keys()
                .find(|k| eq_ic(k, path))
                .cloned()
                .unwrap_or_else(|| path.to_string());
            let values = tree.entry(stored).or_default();
            let value_name = values
                .keys()
                .find(|n| eq_ic(n, name))
                .cloned()
                .unwrap_or_else(|| name.to_string());
            values.insert(value_name, SnapshotValue::Dword(data));
            Ok(())
        })
    }

    fn delete_value(&self, hive: Hive, path: &str, name: &str) -> Result<(), RegistryError> {
        if !self.key_exists(hive, path) {
            return Err(RegistryError::KeyNotFound(path.to_string()));
        }
        self.with_tree_mut(hive, |tree| {
            let Some(stored) = tree.keys().find(|k| eq_ic(k, path)).cloned() else {
                return Err(RegistryError::ValueNotFound(name.to_string()));
            };
            let values = tree.entry(stored).or_default();
            let Some(value_name) = values.keys().find(|n| eq_ic(n, name)).cloned() else {
                return Err(RegistryError::ValueNotFound(name.to_string()));
            };
            values.remove(&value_name);
            Ok(())
        })
    }
}
