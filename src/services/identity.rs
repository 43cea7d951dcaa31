use std::collections::BTreeMap;

use crate::registry::{Hive, Registry};

/// Resolves a security identifier to a display name. Resolution failure is
/// never fatal; callers fall back to the raw SID.
pub trait IdentityResolver {
    fn resolve(&self, sid: &str) -> Option<String>;
}

/// Display names captured alongside a registry snapshot.
pub struct AccountMapResolver {
    accounts: BTreeMap<String, String>,
}

impl AccountMapResolver {
    pub fn new(accounts: BTreeMap<String, String>) -> Self {
        Self { accounts }
    }
}

impl IdentityResolver for AccountMapResolver {
    fn resolve(&self, sid: &str) -> Option<String> {
        self.accounts
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(sid))
            .map(|(_, v)| v.clone())
    }
}

/// Reads the logged-on user name a hive records about itself under
/// `Volatile Environment`. Only present for accounts with an active session.
pub struct VolatileEnvResolver<'r> {
    reg: &'r dyn Registry,
}

impl<'r> VolatileEnvResolver<'r> {
    pub fn new(reg: &'r dyn Registry) -> Self {
        Self { reg }
    }
}

impl IdentityResolver for VolatileEnvResolver<'_> {
    fn resolve(&self, sid: &str) -> Option<String> {
        self.reg
            .string_value(Hive::Users, &format!("{sid}\\Volatile Environment"), "USERNAME")
    }
}
