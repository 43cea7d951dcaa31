//! Registry access layer.
//!
//! All traversal and gate code talks to `dyn Registry` so the same logic
//! runs against the live Windows registry and against a captured snapshot.
//! Key handles are opened, used, and released inside a single trait call;
//! nothing holds a handle across phases of a run.
//!
//! ## Files
//! - `memory.rs` — in-memory hive store fed by a JSON snapshot.
//! - `windows.rs` — live `winreg`-backed store (Windows builds only).

pub mod memory;
#[cfg(windows)]
pub mod windows;

use std::path::Path;

use crate::services::identity::{AccountMapResolver, IdentityResolver};
use memory::MemoryRegistry;
#[cfg(windows)]
use windows::WindowsRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hive {
    CurrentUser,
    Users,
    LocalMachine,
}

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("registry key not found: {0}")]
    KeyNotFound(String),
    #[error("registry value not found: {0}")]
    ValueNotFound(String),
    #[error("registry access failed: {0}")]
    Access(String),
}

/// Read/write view of a registry namespace.
///
/// Absence is a normal outcome, not an error: lookups return `None` when the
/// key or value does not exist. Only mutations can fail.
pub trait Registry {
    /// Child key names of `path`, or `None` when the key itself is missing.
    /// An existing key with no children yields `Some(vec![])`.
    fn subkeys(&self, hive: Hive, path: &str) -> Option<Vec<String>>;

    /// All string-typed value data under `path`, in enumeration order.
    fn string_values(&self, hive: Hive, path: &str) -> Option<Vec<String>>;

    fn string_value(&self, hive: Hive, path: &str, name: &str) -> Option<String>;

    fn dword(&self, hive: Hive, path: &str, name: &str) -> Option<u32>;

    fn set_dword(&self, hive: Hive, path: &str, name: &str, data: u32)
        -> Result<(), RegistryError>;

    fn delete_value(&self, hive: Hive, path: &str, name: &str) -> Result<(), RegistryError>;

    fn key_exists(&self, hive: Hive, path: &str) -> bool {
        self.subkeys(hive, path).is_some()
    }
}

/// Where a run reads its registry data from.
pub enum RegistrySource {
    Snapshot(MemoryRegistry),
    #[cfg(windows)]
    Live(WindowsRegistry),
}

impl RegistrySource {
    pub fn open(snapshot: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = snapshot {
            return Ok(Self::Snapshot(MemoryRegistry::load(path)?));
        }

        #[cfg(windows)]
        {
            Ok(Self::Live(WindowsRegistry))
        }

        #[cfg(not(windows))]
        {
            Err(crate::services::config::ConfigError(
                "live registry capture requires Windows; provide --snapshot <file>".to_string(),
            )
            .into())
        }
    }

    pub fn registry(&self) -> &dyn Registry {
        match self {
            Self::Snapshot(m) => m,
            #[cfg(windows)]
            Self::Live(w) => w,
        }
    }

    pub fn resolver(&self) -> Box<dyn IdentityResolver + '_> {
        match self {
            Self::Snapshot(m) => Box::new(AccountMapResolver::new(m.accounts())),
            #[cfg(windows)]
            Self::Live(w) => Box::new(crate::services::identity::VolatileEnvResolver::new(w)),
        }
    }
}
