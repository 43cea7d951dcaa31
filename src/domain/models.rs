use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// One recovered recently-used document entry.
///
/// Built by the walker from a single decoded registry value, optionally
/// enriched with macro modules, and never mutated after being handed to the
/// orchestrator's consumer.
#[derive(Debug, Clone, Serialize)]
pub struct RecentFileRecord {
    pub application: String,
    pub target: String,
    pub last_access: DateTime<Utc>,
    pub user: String,
    /// `None` means macro inspection was not attempted for this entry;
    /// `Some(vec![])` means it was attempted and found nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macros: Option<Vec<MacroModule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroModule {
    pub name: String,
    pub code: String,
}

/// Outcome of checking one application's security gate in one scope.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    /// Gate value present and already permitting in every namespace scanned.
    Unblocked,
    /// No version namespace carries the gate key at all.
    KeyAbsent,
    /// A namespace carried an explicit deny value.
    Blocked,
    /// A namespace carried the gate key but not the value.
    ValueAbsent,
}

impl PolicyState {
    pub fn requires_mutation(&self) -> bool {
        matches!(self, PolicyState::Blocked | PolicyState::ValueAbsent)
    }
}

/// What the gate toggle actually did for one application, so the revert
/// phase can undo it without re-querying the system. Write-once during the
/// check phase, read-once during revert.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyMutation {
    None,
    ValueSet { version: u32, previous: u32 },
    ValueCreated { version: u32 },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Decode,
    Macros,
    Policy,
    Revert,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MacroInspection {
    NotRequested,
    Enabled,
    VetoedByMachinePolicy,
}

#[derive(Serialize)]
pub struct HarvestReport {
    pub window_days: u32,
    pub macro_inspection: MacroInspection,
    pub records: Vec<RecentFileRecord>,
    pub warnings: Vec<Warning>,
}

#[derive(Serialize)]
pub struct PolicyStatusReport {
    pub applications: Vec<ApplicationGates>,
}

#[derive(Serialize)]
pub struct ApplicationGates {
    pub application: String,
    /// What `harvest --check-macros` would conclude, computed without mutating.
    pub user_state: PolicyState,
    pub machine_blocking: bool,
    pub gates: Vec<GateRow>,
}

#[derive(Serialize)]
pub struct GateRow {
    pub scope: GateScope,
    pub version: String,
    pub value: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateScope {
    User,
    Machine,
}

#[derive(Serialize)]
pub struct DecodeReport {
    pub target: String,
    pub last_access: DateTime<Utc>,
    pub timestamp_valid: bool,
}
