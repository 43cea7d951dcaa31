use std::time::Duration;

use crate::domain::constants::{ACCESS_VBOM_VALUE, OFFICE_VERSIONS, VBOM_PERMIT};
use crate::domain::models::{
    GateRow, GateScope, PolicyMutation, PolicyState, Warning, WarningKind,
};
use crate::registry::{Hive, Registry};

/// The document-automation layer may hold the gate key open briefly after
/// enumeration; reverts wait this long before each write-back.
const REVERT_SETTLE: Duration = Duration::from_millis(500);

pub struct Evaluation {
    pub state: PolicyState,
    pub mutation: PolicyMutation,
}

/// Checks and minimally loosens the per-application macro-access gate, and
/// undoes exactly what it did. The machine scope is consulted for a veto
/// but never written.
pub struct GateToggle<'r> {
    reg: &'r dyn Registry,
    settle: Duration,
}

enum ScanHit {
    Deny { version: u32, previous: u32 },
    ValueMissing { version: u32 },
    AllPermit,
    NoKey,
}

fn security_key(version: u32, app: &str) -> String {
    format!("SOFTWARE\\Microsoft\\Office\\{version}.0\\{app}\\Security")
}

impl<'r> GateToggle<'r> {
    pub fn new(reg: &'r dyn Registry) -> Self {
        Self {
            reg,
            settle: REVERT_SETTLE,
        }
    }

    pub fn with_settle(reg: &'r dyn Registry, settle: Duration) -> Self {
        Self { reg, settle }
    }

    /// First namespace needing a change wins and stops the scan; the gate is
    /// checked by the automation layer against whichever version is actually
    /// active, so later namespaces are left untouched.
    fn scan_user_scope(&self, app: &str) -> ScanHit {
        let mut key_found = false;
        for version in OFFICE_VERSIONS {
            let path = security_key(version, app);
            if !self.reg.key_exists(Hive::CurrentUser, &path) {
                continue;
            }
            key_found = true;
            match self.reg.dword(Hive::CurrentUser, &path, ACCESS_VBOM_VALUE) {
                Some(value) if value != VBOM_PERMIT => {
                    return ScanHit::Deny {
                        version,
                        previous: value,
                    }
                }
                Some(_) => {}
                None => return ScanHit::ValueMissing { version },
            }
        }
        if key_found {
            ScanHit::AllPermit
        } else {
            ScanHit::NoKey
        }
    }

    /// Evaluate the per-user gate and, when it needs a change, apply the one
    /// minimal mutation immediately. The returned mutation record is all
    /// `revert` needs to undo it.
    pub fn evaluate(&self, app: &str) -> anyhow::Result<Evaluation> {
        match self.scan_user_scope(app) {
            ScanHit::Deny { version, previous } => {
                let path = security_key(version, app);
                tracing::info!(app, version, "loosening gate value for this run");
                self.reg
                    .set_dword(Hive::CurrentUser, &path, ACCESS_VBOM_VALUE, VBOM_PERMIT)?;
                Ok(Evaluation {
                    state: PolicyState::Blocked,
                    mutation: PolicyMutation::ValueSet { version, previous },
                })
            }
            ScanHit::ValueMissing { version } => {
                let path = security_key(version, app);
                tracing::info!(app, version, "creating gate value for this run");
                self.reg
                    .set_dword(Hive::CurrentUser, &path, ACCESS_VBOM_VALUE, VBOM_PERMIT)?;
                Ok(Evaluation {
                    state: PolicyState::ValueAbsent,
                    mutation: PolicyMutation::ValueCreated { version },
                })
            }
            ScanHit::AllPermit => Ok(Evaluation {
                state: PolicyState::Unblocked,
                mutation: PolicyMutation::None,
            }),
            ScanHit::NoKey => Ok(Evaluation {
                state: PolicyState::KeyAbsent,
                mutation: PolicyMutation::None,
            }),
        }
    }

    /// Read-only view of what `evaluate` would conclude.
    pub fn peek(&self, app: &str) -> PolicyState {
        match self.scan_user_scope(app) {
            ScanHit::Deny { .. } => PolicyState::Blocked,
            ScanHit::ValueMissing { .. } => PolicyState::ValueAbsent,
            ScanHit::AllPermit => PolicyState::Unblocked,
            ScanHit::NoKey => PolicyState::KeyAbsent,
        }
    }

    /// True when the machine scope explicitly denies the gate for `app`.
    /// An explicit permit, or no value anywhere, does not block.
    pub fn machine_blocks(&self, app: &str) -> bool {
        for version in OFFICE_VERSIONS {
            let path = security_key(version, app);
            match self.reg.dword(Hive::LocalMachine, &path, ACCESS_VBOM_VALUE) {
                Some(VBOM_PERMIT) => return false,
                Some(0) => return true,
                _ => {}
            }
        }
        false
    }

    /// Every namespace in both scopes that carries the gate key, for
    /// read-only status reporting.
    pub fn gates(&self, app: &str) -> Vec<GateRow> {
        let mut rows = Vec::new();
        for (scope, hive) in [
            (GateScope::User, Hive::CurrentUser),
            (GateScope::Machine, Hive::LocalMachine),
        ] {
            for version in OFFICE_VERSIONS {
                let path = security_key(version, app);
                if !self.reg.key_exists(hive, &path) {
                    continue;
                }
                rows.push(GateRow {
                    scope,
                    version: format!("{version}.0"),
                    value: self.reg.dword(hive, &path, ACCESS_VBOM_VALUE),
                });
            }
        }
        rows
    }

    /// Undo the recorded mutation. Inconsistencies found on the way out are
    /// reported, never raised; this runs after enumeration has completed.
    pub fn revert(&self, app: &str, mutation: &PolicyMutation) -> Vec<Warning> {
        let mut warnings = Vec::new();
        match mutation {
            PolicyMutation::None => {}
            PolicyMutation::ValueSet { version, previous } => {
                std::thread::sleep(self.settle);
                let path = security_key(*version, app);
                match self.reg.dword(Hive::CurrentUser, &path, ACCESS_VBOM_VALUE) {
                    Some(VBOM_PERMIT) => {}
                    Some(found) => warnings.push(Warning::new(
                        WarningKind::Revert,
                        format!(
                            "gate value for {app} {version}.0 changed externally (found {found}) before revert"
                        ),
                    )),
                    None => warnings.push(Warning::new(
                        WarningKind::Revert,
                        format!("gate value for {app} {version}.0 was removed before revert"),
                    )),
                }
                tracing::info!(app, version, previous, "restoring gate value");
                if let Err(e) =
                    self.reg
                        .set_dword(Hive::CurrentUser, &path, ACCESS_VBOM_VALUE, *previous)
                {
                    warnings.push(Warning::new(
                        WarningKind::Revert,
                        format!("failed to restore gate value for {app} {version}.0: {e}"),
                    ));
                }
            }
            PolicyMutation::ValueCreated { version } => {
                std::thread::sleep(self.settle);
                let path = security_key(*version, app);
                if self
                    .reg
                    .dword(Hive::CurrentUser, &path, ACCESS_VBOM_VALUE)
                    .is_none()
                {
                    warnings.push(Warning::new(
                        WarningKind::Revert,
                        format!(
                            "created gate value for {app} {version}.0 was already gone before revert"
                        ),
                    ));
                    return warnings;
                }
                tracing::info!(app, version, "deleting created gate value");
                if let Err(e) =
                    self.reg
                        .delete_value(Hive::CurrentUser, &path, ACCESS_VBOM_VALUE)
                {
                    warnings.push(Warning::new(
                        WarningKind::Revert,
                        format!("failed to delete created gate value for {app} {version}.0: {e}"),
                    ));
                }
            }
        }
        warnings
    }
}
