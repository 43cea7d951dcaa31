use chrono::{DateTime, Utc};

use crate::domain::constants::CONTROLLED_APPLICATIONS;
use crate::domain::models::{
    HarvestReport, MacroInspection, PolicyMutation, Warning, WarningKind,
};
use crate::registry::Registry;
use crate::services::gate::GateToggle;
use crate::services::identity::IdentityResolver;
use crate::services::macros::{macro_kind, MacroExtractor};
use crate::services::recency::{order_newest_first, within_window};
use crate::services::walker::{walk, WalkEvent};

pub struct HarvestOptions {
    pub window_days: u32,
    pub check_macros: bool,
}

/// Holds the mutation ledger for the run and guarantees the revert fires
/// exactly once, even if enumeration unwinds.
struct RevertGuard<'r> {
    toggle: GateToggle<'r>,
    ledger: Vec<(&'static str, PolicyMutation)>,
    reverted: bool,
}

impl<'r> RevertGuard<'r> {
    fn run_revert(&mut self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for (app, mutation) in std::mem::take(&mut self.ledger) {
            warnings.extend(self.toggle.revert(app, &mutation));
        }
        warnings
    }

    fn revert(mut self) -> Vec<Warning> {
        self.reverted = true;
        self.run_revert()
    }
}

impl Drop for RevertGuard<'_> {
    fn drop(&mut self) {
        if !self.reverted {
            for warning in self.run_revert() {
                tracing::warn!(message = %warning.message, "revert during unwind");
            }
        }
    }
}

/// One orchestrated run: policy check, enumeration, unconditional revert.
///
/// Records are delivered newest first; every degraded condition along the
/// way rides in the report's warnings instead of aborting the run.
pub fn run(
    reg: &dyn Registry,
    ids: &dyn IdentityResolver,
    extractor: Option<&dyn MacroExtractor>,
    opts: &HarvestOptions,
    now: DateTime<Utc>,
) -> HarvestReport {
    let mut warnings = Vec::new();
    let mut inspection = MacroInspection::NotRequested;
    let mut guard = None;

    if opts.check_macros {
        let toggle = GateToggle::new(reg);
        if CONTROLLED_APPLICATIONS
            .iter()
            .any(|app| toggle.machine_blocks(app))
        {
            // the machine scope outranks anything this tool could change, so
            // no per-user gate is touched for either application
            warnings.push(Warning::new(
                WarningKind::Policy,
                "a machine-wide policy denies macro project access; macro inspection is disabled for this run",
            ));
            inspection = MacroInspection::VetoedByMachinePolicy;
        } else {
            let mut ledger = Vec::new();
            let mut mutated = false;
            for app in CONTROLLED_APPLICATIONS {
                match toggle.evaluate(app) {
                    Ok(eval) => {
                        mutated |= eval.state.requires_mutation();
                        ledger.push((app, eval.mutation));
                    }
                    Err(e) => {
                        warnings.push(Warning::new(
                            WarningKind::Policy,
                            format!("could not loosen the macro-access gate for {app}: {e}"),
                        ));
                        ledger.push((app, PolicyMutation::None));
                    }
                }
            }
            if mutated {
                warnings.push(Warning::new(
                    WarningKind::Policy,
                    "per-user macro-access gates were temporarily loosened and will be restored after enumeration",
                ));
            }
            inspection = MacroInspection::Enabled;
            guard = Some(RevertGuard {
                toggle,
                ledger,
                reverted: false,
            });
        }
    }

    let mut records = Vec::new();
    for event in walk(reg, ids) {
        match event {
            WalkEvent::Warning(w) => warnings.push(w),
            WalkEvent::Record(mut record) => {
                if !within_window(record.last_access, now, opts.window_days) {
                    continue;
                }
                if inspection == MacroInspection::Enabled {
                    if let (Some(ext), Some(kind)) = (extractor, macro_kind(&record.target)) {
                        tracing::info!(file = %record.target, ?kind, "checking for macros");
                        match ext.extract(&record.target) {
                            Ok(modules) => record.macros = Some(modules),
                            Err(e) => warnings.push(Warning::new(
                                WarningKind::Macros,
                                format!("macro extraction failed for {}: {e}", record.target),
                            )),
                        }
                    }
                }
                records.push(record);
            }
        }
    }

    order_newest_first(&mut records);

    if let Some(guard) = guard {
        warnings.extend(guard.revert());
    }

    HarvestReport {
        window_days: opts.window_days,
        macro_inspection: inspection,
        records,
        warnings,
    }
}
