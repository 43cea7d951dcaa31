use crate::domain::constants::{GENERIC_APPLICATION, OFFICE_ROOT};
use crate::domain::models::{RecentFileRecord, Warning, WarningKind};
use crate::registry::{Hive, Registry};
use crate::services::decoder;
use crate::services::identity::IdentityResolver;

#[derive(Debug)]
pub enum WalkEvent {
    Record(RecentFileRecord),
    Warning(Warning),
}

/// Lazily walks every accessible user hive for Office MRU entries.
///
/// Records stream out application by application; nothing buffers the whole
/// tree. Missing keys at any level contribute zero results, never errors.
pub fn walk<'a>(
    reg: &'a dyn Registry,
    ids: &'a dyn IdentityResolver,
) -> impl Iterator<Item = WalkEvent> + 'a {
    user_sids(reg).into_iter().flat_map(move |sid| {
        let user = ids.resolve(&sid).unwrap_or_else(|| sid.clone());
        office_versions(reg, &sid).into_iter().flat_map(move |version| {
            let version_path = format!("{sid}\\{OFFICE_ROOT}\\{version}");
            let user = user.clone();
            let apps = reg.subkeys(Hive::Users, &version_path).unwrap_or_default();
            apps.into_iter().flat_map(move |app| {
                application_events(reg, &format!("{version_path}\\{app}"), &app, &user)
            })
        })
    })
}

/// Account hives start with the SID prefix; the synthetic `_Classes`
/// companion of each account carries no MRU data.
fn user_sids(reg: &dyn Registry) -> Vec<String> {
    reg.subkeys(Hive::Users, "")
        .unwrap_or_default()
        .into_iter()
        .filter(|name| name.starts_with("S-1") && !name.ends_with("_Classes"))
        .collect()
}

/// Version namespaces are decimal child names like `16.0`; siblings such as
/// `Common` are unrelated.
fn office_versions(reg: &dyn Registry, sid: &str) -> Vec<String> {
    reg.subkeys(Hive::Users, &format!("{sid}\\{OFFICE_ROOT}"))
        .unwrap_or_default()
        .into_iter()
        .filter(|name| name.parse::<f64>().is_ok())
        .collect()
}

fn application_events(
    reg: &dyn Registry,
    app_path: &str,
    app: &str,
    user: &str,
) -> Vec<WalkEvent> {
    let mut events = Vec::new();

    // Legacy list directly under the application. The record format does not
    // embed the owning app, so attribution stays with the generic marker.
    for raw in mru_values(reg, &format!("{app_path}\\File MRU")) {
        push_decoded(&mut events, &raw, GENERIC_APPLICATION, user);
    }

    // Per-logon-session lists under `User MRU\<opaque id>\File MRU`; here the
    // tree context names the application.
    if let Some(sessions) = reg.subkeys(Hive::Users, &format!("{app_path}\\User MRU")) {
        for session in sessions {
            for raw in mru_values(reg, &format!("{app_path}\\User MRU\\{session}\\File MRU")) {
                push_decoded(&mut events, &raw, app, user);
            }
        }
    }

    events
}

fn mru_values(reg: &dyn Registry, path: &str) -> Vec<String> {
    reg.string_values(Hive::Users, path).unwrap_or_default()
}

fn push_decoded(events: &mut Vec<WalkEvent>, raw: &str, application: &str, user: &str) {
    // Housekeeping values that share the MRU key never match the pattern;
    // skipping them silently is expected.
    let Some(entry) = decoder::decode(raw) else {
        return;
    };
    if !entry.timestamp_valid {
        events.push(WalkEvent::Warning(Warning::new(
            WarningKind::Decode,
            format!(
                "could not parse MRU timestamp {} for {}",
                entry.timestamp_hex, entry.target
            ),
        )));
    }
    tracing::debug!(application, user, file = %entry.target, "decoded mru entry");
    events.push(WalkEvent::Record(RecentFileRecord {
        application: application.to_string(),
        target: entry.target,
        last_access: entry.last_access,
        user: user.to_string(),
        macros: None,
    }));
}
