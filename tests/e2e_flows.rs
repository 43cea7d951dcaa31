use chrono::Utc;
use serde_json::{json, Value};
use std::fs;

mod common;
use common::{default_snapshot, mru, TestEnv, ALICE_SID};

fn snapshot_with_gates(user_gate: Option<u32>, machine_gate: Option<u32>) -> Value {
    let mut snapshot = default_snapshot();

    let mut word_security = serde_json::Map::new();
    if let Some(v) = user_gate {
        word_security.insert("AccessVBOM".to_string(), json!(v));
    }
    let mut current_user = serde_json::Map::new();
    current_user.insert(
        "SOFTWARE\\Microsoft\\Office\\16.0\\Word\\Security".to_string(),
        Value::Object(word_security),
    );
    current_user.insert(
        "SOFTWARE\\Microsoft\\Office\\16.0\\Excel\\Security".to_string(),
        json!({ "AccessVBOM": 1 }),
    );
    snapshot["current_user"] = Value::Object(current_user);

    if let Some(v) = machine_gate {
        snapshot["local_machine"] = json!({});
        snapshot["local_machine"]["SOFTWARE\\Microsoft\\Office\\16.0\\Word\\Security"] =
            json!({ "AccessVBOM": v });
    }
    snapshot
}

#[test]
fn harvest_orders_records_newest_first() {
    let env = TestEnv::new();

    let out = env.run_json(&["harvest"]);
    assert_eq!(out["ok"], true);
    assert_eq!(out["data"]["window_days"], 7);
    assert_eq!(out["data"]["macro_inspection"], "not_requested");

    let records = out["data"]["records"].as_array().expect("records array");
    let targets: Vec<&str> = records
        .iter()
        .map(|r| r["target"].as_str().expect("target string"))
        .collect();
    assert_eq!(
        targets,
        vec![
            "C:\\Users\\alice\\budget.xlsm",
            "C:\\Users\\alice\\plan.docm",
            "\\\\corp\\share\\minutes.docx"
        ]
    );

    // session-list entries carry the owning app, legacy entries the generic marker
    assert_eq!(records[0]["application"], "Excel");
    assert_eq!(records[0]["user"], "alice");
    assert_eq!(records[1]["application"], "Office");
    assert_eq!(records[2]["user"], "bob");

    // macro inspection was never attempted, so the field is absent entirely
    assert!(records.iter().all(|r| r.get("macros").is_none()));
}

#[test]
fn window_override_drops_older_records() {
    let env = TestEnv::new();

    let out = env.run_json(&["harvest", "--days", "2"]);
    assert_eq!(out["data"]["window_days"], 2);
    let records = out["data"]["records"].as_array().expect("records array");
    assert_eq!(records.len(), 2);

    let wide = env.run_json(&["harvest", "--days", "60"]);
    let records = wide["data"]["records"].as_array().expect("records array");
    assert_eq!(records.len(), 4);

    let full = env.run_json(&["harvest", "--full"]);
    assert_eq!(full["data"]["window_days"], 30);
}

#[test]
fn config_file_sets_default_window() {
    let env = TestEnv::new();
    let config_path = env.home.join(".config/mrusift/config.toml");
    fs::create_dir_all(config_path.parent().expect("config parent")).expect("create config dir");
    fs::write(
        config_path,
        r#"[general]
default_days = 2
"#,
    )
    .expect("write config file");

    let out = env.run_json(&["harvest"]);
    assert_eq!(out["data"]["window_days"], 2);
    assert_eq!(
        out["data"]["records"]
            .as_array()
            .expect("records array")
            .len(),
        2
    );
}

#[test]
fn machine_policy_vetoes_macro_inspection_but_metadata_flows() {
    let env = TestEnv::with_snapshot(snapshot_with_gates(Some(0), Some(0)));

    let out = env.run_json(&["harvest", "--check-macros", "--macro-tool", "true"]);
    assert_eq!(out["data"]["macro_inspection"], "vetoed_by_machine_policy");

    let warnings = out["data"]["warnings"].as_array().expect("warnings array");
    assert!(warnings
        .iter()
        .any(|w| w["kind"] == "policy" && w["message"].as_str().unwrap_or("").contains("machine")));

    let records = out["data"]["records"].as_array().expect("records array");
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.get("macros").is_none()));
}

#[cfg(unix)]
#[test]
fn macro_tool_output_is_attached_to_eligible_records() {
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::with_snapshot(snapshot_with_gates(Some(0), None));

    let tool = env.tmp_path().join("fake-vba-dump.sh");
    fs::write(
        &tool,
        "#!/bin/sh\nprintf '[{\"name\":\"Module1\",\"code\":\"Sub AutoOpen()\\\\nEnd Sub\"}]'\n",
    )
    .expect("write tool");
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod tool");

    let out = env.run_json(&[
        "harvest",
        "--check-macros",
        "--macro-tool",
        tool.to_str().expect("tool path utf8"),
    ]);
    assert_eq!(out["data"]["macro_inspection"], "enabled");

    let records = out["data"]["records"].as_array().expect("records array");
    let docm = records
        .iter()
        .find(|r| r["target"].as_str().unwrap_or("").ends_with("plan.docm"))
        .expect("docm record");
    assert_eq!(docm["macros"][0]["name"], "Module1");

    let xlsm = records
        .iter()
        .find(|r| r["target"].as_str().unwrap_or("").ends_with("budget.xlsm"))
        .expect("xlsm record");
    assert_eq!(xlsm["macros"][0]["name"], "Module1");

    // .docx is not a macro-bearing type
    let docx = records
        .iter()
        .find(|r| r["target"].as_str().unwrap_or("").ends_with("minutes.docx"))
        .expect("docx record");
    assert!(docx.get("macros").is_none());

    let warnings = out["data"]["warnings"].as_array().expect("warnings array");
    assert!(warnings
        .iter()
        .any(|w| w["kind"] == "policy"
            && w["message"].as_str().unwrap_or("").contains("temporarily")));
    assert!(!warnings.iter().any(|w| w["kind"] == "revert"));
}

#[test]
fn failing_macro_tool_degrades_per_file() {
    let env = TestEnv::with_snapshot(snapshot_with_gates(Some(1), None));

    let out = env.run_json(&[
        "harvest",
        "--check-macros",
        "--macro-tool",
        "/nonexistent/vba-dump",
    ]);
    assert_eq!(out["data"]["macro_inspection"], "enabled");

    let records = out["data"]["records"].as_array().expect("records array");
    assert_eq!(records.len(), 3);

    let warnings = out["data"]["warnings"].as_array().expect("warnings array");
    let macro_failures: Vec<&Value> = warnings
        .iter()
        .filter(|w| w["kind"] == "macros")
        .collect();
    // one warning per eligible file, each naming it
    assert_eq!(macro_failures.len(), 2);
    assert!(macro_failures
        .iter()
        .any(|w| w["message"].as_str().unwrap_or("").contains("plan.docm")));
}

#[test]
fn decode_reports_target_and_timestamp() {
    let env = TestEnv::new();

    let out = env.run_json(&["decode", "[0][T01D5E2A1B2C3D4E0]*C:\\Users\\a\\doc.docm"]);
    assert_eq!(out["ok"], true);
    assert_eq!(out["data"]["target"], "C:\\Users\\a\\doc.docm");
    assert_eq!(out["data"]["timestamp_valid"], true);
    assert!(out["data"]["last_access"]
        .as_str()
        .expect("timestamp string")
        .starts_with("2020-02-13T19:13:39"));

    let miss = env.run_json(&["decode", "not a valid mru"]);
    assert_eq!(miss["ok"], true);
    assert!(miss["data"].is_null());
}

#[test]
fn policy_status_reads_gates_without_mutating() {
    let env = TestEnv::with_snapshot(snapshot_with_gates(Some(0), Some(0)));

    let out = env.run_json(&["policy", "status"]);
    let apps = out["data"]["applications"].as_array().expect("apps array");
    assert_eq!(apps.len(), 2);

    let word = apps
        .iter()
        .find(|a| a["application"] == "Word")
        .expect("word entry");
    assert_eq!(word["user_state"], "blocked");
    assert_eq!(word["machine_blocking"], true);
    assert!(word["gates"].as_array().expect("gate rows").len() >= 2);

    let excel = apps
        .iter()
        .find(|a| a["application"] == "Excel")
        .expect("excel entry");
    assert_eq!(excel["user_state"], "unblocked");
    assert_eq!(excel["machine_blocking"], false);
}

#[test]
fn macro_tool_without_check_macros_is_a_config_error() {
    let env = TestEnv::new();

    let mut cmd = env.cmd();
    let out = cmd
        .arg("--json")
        .arg("--snapshot")
        .arg(env.snapshot.to_str().expect("snapshot path utf8"))
        .args(["harvest", "--macro-tool", "vba-dump"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let err: Value = serde_json::from_slice(&out).expect("error json output");
    assert_eq!(err["ok"], false);
    assert_eq!(err["error"]["code"], "CONFIG");
    assert!(err["error"]["message"]
        .as_str()
        .unwrap_or("")
        .contains("--check-macros"));
}

#[cfg(not(windows))]
#[test]
fn live_capture_off_windows_requires_a_snapshot() {
    let env = TestEnv::new();

    let mut cmd = env.cmd();
    let out = cmd
        .arg("--json")
        .args(["harvest"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let err: Value = serde_json::from_slice(&out).expect("error json output");
    assert_eq!(err["error"]["code"], "CONFIG");
    assert!(err["error"]["message"]
        .as_str()
        .unwrap_or("")
        .contains("--snapshot"));
}

#[test]
fn stale_entries_are_dropped_even_when_decodable() {
    let now = Utc::now();
    let mut users = serde_json::Map::new();
    users.insert(
        format!("{ALICE_SID}\\Software\\Microsoft\\Office\\16.0\\Word\\File MRU"),
        json!({
            "Item 1": mru(now - chrono::Duration::days(8), "C:\\Users\\alice\\edge.doc"),
            "Item 2": mru(now - chrono::Duration::days(6), "C:\\Users\\alice\\kept.doc")
        }),
    );
    let env = TestEnv::with_snapshot(json!({ "users": users }));

    let out = env.run_json(&["harvest", "--days", "7"]);
    let records = out["data"]["records"].as_array().expect("records array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["target"], "C:\\Users\\alice\\kept.doc");
    // no display name captured for the SID: the raw identifier is used
    assert_eq!(records[0]["user"], ALICE_SID);
}
