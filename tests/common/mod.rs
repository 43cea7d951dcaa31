use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ALICE_SID: &str = "S-1-5-21-3623811015-3361044348-30300820-1001";
pub const BOB_SID: &str = "S-1-5-21-3623811015-3361044348-30300820-1013";

pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub snapshot: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_snapshot(default_snapshot())
    }

    pub fn with_snapshot(snapshot_body: Value) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");

        let snapshot = tmp.path().join("hives.json");
        fs::write(
            &snapshot,
            serde_json::to_string_pretty(&snapshot_body).expect("serialize snapshot"),
        )
        .expect("write snapshot");

        Self {
            _tmp: tmp,
            home,
            snapshot,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("mrusift");
        cmd.env("HOME", &self.home);
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .arg("--snapshot")
            .arg(self.snapshot.to_str().expect("snapshot path utf8"))
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn tmp_path(&self) -> &Path {
        self._tmp.path()
    }
}

pub fn filetime_hex(at: DateTime<Utc>) -> String {
    let epoch = Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap();
    let micros = (at - epoch).num_microseconds().expect("in range");
    format!("{:016X}", (micros as u64) * 10)
}

pub fn mru(at: DateTime<Utc>, path: &str) -> String {
    format!("[F00000000][T{}]*{}", filetime_hex(at), path)
}

/// Two accounts, two Office versions, both MRU schemas, plus the noise the
/// walker must skip (a `_Classes` companion and a non-account hive).
pub fn default_snapshot() -> Value {
    let now = Utc::now();
    let mut users = serde_json::Map::new();
    users.insert(
        format!("{ALICE_SID}\\Software\\Microsoft\\Office\\16.0\\Word\\File MRU"),
        json!({
            "Item 1": mru(now - chrono::Duration::days(1), "C:\\Users\\alice\\plan.docm"),
            "Item 2": mru(now - chrono::Duration::days(45), "C:\\Users\\alice\\archive.doc"),
            "Max Display": 25
        }),
    );
    users.insert(
        format!(
            "{ALICE_SID}\\Software\\Microsoft\\Office\\16.0\\Excel\\User MRU\\ADAL_B7C22499E768\\File MRU"
        ),
        json!({
            "Item 1": mru(now - chrono::Duration::hours(6), "C:\\Users\\alice\\budget.xlsm")
        }),
    );
    users.insert(
        format!("{BOB_SID}\\Software\\Microsoft\\Office\\15.0\\Word\\File MRU"),
        json!({
            "Item 1": mru(now - chrono::Duration::days(3), "\\\\corp\\share\\minutes.docx")
        }),
    );
    users.insert(
        format!("{ALICE_SID}_Classes\\Software\\Microsoft\\Office\\16.0\\Word\\File MRU"),
        json!({ "Item 1": mru(now, "C:\\ignored.doc") }),
    );
    users.insert(
        ".DEFAULT\\Software\\Microsoft\\Office\\16.0\\Word\\File MRU".to_string(),
        json!({ "Item 1": mru(now, "C:\\ignored.doc") }),
    );

    let mut accounts = serde_json::Map::new();
    accounts.insert(ALICE_SID.to_string(), json!("alice"));
    accounts.insert(BOB_SID.to_string(), json!("bob"));

    json!({ "users": users, "accounts": accounts })
}
