use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

mod common;
use common::TestEnv;

fn load_schema(name: &str) -> Value {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let raw = fs::read_to_string(root.join("docs/contracts").join(name)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn validate(schema_name: &str, data: &Value) {
    let schema = load_schema(schema_name);
    let validator = JSONSchema::compile(&schema).expect("compile schema");
    let msgs: Vec<String> = match validator.validate(data) {
        Ok(()) => return,
        Err(errors) => errors.map(|e| e.to_string()).collect(),
    };
    panic!("schema validation failed: {}", msgs.join(" | "));
}

#[test]
fn contracts_check() {
    let env = TestEnv::new();

    let harvest = env.run_json(&["harvest"]);
    assert_eq!(harvest["ok"], true);
    validate("harvest.schema.json", &harvest["data"]);

    let harvest_full = env.run_json(&["harvest", "--full"]);
    assert_eq!(harvest_full["ok"], true);
    validate("harvest.schema.json", &harvest_full["data"]);

    let status = env.run_json(&["policy", "status"]);
    assert_eq!(status["ok"], true);
    validate("policy-status.schema.json", &status["data"]);
}
