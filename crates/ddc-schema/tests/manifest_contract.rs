use ddc_manifest::Manifest;
use ddc_schema::{check, check_manifest, Contract, Violation, ViolationKind};
use serde_json::json;

const MANIFEST: &str = r#"
schema_uri: schema/manifest.schema.json
version: 1.2.0
metadata:
  name: ddc-core
  type: toolkit
provenance:
  source: https://example.org/ddc
  built_by: ci
artifacts:
  - path: core/main.py
    hash: sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
    size: 1024000
integrity:
  algorithm: sha256
  merkle_root: e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
signing:
  scheme: ed25519
  key_id: 0123456789ABCDEF
  signature:
    value: ${MINISIGN_SIG}
    timestamp: 2025-03-01T12:00:00Z
"#;

fn manifest() -> Manifest {
    Manifest::from_yaml_str(MANIFEST).unwrap()
}

#[test]
fn test_valid_manifest_has_no_violations() {
    let violations = check_manifest(&Contract::manifest_v1(), &manifest()).unwrap();
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn test_short_merkle_root_is_single_violation() {
    let yaml = MANIFEST.replace(
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85",
    );
    let manifest = Manifest::from_yaml_str(&yaml).unwrap();

    let violations = check_manifest(&Contract::manifest_v1(), &manifest).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, "integrity.merkle_root");
    assert!(matches!(
        violations[0].kind,
        ViolationKind::WrongFormat { .. }
    ));
}

#[test]
fn test_every_violation_is_reported() {
    let doc = json!({
        "schema_uri": "",
        "version": "one",
        "metadata": {},
        "artifacts": [{"path": "a", "hash": "md5:abc", "size": -1}],
        "integrity": {"algorithm": "sha1", "merkle_root": "0".repeat(64), "extra": 1},
        "signing": {"scheme": "rsa"}
    });

    let paths: Vec<String> = check(&Contract::manifest_v1(), &doc)
        .into_iter()
        .map(|v| v.path)
        .collect();

    assert_eq!(
        paths,
        vec![
            "schema_uri",
            "version",
            "metadata.name",
            "artifacts[0].hash",
            "artifacts[0].size",
            "integrity.algorithm",
            "integrity.extra",
            "signing.scheme",
        ]
    );
}

#[test]
fn test_compiled_schema_matches_builtin_on_merkle_root() {
    let schema = json!({
        "title": "manifest",
        "type": "object",
        "required": ["schema_uri", "integrity"],
        "properties": {
            "schema_uri": {"type": "string", "minLength": 1},
            "integrity": {
                "type": "object",
                "required": ["algorithm", "merkle_root"],
                "additionalProperties": false,
                "properties": {
                    "algorithm": {"const": "sha256"},
                    "merkle_root": {"type": "string", "pattern": "^[0-9a-f]{64}$"}
                }
            }
        }
    });
    let contract = Contract::from_json_schema(&schema).unwrap();

    assert!(check_manifest(&contract, &manifest()).unwrap().is_empty());

    let doc = json!({
        "schema_uri": "s",
        "integrity": {"algorithm": "sha256", "merkle_root": "abc"}
    });
    let violations = check(&contract, &doc);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, "integrity.merkle_root");
}

#[test]
fn test_violation_display() {
    let v = Violation::new(
        "integrity.algorithm",
        ViolationKind::DisallowedValue {
            value: "\"sha1\"".to_string(),
            allowed: vec!["\"sha256\"".to_string()],
        },
    );
    assert_eq!(
        v.to_string(),
        "integrity.algorithm: value \"sha1\" is not one of [\"sha256\"]"
    );
}
