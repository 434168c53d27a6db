use chrono::{DateTime, Utc};
use ddc_manifest::{
    canonical_payload, render_payload, CanonicalMode, FieldPath, Manifest, SigningLayout, Value,
};
use ddc_prov::{
    sign_manifest, verify_manifest, Ed25519Primitive, Ed25519SecretKey, InvalidReason, ProvError,
    SignOptions, SignaturePrimitive, SignatureStatus,
};

const MANIFEST: &str = r#"
schema_uri: schema/manifest.schema.json
version: 1.0.0
metadata:
  name: ddc-core
provenance:
  source: https://example.org/ddc
artifacts:
  - path: dist/core.tar.gz
    hash: sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
    size: 1024000
integrity:
  algorithm: sha256
  merkle_root: e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
signing:
  scheme: ed25519
  signature:
    value: ${MINISIGN_SIG}
"#;

fn key() -> Ed25519SecretKey {
    Ed25519SecretKey::from_bytes(&[42; 32])
}

fn at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn signed() -> Manifest {
    let mut manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
    sign_manifest(
        &mut manifest,
        &Ed25519Primitive,
        &key(),
        &SignOptions::default().at(at()),
    )
    .unwrap();
    manifest
}

fn status(manifest: &Manifest) -> SignatureStatus {
    verify_manifest(
        manifest,
        &Ed25519Primitive,
        Some(&key().public_key()),
        &SigningLayout::default(),
    )
    .unwrap()
    .status
}

fn path(p: &str) -> FieldPath {
    FieldPath::parse(p).unwrap()
}

#[test]
fn test_sign_then_verify_is_valid() {
    let manifest = signed();
    let report = verify_manifest(
        &manifest,
        &Ed25519Primitive,
        Some(&key().public_key()),
        &SigningLayout::default(),
    )
    .unwrap();

    assert_eq!(report.status, SignatureStatus::Valid);
    assert_eq!(report.key_id, Some(key().key_id()));
    assert_eq!(report.signed_at, Some(at()));
    assert_eq!(report.exit_code(false), 0);
}

#[test]
fn test_signature_is_deterministic() {
    let a = signed();
    let b = signed();
    assert_eq!(a, b);
    assert_eq!(a.to_yaml_string().unwrap(), b.to_yaml_string().unwrap());
}

#[test]
fn test_resigning_is_idempotent() {
    let once = signed();
    let mut twice = once.clone();
    let outcome = sign_manifest(
        &mut twice,
        &Ed25519Primitive,
        &key(),
        &SignOptions::default().at(at()),
    )
    .unwrap();

    assert_eq!(once, twice);
    assert_eq!(
        once.get(&path("signing.signature.value"))
            .unwrap()
            .and_then(Value::as_str),
        Some(outcome.signature.as_str())
    );
}

#[test]
fn test_signature_field_is_excluded_from_payload() {
    let manifest = signed();
    let layout = SigningLayout::default();
    let before = canonical_payload(&manifest, &layout.value).unwrap();

    let mut altered = manifest.clone();
    altered
        .set(&layout.value, Value::from("anything else"))
        .unwrap();
    assert_eq!(canonical_payload(&altered, &layout.value).unwrap(), before);

    let mut removed = manifest;
    removed.remove(&layout.value).unwrap();
    assert_eq!(canonical_payload(&removed, &layout.value).unwrap(), before);
}

#[test]
fn test_any_covered_field_change_invalidates() {
    let edits: [(&str, Value); 6] = [
        ("metadata.name", Value::from("other")),
        ("provenance.source", Value::from("https://evil.example")),
        ("integrity.merkle_root", Value::from("0".repeat(64))),
        ("signing.signature.timestamp", Value::from("2025-03-02T12:00:00Z")),
        ("signing.scheme", Value::from("minisign")),
        ("version", Value::from("1.0.1")),
    ];

    for (field, value) in edits {
        let mut manifest = signed();
        manifest.set(&path(field), value).unwrap();
        assert_eq!(
            status(&manifest),
            SignatureStatus::Invalid(InvalidReason::Mismatch),
            "editing {field} should invalidate the signature"
        );
    }
}

#[test]
fn test_artifact_size_change_is_invalid_signature() {
    let mut manifest = signed();
    let tampered = manifest
        .to_yaml_string()
        .unwrap()
        .replace("size: 1024000", "size: 1024001");
    manifest = Manifest::from_yaml_str(&tampered).unwrap();
    assert_eq!(manifest.artifacts().unwrap()[0].size, 1024001);

    let report = verify_manifest(
        &manifest,
        &Ed25519Primitive,
        Some(&key().public_key()),
        &SigningLayout::default(),
    )
    .unwrap();
    assert!(matches!(
        report.into_result(false),
        Err(ProvError::InvalidSignature(_))
    ));
}

#[test]
fn test_missing_value_is_no_signature() {
    let mut manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
    manifest.remove(&path("signing.signature.value")).unwrap();

    let report = verify_manifest(
        &manifest,
        &Ed25519Primitive,
        Some(&key().public_key()),
        &SigningLayout::default(),
    )
    .unwrap();
    assert_eq!(report.status, SignatureStatus::Absent);
    assert!(matches!(report.into_result(true), Err(ProvError::NoSignature)));
}

#[test]
fn test_placeholder_and_blank_values() {
    let manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
    assert_eq!(status(&manifest), SignatureStatus::Placeholder);

    let mut blank = manifest;
    blank
        .set(&path("signing.signature.value"), Value::from("   "))
        .unwrap();
    assert_eq!(status(&blank), SignatureStatus::Absent);

    let mut padded = blank;
    padded
        .set(&path("signing.signature.value"), Value::from(" ${MINISIGN_SIG} "))
        .unwrap();
    assert_eq!(status(&padded), SignatureStatus::Placeholder);
    let block = padded.signing().unwrap().unwrap().signature.unwrap();
    assert!(block.is_unsigned());
}

#[test]
fn test_without_key_signature_is_only_present() {
    let manifest = signed();
    let report = verify_manifest(
        &manifest,
        &Ed25519Primitive,
        None,
        &SigningLayout::default(),
    )
    .unwrap();

    assert_eq!(report.status, SignatureStatus::Present);
    assert!(!report.is_valid());
    assert_eq!(report.exit_code(false), 1);
    assert_eq!(report.exit_code(true), 0);
}

#[test]
fn test_wrong_key_is_key_mismatch() {
    let manifest = signed();
    let other = Ed25519SecretKey::from_bytes(&[7; 32]);
    let report = verify_manifest(
        &manifest,
        &Ed25519Primitive,
        Some(&other.public_key()),
        &SigningLayout::default(),
    )
    .unwrap();

    assert_eq!(
        report.status,
        SignatureStatus::Invalid(InvalidReason::KeyMismatch {
            declared: key().key_id(),
            supplied: other.key_id(),
        })
    );
}

#[test]
fn test_wrong_key_without_declared_id_is_mismatch() {
    let mut manifest = signed();
    manifest.remove(&path("signing.key_id")).unwrap();
    let report = verify_manifest(
        &manifest,
        &Ed25519Primitive,
        Some(&Ed25519SecretKey::from_bytes(&[7; 32]).public_key()),
        &SigningLayout::default(),
    )
    .unwrap();
    assert_eq!(report.status, SignatureStatus::Invalid(InvalidReason::Mismatch));
}

#[test]
fn test_malformed_values() {
    let mut manifest = signed();
    manifest
        .set(&path("signing.signature.value"), Value::from("garbage"))
        .unwrap();
    assert!(matches!(
        status(&manifest),
        SignatureStatus::Invalid(InvalidReason::Malformed(_))
    ));

    manifest
        .set(&path("signing.signature.value"), Value::from(12))
        .unwrap();
    assert!(matches!(
        status(&manifest),
        SignatureStatus::Invalid(InvalidReason::Malformed(_))
    ));
}

#[test]
fn test_document_order_signature_is_rejected() {
    let layout = SigningLayout::default();
    let mut manifest = Manifest::from_yaml_str(MANIFEST).unwrap();

    let payload = render_payload(&manifest, &layout.value, CanonicalMode::Document).unwrap();
    let signature = Ed25519Primitive.sign(&payload, &key()).unwrap();
    manifest.set(&layout.value, Value::from(signature)).unwrap();

    assert_eq!(
        status(&manifest),
        SignatureStatus::Invalid(InvalidReason::DocumentOrder)
    );
}

#[test]
fn test_rooted_manifest_roundtrip() {
    let nested = format!(
        "doc_index:\n{}\nrelease_notes: unsigned\n",
        MANIFEST
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| format!("  {l}"))
            .collect::<Vec<_>>()
            .join("\n")
    );
    let mut manifest = Manifest::from_yaml_str(&nested).unwrap();
    let layout = SigningLayout::rooted(path("doc_index"));

    sign_manifest(
        &mut manifest,
        &Ed25519Primitive,
        &key(),
        &SignOptions::with_layout(layout.clone()).at(at()),
    )
    .unwrap();

    let verify = |m: &Manifest| {
        verify_manifest(m, &Ed25519Primitive, Some(&key().public_key()), &layout)
            .unwrap()
            .status
    };
    assert_eq!(verify(&manifest), SignatureStatus::Valid);

    manifest
        .set(&path("release_notes"), Value::from("edited"))
        .unwrap();
    assert_eq!(verify(&manifest), SignatureStatus::Valid);

    manifest
        .set(&path("doc_index.metadata.name"), Value::from("edited"))
        .unwrap();
    assert_eq!(
        verify(&manifest),
        SignatureStatus::Invalid(InvalidReason::Mismatch)
    );
}

#[test]
fn test_float_key_fails_canonicalization() {
    let mut manifest = Manifest::from_yaml_str("schema_uri: s\nweights:\n  1.5: heavy\n").unwrap();
    let err = sign_manifest(
        &mut manifest,
        &Ed25519Primitive,
        &key(),
        &SignOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ProvError::Canonicalization(_)));
}

#[test]
fn test_damaged_signing_key_file_is_key_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dev-key.json");
    let json = serde_json::to_string(&key().to_key_file()).unwrap();

    // Truncated file.
    std::fs::write(&path, &json[..json.len() - 10]).unwrap();
    let err = Ed25519SecretKey::load(&path).map_err(ProvError::from).unwrap_err();
    assert!(matches!(err, ProvError::KeyUnavailable(_)));

    // Public half belongs to another key.
    let mut file = key().to_key_file();
    file.public_key = Ed25519SecretKey::from_bytes(&[7; 32]).public_key().to_hex();
    std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();
    let err = Ed25519SecretKey::load(&path).map_err(ProvError::from).unwrap_err();
    assert!(matches!(err, ProvError::KeyUnavailable(_)));
}

#[cfg(unix)]
mod minisign {
    use super::*;
    use ddc_prov::{MinisignCommand, MinisignPublicKey, MinisignSecretKey};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    const FAKE_SIGNER: &str = r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-x" ]; then out="$2"; fi
  shift
done
printf 'untrusted comment: fake\nRWQfakesignature\n' > "$out""#;

    fn key_files(dir: &Path) -> (MinisignSecretKey, MinisignPublicKey) {
        fs::write(dir.join("test.key"), "untrusted comment: secret\n").unwrap();
        fs::write(dir.join("test.pub"), "untrusted comment: public\n").unwrap();
        (
            MinisignSecretKey::new(dir.join("test.key")),
            MinisignPublicKey::load(dir.join("test.pub")).unwrap(),
        )
    }

    #[test]
    fn test_signs_through_external_program() {
        let dir = tempfile::tempdir().unwrap();
        let (secret, public) = key_files(dir.path());
        let signer = MinisignCommand::new(script(dir.path(), "sign.sh", FAKE_SIGNER));

        let mut manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
        let outcome = sign_manifest(&mut manifest, &signer, &secret, &SignOptions::default())
            .unwrap();
        assert_eq!(outcome.signature, "untrusted comment: fake\nRWQfakesignature");

        let signing = manifest.signing().unwrap().unwrap();
        assert_eq!(signing.scheme.as_deref(), Some("minisign"));

        let layout = SigningLayout::default();
        let accept = MinisignCommand::new(script(dir.path(), "accept.sh", "exit 0"));
        let reject = MinisignCommand::new(script(dir.path(), "reject.sh", "exit 1"));

        let valid = verify_manifest(&manifest, &accept, Some(&public), &layout).unwrap();
        assert_eq!(valid.status, SignatureStatus::Valid);

        let invalid = verify_manifest(&manifest, &reject, Some(&public), &layout).unwrap();
        assert_eq!(
            invalid.status,
            SignatureStatus::Invalid(InvalidReason::Mismatch)
        );
    }

    #[test]
    fn test_signer_ignoring_password_still_signs() {
        let dir = tempfile::tempdir().unwrap();
        let (secret, _) = key_files(dir.path());
        let secret = secret.with_password("hunter2");
        let body = format!("exec 0<&-\n{FAKE_SIGNER}");
        let signer = MinisignCommand::new(script(dir.path(), "nostdin.sh", &body));

        let mut manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
        let outcome = sign_manifest(&mut manifest, &signer, &secret, &SignOptions::default())
            .unwrap();
        assert!(outcome.signature.starts_with("untrusted comment:"));
    }

    #[test]
    fn test_hung_signer_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let (secret, _) = key_files(dir.path());
        let signer = MinisignCommand::new(script(dir.path(), "hang.sh", "sleep 30"))
            .with_timeout(Duration::from_millis(300));

        let mut manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
        let before = manifest.clone();

        let started = Instant::now();
        let err = sign_manifest(&mut manifest, &signer, &secret, &SignOptions::default())
            .unwrap_err();

        assert!(matches!(err, ProvError::KeyUnavailable(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(manifest, before);
    }

    #[test]
    fn test_failing_signer_is_key_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let (secret, _) = key_files(dir.path());
        let signer = MinisignCommand::new(script(
            dir.path(),
            "fail.sh",
            "echo 'Wrong password for that key' >&2\nexit 1",
        ));

        let mut manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
        let err = sign_manifest(&mut manifest, &signer, &secret, &SignOptions::default())
            .unwrap_err();
        match err {
            ProvError::KeyUnavailable(msg) => assert!(msg.contains("Wrong password")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
