//! Integration tests for the public dsign API.

use dsign::{
    Algorithm, Engine, EngineConfig, Error, KeyStatus, Outcome, SignatureExtension, Signed,
};
use std::fs;
use std::path::Path;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn engine_in(root: &Path, algorithm: Algorithm) -> Engine {
    Engine::new(
        EngineConfig::default()
            .key_dir(root.join("keys"))
            .algorithm(algorithm),
    )
}

#[test]
fn rsa_file_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), Algorithm::Rsa2048);
    let keys = engine.generate_named_keys("release").unwrap();

    let file = dir.path().join("artifact.tar");
    fs::write(&file, b"payload bytes").unwrap();

    let signed = engine.sign_path(&file, &keys.private_key).unwrap();
    let Signed::File(signed) = signed else {
        panic!("expected a file signature");
    };
    // 2048-bit RSA-PSS signature
    assert_eq!(fs::read(&signed.signature_path).unwrap().len(), 256);

    let v = engine.verify_path(&file, &keys.public_key).unwrap();
    assert!(v.is_valid(), "{}", v.reason());
}

#[test]
fn rsa_signature_rejected_by_ec_key() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let rsa = engine_in(dir.path(), Algorithm::Rsa2048);
    let ec = engine_in(dir.path(), Algorithm::EcP256);
    let rsa_keys = rsa.generate_named_keys("rsa").unwrap();
    let ec_keys = ec.generate_named_keys("ec").unwrap();

    let file = dir.path().join("doc.txt");
    fs::write(&file, b"hello").unwrap();
    rsa.sign_path(&file, &rsa_keys.private_key).unwrap();

    let err = ec.verify_path(&file, &ec_keys.public_key).unwrap_err();
    assert!(matches!(err, Error::SignatureMalformed(_)));
}

#[test]
fn verification_report_serializes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), Algorithm::EcP256);
    let keys = engine.generate_keys().unwrap();
    assert_eq!(keys.status, KeyStatus::Created);

    let proj = dir.path().join("proj");
    fs::create_dir(&proj).unwrap();
    fs::write(proj.join("a.txt"), "a").unwrap();
    engine.sign_path(&proj, &keys.paths.private_key).unwrap();
    fs::create_dir(proj.join("extra")).unwrap();

    let v = engine.verify_path(&proj, &keys.paths.public_key).unwrap();
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["outcome"]["status"], "structural_drift");
    assert_eq!(json["outcome"]["diff"]["added"][0], "extra/");
}

#[test]
fn config_file_and_env_drive_engine() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("dsign.json");
    fs::write(&config_path, r#"{"signature_extension": "signed"}"#).unwrap();

    let key_dir = dir.path().join("env-keys");
    let key_dir_str = key_dir.to_string_lossy().into_owned();
    let config = EngineConfig::from_json_file(&config_path)
        .unwrap()
        .with_overrides(|k| match k {
            dsign::config::ENV_KEY_DIR => Some(key_dir_str.clone()),
            dsign::config::ENV_ALGORITHM => Some("p256".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.signature_extension, SignatureExtension::Signed);

    let engine = Engine::new(config);
    let keys = engine.generate_keys().unwrap();
    assert!(keys.paths.private_key.starts_with(&key_dir));

    let file = dir.path().join("notes.md");
    fs::write(&file, "# notes").unwrap();
    engine.sign_path(&file, &keys.paths.private_key).unwrap();
    assert!(dir.path().join("notes.md.signed").is_file());
    assert!(!dir.path().join("notes.md.sig").exists());

    let v = engine.verify_path(&file, &keys.paths.public_key).unwrap();
    assert_eq!(v.outcome, Outcome::Valid);
}

#[test]
fn malformed_key_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_in(dir.path(), Algorithm::EcP256);
    let bad = dir.path().join("bad.pem");
    fs::write(&bad, "not a key").unwrap();
    let file = dir.path().join("doc.txt");
    fs::write(&file, "x").unwrap();

    let err = engine.sign_path(&file, &bad).unwrap_err();
    assert!(matches!(err, Error::KeyMalformed { .. }));
    assert!(!dir.path().join("doc.txt.sig").exists());
}
