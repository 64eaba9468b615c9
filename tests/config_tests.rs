//! Sync definition loading and override merging

use gitpin::Error;
use gitpin::config::{Overrides, SyncFile};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

const REV: &str = "911267b21097ea70bf2ccdfd41152313525237fb";

#[test]
fn test_load_yaml_definition() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pin.yaml");
    std::fs::write(
        &path,
        format!(
            "repository:\n  url: https://github.com/lumen/lumen\n  branch: windows\n  revision: {}\nworking_dir: temp-repo\ntransfer:\n  timeout_secs: 60\n",
            REV
        ),
    )
    .unwrap();

    let file = SyncFile::load(&path).unwrap();
    let resolved = file.resolve(Overrides::default()).unwrap();

    assert_eq!(resolved.request.clone_url, "https://github.com/lumen/lumen");
    assert_eq!(resolved.request.branch, "windows");
    assert_eq!(resolved.request.target.as_str(), REV);
    assert_eq!(resolved.request.working_dir, PathBuf::from("temp-repo"));
    assert_eq!(resolved.timeout, Duration::from_secs(60));
    assert!(!resolved.request.replace_existing);
}

#[test]
fn test_load_json_definition() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pin.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"repository": {{"url": "/srv/repo", "branch": "main", "revision": "{}"}}, "working_dir": "out"}}"#,
            REV
        ),
    )
    .unwrap();

    let resolved = SyncFile::load(&path).unwrap().resolve(Overrides::default()).unwrap();

    assert_eq!(resolved.request.clone_url, "/srv/repo");
    assert_eq!(resolved.timeout, Duration::from_secs(300));
}

#[test]
fn test_overrides_take_precedence() {
    let file = SyncFile {
        working_dir: Some(PathBuf::from("from-file")),
        ..Default::default()
    };
    let overrides = Overrides {
        url: Some("https://example.com/r.git".to_string()),
        branch: Some("release".to_string()),
        revision: Some(REV.to_uppercase()),
        working_dir: Some(PathBuf::from("from-flag")),
        timeout_secs: Some(5),
        ca_bundle: Some(PathBuf::from("/etc/ca.pem")),
        replace_existing: true,
    };

    let resolved = file.resolve(overrides).unwrap();

    assert_eq!(resolved.request.working_dir, PathBuf::from("from-flag"));
    assert_eq!(resolved.request.target.as_str(), REV);
    assert_eq!(resolved.timeout, Duration::from_secs(5));
    assert_eq!(resolved.ca_bundle, Some(PathBuf::from("/etc/ca.pem")));
    assert!(resolved.request.replace_existing);
}

#[test]
fn test_missing_fields_are_validation_errors() {
    let err = SyncFile::default().resolve(Overrides::default()).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_zero_timeout_rejected() {
    let overrides = Overrides {
        url: Some("/srv/repo".to_string()),
        branch: Some("main".to_string()),
        revision: Some(REV.to_string()),
        working_dir: Some(PathBuf::from("out")),
        timeout_secs: Some(0),
        ..Default::default()
    };

    assert!(matches!(
        SyncFile::default().resolve(overrides),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_full_ref_as_branch_rejected() {
    let overrides = Overrides {
        url: Some("/srv/repo".to_string()),
        branch: Some("refs/heads/main".to_string()),
        revision: Some(REV.to_string()),
        working_dir: Some(PathBuf::from("out")),
        ..Default::default()
    };

    assert!(SyncFile::default().resolve(overrides).is_err());
}

#[test]
fn test_abbreviated_revision_rejected() {
    let overrides = Overrides {
        url: Some("/srv/repo".to_string()),
        branch: Some("main".to_string()),
        revision: Some("911267b".to_string()),
        working_dir: Some(PathBuf::from("out")),
        ..Default::default()
    };

    assert!(matches!(
        SyncFile::default().resolve(overrides),
        Err(Error::InvalidRevision(_))
    ));
}

#[test]
fn test_unknown_keys_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pin.yaml");
    std::fs::write(&path, "repository:\n  url: x\n  tag: v1\n").unwrap();

    assert!(matches!(SyncFile::load(&path), Err(Error::Yaml(_))));
}
