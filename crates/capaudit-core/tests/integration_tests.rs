//! Integration tests for capaudit-core.
//!
//! These tests run whole directory audits against real archives on disk.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use capaudit_core::AuditConfig;
use capaudit_core::AuditOutcome;
use capaudit_core::AuditProgress;
use capaudit_core::Auditor;
use capaudit_core::PermissionRisk;
use capaudit_core::archive::sha256_file;
use capaudit_core::archive::sidecar_path;
use capaudit_core::audit::ReflectDocument;
use capaudit_core::test_utils::create_capsule_zip;
use capaudit_core::test_utils::create_test_zip;
use capaudit_core::test_utils::read_zip_entry;
use capaudit_core::test_utils::zip_entry_names;
use capaudit_core::verify_signature;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn auditor_for(temp: &TempDir) -> Auditor {
    let config = AuditConfig::default().with_output_dir(temp.path().join("audited"));
    Auditor::new(config).unwrap()
}

fn base_dir(temp: &TempDir) -> PathBuf {
    let base = temp.path().join("capsules");
    fs::create_dir_all(&base).unwrap();
    base
}

#[test]
fn test_unknown_permission_and_missing_keys() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(
        base.join("ext.zip"),
        create_capsule_zip(r#"{"permissions": ["tabs", "mystery_perm"]}"#, &[]),
    )
    .unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    let summary = batch.outcomes["ext.zip"].summary().unwrap();

    assert_eq!(summary.score.total(), 65);
    assert_eq!(summary.score.manifest_integrity(), 70);
    assert_eq!(summary.score.permission_risk(), PermissionRisk::Medium);
    assert_eq!(summary.unknown_permissions, vec!["mystery_perm"]);
    assert!(summary.repaired);

    let repaired = temp.path().join("audited/ext_REPAIRED.zip");
    assert_eq!(batch.repaired, vec![repaired.clone()]);

    let manifest: serde_json::Value =
        serde_json::from_str(&read_zip_entry(&repaired, "manifest.json")).unwrap();
    assert_eq!(manifest["name"], "Operator Extension");
    assert_eq!(manifest["version"], "1.0");
    assert_eq!(manifest["manifest_version"], 3);
    assert_eq!(manifest["repaired_by"], "Agent0 Auditor v1.0");

    let log = read_zip_entry(&repaired, "repair.log");
    assert!(log.starts_with("Capsule Repair Summary:"));
    assert!(log.contains("Unknown permission: mystery_perm"));
    assert!(log.contains("Missing key 'name' filled."));
    assert!(log.trim_end().ends_with("Score: 65/100"));
}

#[test]
fn test_capsule_without_manifest() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(
        base.join("bare.camp"),
        create_test_zip(&[("src/popup.html", b"<p/>"), ("src/app.js", b"1")]),
    )
    .unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    let summary = batch.outcomes["bare.camp"].summary().unwrap();

    assert_eq!(summary.score.total(), 100);
    assert_eq!(summary.score.permission_risk(), PermissionRisk::Low);
    assert!(summary.unknown_permissions.is_empty());
    assert!(summary.repaired);

    let repaired = temp.path().join("audited/bare_REPAIRED.camp");
    let reflect: serde_yaml::Value =
        serde_yaml::from_str(&read_zip_entry(&repaired, "reflect.yaml")).unwrap();
    assert_eq!(reflect["files"][0].as_str(), Some("src/app.js"));
    assert_eq!(reflect["files"][1].as_str(), Some("src/popup.html"));
    assert_eq!(reflect["repaired"].as_bool(), Some(true));
    assert_eq!(reflect["score"]["total"].as_i64(), Some(100));

    let names = zip_entry_names(&repaired);
    assert!(names.contains(&"agent_personality.yaml".to_string()));
    assert!(names.contains(&"audit_summary.json".to_string()));
    assert!(!names.contains(&"manifest.json".to_string()));
}

#[test]
fn test_corrupt_archive_does_not_stop_batch() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(base.join("a_broken.zip"), b"definitely not a zip").unwrap();
    fs::write(
        base.join("b_good.zip"),
        create_capsule_zip(r#"{"name": "x", "version": "2", "manifest_version": 3}"#, &[]),
    )
    .unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();

    assert_eq!(batch.failed_count(), 1);
    assert_eq!(batch.audited_count(), 1);
    assert!(matches!(
        &batch.outcomes["a_broken.zip"],
        AuditOutcome::Failed { archive, .. } if archive == "a_broken.zip"
    ));
    assert_eq!(batch.outcomes["b_good.zip"].summary().unwrap().score.total(), 100);
    assert!(!base.join("extracted_a_broken").exists());
    assert!(!temp.path().join("audited/a_broken_REPAIRED.zip").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    let original = create_capsule_zip(r#"{"permissions": ["nfc"]}"#, &[]);
    fs::write(base.join("ext.zip"), &original).unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, true).unwrap();
    let summary = batch.outcomes["ext.zip"].summary().unwrap();

    assert_eq!(summary.score.total(), 65);
    assert!(!summary.repaired);
    assert!(batch.repaired.is_empty());
    assert!(!temp.path().join("audited").exists());
    assert!(!base.join("extracted_ext").exists());
    assert_eq!(fs::read(base.join("ext.zip")).unwrap(), original);
}

#[test]
fn test_signature_sidecar_matches_archive() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(base.join("ext.zip"), create_capsule_zip("{}", &[])).unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    let repaired = &batch.repaired[0];

    let sidecar = fs::read_to_string(sidecar_path(repaired)).unwrap();
    let digest = sha256_file(repaired).unwrap();
    assert_eq!(sidecar, format!("{digest}  ext_REPAIRED.zip"));
    assert!(verify_signature(repaired).unwrap().matches());

    match &batch.outcomes["ext.zip"] {
        AuditOutcome::Audited(audit) => assert_eq!(audit.signature.as_deref(), Some(&*digest)),
        AuditOutcome::Failed { reason, .. } => panic!("unexpected failure: {reason}"),
    }
}

#[test]
fn test_tampered_archive_fails_verification() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(base.join("ext.zip"), create_capsule_zip("{}", &[])).unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    let repaired = &batch.repaired[0];

    let mut bytes = fs::read(repaired).unwrap();
    bytes.push(0);
    fs::write(repaired, bytes).unwrap();

    let check = verify_signature(repaired).unwrap();
    assert!(!check.matches());
    assert!(check.into_result().is_err());
}

#[test]
fn test_repaired_archive_bundles_metadata() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(
        base.join("ext.zip"),
        create_capsule_zip(
            r#"{"name": "x", "version": "1", "manifest_version": 3,
                "content_scripts": [{"js": ["content.js"]}],
                "action": {"default_popup": "popup.html"}}"#,
            &[("content.js", b"run()")],
        ),
    )
    .unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    let summary = batch.outcomes["ext.zip"].summary().unwrap();
    assert_eq!(summary.missing_files, vec!["popup.html"]);
    assert_eq!(summary.score.total(), 95);

    let names = zip_entry_names(&batch.repaired[0]);
    for expected in [
        "agent_personality.yaml",
        "audit_summary.json",
        "content.js",
        "manifest.json",
        "reflect.yaml",
        "repair.log",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }

    let bundled: serde_json::Value =
        serde_json::from_str(&read_zip_entry(&batch.repaired[0], "audit_summary.json")).unwrap();
    assert_eq!(bundled["archive"], "ext.zip");
    assert_eq!(bundled["score"]["total"], 95);
}

#[test]
fn test_nested_reflect_is_overwritten_in_place() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(
        base.join("ext.zip"),
        create_test_zip(&[("meta/reflect.yaml", b"stale: true\n"), ("a.js", b"1")]),
    )
    .unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    let repaired = &batch.repaired[0];

    let text = read_zip_entry(repaired, "meta/reflect.yaml");
    assert!(!text.contains("stale"));
    let reflect: ReflectDocument = serde_yaml::from_str(&text).unwrap();
    assert_eq!(reflect.capsule, "Auto-Repaired Reflex Capsule");
    assert_eq!(reflect.files, vec!["a.js"]);
    assert!(reflect.repaired);
    assert_eq!(reflect.repaired_by, "Agent0 Auditor v1.0");
    assert_eq!(reflect.score.total(), 100);
    assert!(!zip_entry_names(repaired).contains(&"reflect.yaml".to_string()));
}

#[test]
fn test_existing_personality_is_kept() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    let custom = b"agent_personality:\n  mode: calm\n";
    fs::write(
        base.join("ext.zip"),
        create_test_zip(&[("cfg/agent_personality.yaml", custom)]),
    )
    .unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    let repaired = &batch.repaired[0];

    assert_eq!(
        read_zip_entry(repaired, "cfg/agent_personality.yaml").as_bytes(),
        custom
    );
    assert!(!zip_entry_names(repaired).contains(&"agent_personality.yaml".to_string()));
}

#[test]
fn test_aggregate_summary() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(base.join("one.zip"), create_capsule_zip("{}", &[])).unwrap();
    fs::write(base.join("two.camp"), b"junk").unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    let path = batch.write_summary(&temp.path().join("audited")).unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["one.zip"]["status"], "audited");
    assert_eq!(json["one.zip"]["summary"]["score"]["total"], 70);
    assert_eq!(json["two.camp"]["status"], "failed");
}

#[test]
fn test_non_archives_ignored() {
    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(base.join("README.md"), "hello").unwrap();
    fs::write(base.join("capsule.tar"), "tar").unwrap();

    let batch = auditor_for(&temp).audit_directory(&base, false).unwrap();
    assert!(batch.outcomes.is_empty());
    assert!(batch.repaired.is_empty());
}

#[test]
fn test_missing_base_dir_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = auditor_for(&temp).audit_directory(&temp.path().join("absent"), false);
    assert!(result.is_err());
}

#[test]
fn test_progress_callbacks() {
    #[derive(Default)]
    struct Recorder {
        started: Vec<(usize, usize)>,
        finished: Vec<String>,
        completed: bool,
    }

    impl AuditProgress for Recorder {
        fn on_archive_start(&mut self, _path: &Path, total: usize, current: usize) {
            self.started.push((current, total));
        }

        fn on_archive_complete(&mut self, archive: &str, _outcome: &AuditOutcome) {
            self.finished.push(archive.to_string());
        }

        fn on_complete(&mut self) {
            self.completed = true;
        }
    }

    let temp = TempDir::new().unwrap();
    let base = base_dir(&temp);
    fs::write(base.join("a.zip"), create_capsule_zip("{}", &[])).unwrap();
    fs::write(base.join("b.zip"), create_capsule_zip("{}", &[])).unwrap();

    let mut recorder = Recorder::default();
    auditor_for(&temp)
        .audit_directory_with_progress(&base, true, &mut recorder)
        .unwrap();

    assert_eq!(recorder.started, vec![(1, 2), (2, 2)]);
    assert_eq!(recorder.finished, vec!["a.zip", "b.zip"]);
    assert!(recorder.completed);
}

#[test]
fn test_invalid_config_rejected() {
    let config = AuditConfig::default().with_compression_level(Some(12));
    assert!(Auditor::new(config).is_err());
}
