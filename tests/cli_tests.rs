#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::fixtures::{copy_fixture, write_description};
use std::process::Command;

fn sdkgen() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sdkgen"))
}

#[test]
fn test_cli_generate_creates_crate() {
    let dir = tempfile::tempdir().unwrap();
    let description = copy_fixture("storage.yaml", dir.path());
    let output = dir.path().join("client");

    let status = sdkgen()
        .arg("generate")
        .arg("--description")
        .arg(&description)
        .arg("--output")
        .arg(&output)
        .arg("--crate-name")
        .arg("storage_sdk")
        .status()
        .expect("run cli");

    assert!(status.success());
    let manifest = std::fs::read_to_string(output.join("Cargo.toml")).unwrap();
    assert!(manifest.contains("name = \"storage_sdk\"\n"));
    assert!(output.join("src/generated/clients/storage_client.rs").exists());
}

#[test]
fn test_cli_dry_run_lists_paths() {
    let dir = tempfile::tempdir().unwrap();
    let description = copy_fixture("storage.yaml", dir.path());
    let output = dir.path().join("client");

    let out = sdkgen()
        .args(["generate", "--dry-run", "-d"])
        .arg(&description)
        .arg("-o")
        .arg(&output)
        .output()
        .expect("run cli");

    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let listed: Vec<&str> = stdout.lines().collect();
    assert_eq!(listed.first(), Some(&"Cargo.toml"));
    assert!(listed
        .iter()
        .any(|l| l.replace('\\', "/") == "src/blobs/generated/clients/blob_client.rs"));
    assert!(!output.exists());
}

#[test]
fn test_cli_check_valid_description() {
    let dir = tempfile::tempdir().unwrap();
    let description = copy_fixture("storage.yaml", dir.path());

    let status = sdkgen()
        .arg("check")
        .arg("--description")
        .arg(&description)
        .arg("--deny-warnings")
        .status()
        .expect("run cli");
    assert!(status.success());
}

#[test]
fn test_cli_check_deny_warnings_fails_on_collision() {
    let dir = tempfile::tempdir().unwrap();
    let description = write_description(
        dir.path(),
        "collide.yaml",
        "namespace: Demo\nmodels:\n  - name: widget_part\n  - name: WidgetPart\n",
    );

    let lenient = sdkgen()
        .arg("check")
        .arg("-d")
        .arg(&description)
        .status()
        .expect("run cli");
    assert!(lenient.success());

    let strict = sdkgen()
        .arg("check")
        .arg("-d")
        .arg(&description)
        .arg("--deny-warnings")
        .output()
        .expect("run cli");
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("warning"));
}

#[test]
fn test_cli_reports_unresolvable_description() {
    let dir = tempfile::tempdir().unwrap();
    let description = write_description(
        dir.path(),
        "broken.yaml",
        "namespace: Demo\nmodels:\n  - name: Lamp\n    properties:\n      - name: bulb\n        type: { kind: model, ref: Demo.Bulb }\n",
    );

    let out = sdkgen()
        .arg("generate")
        .arg("-d")
        .arg(&description)
        .arg("-o")
        .arg(dir.path().join("out"))
        .output()
        .expect("run cli");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Demo.Bulb"));
}
