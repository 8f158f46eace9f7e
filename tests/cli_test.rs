//! End-to-end coverage of the demo binary against a scratch image file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn image_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("simfs-cli-test-{name}.img"))
}

#[test]
fn format_then_dump_reports_free_sectors() {
    let image = image_path("format-dump");
    let _ = fs::remove_file(&image);

    Command::cargo_bin("simfs")
        .unwrap()
        .args(["-i", image.to_str().unwrap(), "-f"])
        .assert()
        .success();

    Command::cargo_bin("simfs")
        .unwrap()
        .args(["-i", image.to_str().unwrap(), "-D"])
        .assert()
        .success()
        .stdout(predicate::str::contains("free of"));

    let _ = fs::remove_file(&image);
}

#[test]
fn execute_and_cp_report_out_of_scope() {
    let image = image_path("execute-cp");
    let _ = fs::remove_file(&image);

    Command::cargo_bin("simfs")
        .unwrap()
        .args(["-i", image.to_str().unwrap(), "-f"])
        .assert()
        .success();

    Command::cargo_bin("simfs")
        .unwrap()
        .args(["-i", image.to_str().unwrap(), "-e", "prog"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of scope"));

    let _ = fs::remove_file(&image);
}

#[test]
fn listing_an_empty_volume_prints_nothing() {
    let image = image_path("list-empty");
    let _ = fs::remove_file(&image);

    Command::cargo_bin("simfs")
        .unwrap()
        .args(["-i", image.to_str().unwrap(), "-f"])
        .assert()
        .success();

    Command::cargo_bin("simfs")
        .unwrap()
        .args(["-i", image.to_str().unwrap(), "-l", "/"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let _ = fs::remove_file(&image);
}

#[test]
fn mounting_a_missing_image_fails() {
    let image = image_path("never-created");
    let _ = fs::remove_file(&image);

    Command::cargo_bin("simfs")
        .unwrap()
        .args(["-i", image.to_str().unwrap(), "-l", "/"])
        .assert()
        .failure();
}
