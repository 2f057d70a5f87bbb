//! Integration tests for the biblio binary.
//!
//! These tests verify end-to-end behavior including:
//! - Catalog management and search
//! - The loan / reserve / return workflow
//! - Fine accrual and payment
//! - Snapshot persistence across invocations

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("biblio"))
}

/// Seed a book and two patrons into the given data directory
fn seed_library(data_dir: &Path) {
    cli()
        .args(["add-book", "b1", "Dune", "Frank Herbert"])
        .args(["--genre", "sf", "--year", "1965"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
    cli()
        .args(["add-patron", "p1", "Ada Lovelace", "ada@example.com"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
    cli()
        .args(["add-patron", "p2", "Alan Turing", "alan@example.com"])
        .args(["--membership", "premium"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Library lending ledger"));
}

#[test]
fn test_add_book_persists_snapshot() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    seed_library(data_dir);

    let snapshot = data_dir.join("library.json");
    assert!(snapshot.exists());
    let contents = fs::read_to_string(&snapshot).expect("Failed to read snapshot");
    assert!(contents.contains("Dune"));
    assert!(contents.contains("ada@example.com"));
}

#[test]
fn test_search_reports_availability() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    seed_library(data_dir);

    cli()
        .args(["search", "dune"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("available"));

    cli()
        .args(["loan", "b1", "p1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    cli()
        .args(["search", "herbert"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("on loan"));
}

#[test]
fn test_loan_return_workflow() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    seed_library(data_dir);

    cli()
        .args(["loan", "b1", "p1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaned b1 to p1"));

    // A second loan of the same book fails
    cli()
        .args(["loan", "b1", "p2"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already loaned"));

    cli()
        .args(["return", "b1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Returned b1"));

    // Returning again fails: no open loan
    cli()
        .args(["return", "b1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not currently loaned"));

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("b1 -> p1"));
}

#[test]
fn test_reservation_blocks_other_patron() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    seed_library(data_dir);

    cli()
        .args(["reserve", "b1", "p2"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    cli()
        .args(["loan", "b1", "p1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("reserved by patron p2"));

    cli()
        .args(["loan", "b1", "p2"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
}

#[test]
fn test_duplicate_reservation_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    seed_library(data_dir);

    cli()
        .args(["loan", "b1", "p1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
    cli()
        .args(["reserve", "b1", "p2"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
    cli()
        .args(["reserve", "b1", "p2"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate reservation"));
}

#[test]
fn test_pay_fine_requires_known_patron() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    seed_library(data_dir);

    cli()
        .args(["pay-fine", "ghost", "1.00"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("patron not found"));

    // No fines outstanding: overpayment is reported, not an error
    cli()
        .args(["pay-fine", "p1", "1.00"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing charged"));
}

#[test]
fn test_report_summarizes_state() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    seed_library(data_dir);
    cli()
        .args(["loan", "b1", "p1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    cli()
        .arg("report")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("books: 1 (1 on loan)"))
        .stdout(predicate::str::contains("patrons: 2"));
}

#[test]
fn test_export_writes_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let csv_path = temp_dir.path().join("history.csv");

    seed_library(data_dir);
    cli()
        .args(["loan", "b1", "p1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
    cli()
        .args(["return", "b1"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    cli()
        .arg("export")
        .arg(&csv_path)
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 loan(s)"));

    let contents = fs::read_to_string(&csv_path).expect("Failed to read CSV");
    assert!(contents.starts_with("id,book_id,patron_id,loaned_at,returned_at"));
    assert!(contents.contains("b1"));
}

#[test]
fn test_remove_missing_book_fails() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .args(["remove-book", "nope"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("book not found"));
}
