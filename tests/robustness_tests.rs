mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_malformed_rows_are_skipped() {
    let dir = tempdir().unwrap();
    let orders = dir.path().join("orders.csv");
    let transactions = dir.path().join("transactions.csv");
    common::generate_orders(&orders, &[("course-a", "40.50")], 3).unwrap();

    let mut wtr = csv::Writer::from_path(&transactions).unwrap();
    wtr.write_record(common::TRANSACTIONS_HEADER).unwrap();
    // Valid purchase
    wtr.write_record(["r1", "acct", "2024-03-01T10:00:00Z", "1", "USD", "40.50", "purchase"])
        .unwrap();
    // Invalid type
    wtr.write_record(["r2", "acct", "2024-03-01T10:00:00Z", "2", "USD", "40.50", "chargeback"])
        .unwrap();
    // Text in amount field
    wtr.write_record(["r3", "acct", "2024-03-01T10:00:00Z", "2", "USD", "lots", "purchase"])
        .unwrap();
    // Unparseable timestamp
    wtr.write_record(["r4", "acct", "yesterday", "2", "USD", "40.50", "purchase"])
        .unwrap();
    // Valid purchase again
    wtr.write_record(["r5", "acct", "2024-03-01T11:00:00Z", "3", "USD", "40.50", "purchase"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("course-ledger"));
    cmd.arg(&transactions).arg("--orders").arg(&orders);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading transaction"))
        .stdout(predicate::str::contains("course-a,81.00,0"));
}

#[test]
fn test_conflicting_and_orphan_transactions_are_rejected() {
    let dir = tempdir().unwrap();
    let orders = dir.path().join("orders.csv");
    let transactions = dir.path().join("transactions.csv");
    common::generate_orders(&orders, &[("course-a", "40.50")], 2).unwrap();

    let mut wtr = csv::Writer::from_path(&transactions).unwrap();
    wtr.write_record(common::TRANSACTIONS_HEADER).unwrap();
    wtr.write_record(["r1", "acct", "2024-03-01T10:00:00Z", "1", "USD", "40.50", "purchase"])
        .unwrap();
    // Same remote id, different amount
    wtr.write_record(["r1", "acct", "2024-03-01T10:00:00Z", "1", "USD", "99.00", "purchase"])
        .unwrap();
    // Unknown order
    wtr.write_record(["r2", "acct", "2024-03-01T10:00:00Z", "77", "USD", "40.50", "purchase"])
        .unwrap();
    wtr.write_record(["r3", "acct", "2024-03-01T10:00:00Z", "2", "USD", "40.50", "purchase"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("course-ledger"));
    cmd.arg(&transactions).arg("--orders").arg(&orders);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error recording transaction"))
        .stderr(predicate::str::contains("Integrity error"))
        .stderr(predicate::str::contains("Not found: order 77"))
        .stdout(predicate::str::contains("course-a,81.00,0"));
}

#[test]
fn test_shuffled_multi_course_purchases() {
    let dir = tempdir().unwrap();
    let orders = dir.path().join("orders.csv");
    let transactions = dir.path().join("transactions.csv");
    let courses = [("course-a", "40.50"), ("course-b", "100.00"), ("course-c", "0.99")];
    common::generate_orders(&orders, &courses, 20).unwrap();
    common::generate_shuffled_purchases(&transactions, &courses, 20).unwrap();

    let mut cmd = Command::new(cargo_bin!("course-ledger"));
    cmd.arg(&transactions).arg("--orders").arg(&orders);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("course-a,810.00,0"))
        .stdout(predicate::str::contains("course-b,2000.00,0"))
        .stdout(predicate::str::contains("course-c,19.80,0"));
}
