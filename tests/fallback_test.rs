use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

const ROW: &str = "submit,alice,t1,100.00,USD,,John Smith,ABCD12345678,chasus33,Chase Bank";

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let batch = common::write_batch(&[ROW]);

    let mut cmd = Command::new(cargo_bin!("wirepay"));
    cmd.env_remove("RUST_LOG")
        .arg(batch.path())
        .arg("--db-path")
        .arg("some_db");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("alice,100.00,USD"))
        .stderr(predicate::str::contains(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage.",
        ));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let batch = common::write_batch(&[ROW]);
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("wirepay"));
    cmd.env_remove("RUST_LOG")
        .arg(batch.path())
        .arg("--db-path")
        .arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not())
        .stderr(predicate::str::contains("using RocksDB storage"));
}
