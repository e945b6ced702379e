//! CLI integration tests for affinity
//!
//! Tests the affinity CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const VIEWED_U1_P1: &str = "eyJlbnRpdHkiOiJ2aWV3ZWQiLCJmcm9tTm9kZSI6InUxIiwidG9Ob2RlIjoicDEifQ==";

/// Helper to create a command whose config and database live in `dir`
#[allow(deprecated)]
fn affinity_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("affinity").unwrap();
    cmd.env("AFFINITY_CONFIG_DIR", dir.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    affinity_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reinforced weighted-edge graph store"))
        .stdout(predicate::str::contains("traverse"));
}

#[test]
fn test_version_output() {
    let dir = TempDir::new().unwrap();
    affinity_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("affinity"));
}

#[test]
fn test_link_then_closest() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir)
        .args(["link", "viewed", "u1", "p1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("u1 -[viewed:none]- p1  0.999999999999999"));

    affinity_cmd(&dir)
        .args(["link", "viewed", "u1", "p2", "--absolute", "0.5"])
        .assert()
        .success();

    affinity_cmd(&dir)
        .args(["closest", "viewed", "u1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"toNode\": \"p2\""))
        .stdout(predicate::str::contains("\"toNode\": \"p1\""));

    affinity_cmd(&dir)
        .args(["closest", "viewed", "p1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("p1 -[viewed:none]- u1"));

    affinity_cmd(&dir)
        .args(["count", "viewed", "u1"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));
}

#[test]
fn test_namespace_flag_isolates_graphs() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir)
        .args(["link", "e", "a", "b", "--namespace", "shop"])
        .assert()
        .success();

    affinity_cmd(&dir)
        .args(["closest", "e", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No edges found."));

    affinity_cmd(&dir)
        .args(["closest", "e", "a", "-n", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a -[e:none]- b"));
}

#[test]
fn test_delete_node_removes_inverses() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir).args(["all-all", "e", "a", "b", "c"]).assert().success();

    affinity_cmd(&dir)
        .args(["delete-node", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 4 records."));

    affinity_cmd(&dir)
        .args(["edges", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fromNode\": \"a\"").not())
        .stdout(predicate::str::contains("\"fromNode\": \"b\""));
}

#[test]
fn test_invalid_link_reports_fields() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir)
        .args(["link", "e", "a", "b", "--absolute=-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absolute_distance"));

    affinity_cmd(&dir)
        .args(["link", "e", "a", "b", "--direction", "up"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown direction"));
}

#[test]
fn test_ingest_coalesces_records() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("records.ndjson");
    let lines = format!(
        "{{\"recordId\":\"r1\",\"data\":\"{data}\"}}\n{{\"recordId\":\"r2\",\"data\":\"{data}\"}}\n\n{{\"recordId\":\"r3\",\"data\":\"%%%\"}}\n",
        data = VIEWED_U1_P1
    );
    std::fs::write(&input, lines).unwrap();

    affinity_cmd(&dir)
        .args(["ingest", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acknowledged 3 records."));

    affinity_cmd(&dir)
        .args(["closest", "viewed", "u1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.999999999999998"));
}

#[test]
fn test_ingest_from_stdin() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir)
        .args(["ingest", "--format", "json"])
        .write_stdin(format!("{{\"recordId\":\"r1\",\"data\":\"{}\"}}\n", VIEWED_U1_P1))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"recordId\": \"r1\""));
}

#[test]
fn test_traverse_command() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir).args(["link", "e", "a", "b", "--absolute", "0.1"]).assert().success();
    affinity_cmd(&dir).args(["link", "e", "b", "c", "--absolute", "0.2"]).assert().success();

    affinity_cmd(&dir)
        .args(["traverse", "a", "e", "e"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a -> b"));

    affinity_cmd(&dir)
        .args(["traverse", "a", "e", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"frequency\""))
        .stdout(predicate::str::contains("\"paths\""));
}

#[test]
fn test_node_documents() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir)
        .args(["node", "set", "p1", r#"{"title":"Lamp","price":10}"#])
        .assert()
        .success();

    affinity_cmd(&dir)
        .args(["node", "patch", "p1", r#"{"price":null,"stock":3}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stock\": 3"))
        .stdout(predicate::str::contains("price").not());

    affinity_cmd(&dir)
        .args(["node", "get", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_set_get_and_reset() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir)
        .args(["config", "set", "graph.decrement_path", "0.01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set graph.decrement_path = 0.01"));

    affinity_cmd(&dir)
        .args(["config", "get", "graph.decrement_path"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0.01\n"));

    affinity_cmd(&dir)
        .args(["link", "e", "a", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.99"));

    affinity_cmd(&dir).args(["config", "reset"]).assert().success();

    affinity_cmd(&dir)
        .args(["config", "get", "graph.decrement_path"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0.000000000000001\n"));
}

#[test]
fn test_config_rejects_unknown_values() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir)
        .args(["config", "set", "backend.kind", "redis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown backend kind"));

    affinity_cmd(&dir)
        .args(["config", "get", "graph.colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("affinity config list"));
}

#[test]
fn test_memory_backend_starts_empty() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir).args(["config", "set", "backend.kind", "memory"]).assert().success();
    affinity_cmd(&dir).args(["link", "e", "a", "b"]).assert().success();

    affinity_cmd(&dir)
        .args(["count", "e", "a"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));
}

#[test]
fn test_doctor_command() {
    let dir = TempDir::new().unwrap();

    affinity_cmd(&dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Configuration: Valid"))
        .stdout(predicate::str::contains("All checks passed."));
}
