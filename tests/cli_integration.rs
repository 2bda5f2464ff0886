//! Integration tests for the rstore binary.
//!
//! These tests exercise the full CLI against store files in temporary
//! directories. HOME and the config variables point into the temp dir so a
//! developer's own configuration never leaks in.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// A command for running rstore inside the sandbox.
    fn rstore(&self) -> Command {
        let mut cmd = Command::cargo_bin("rstore").expect("binary built");
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg"))
            .env("RESULTSTORE_CONFIG", self.dir.path().join("absent.toml"))
            .args(["--max-attempts", "2", "--max-wait", "0.01"]);
        cmd
    }

    fn put(&self, target: &str, values: &str) -> assert_cmd::assert::Assert {
        self.rstore()
            .args(["put", target, "--values", values])
            .assert()
    }
}

#[test]
fn help_flag_works() {
    Sandbox::new()
        .rstore()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("result stores"));
}

#[test]
fn version_flag_works() {
    Sandbox::new()
        .rstore()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rstore"));
}

#[test]
fn put_then_inspect() {
    let sb = Sandbox::new();
    sb.rstore()
        .args([
            "put",
            "out.json:/res",
            "--values",
            r#"{"energy": -1.25, "charges": [[0.5, -0.5], [0.25, -0.25]]}"#,
            "--arg",
            "alpha=0.5",
            "--arg",
            "beta=",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Results written to out.json:/res"));

    sb.dir.child("out.json").assert(predicate::path::exists());
    sb.dir.child("out.json.lock").assert(predicate::path::exists());

    sb.rstore()
        .args(["ls", "out.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  res/"))
        .stdout(predicate::str::contains("charges  float [2, 2]"))
        .stdout(predicate::str::contains("energy  float = -1.25"));

    sb.rstore()
        .args(["attrs", "out.json:/res"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arg_alpha = 0.5"))
        .stdout(predicate::str::contains("cmdline = "))
        .stdout(predicate::str::contains("datetime = "))
        .stdout(predicate::str::contains("arg_beta").not());
}

#[test]
fn second_put_is_skipped_with_warning() {
    let sb = Sandbox::new();
    sb.put("out.json:/res", r#"{"energy": 1}"#).success();
    sb.put("out.json:/res", r#"{"energy": 2}"#)
        .success()
        .stderr(predicate::str::contains(
            "warning: Skipping because the group \"/res\" is already present in the file \"out.json\" and it is not empty.",
        ));

    sb.rstore()
        .args(["ls", "out.json:/res"])
        .assert()
        .success()
        .stdout(predicate::str::contains("energy  int = 1"));
}

#[test]
fn overwrite_replaces_children() {
    let sb = Sandbox::new();
    sb.put("out.json:/res", r#"{"a": 1, "b": 2}"#).success();
    sb.rstore()
        .args(["put", "out.json:/res", "--values", r#"{"c": 3}"#, "--overwrite"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Overwriting the contents of \"/res\""));

    sb.rstore()
        .args(["ls", "out.json:/res"])
        .assert()
        .success()
        .stdout(predicate::str::contains("c  int = 3"))
        .stdout(predicate::str::contains("a  int").not());
}

#[test]
fn check_reports_decision() {
    let sb = Sandbox::new();
    sb.rstore()
        .args(["check", "out.json:/res"])
        .assert()
        .success()
        .stdout("proceed\n");

    sb.put("out.json:/res", r#"{"x": 1}"#).success();

    sb.rstore()
        .args(["-q", "check", "out.json:/res"])
        .assert()
        .success()
        .stdout("skip\n");
    sb.rstore()
        .args(["-q", "check", "out.json:/res", "--overwrite"])
        .assert()
        .success()
        .stdout("proceed\n");
}

#[test]
fn quiet_hides_info() {
    let sb = Sandbox::new();
    sb.rstore()
        .args(["-q", "put", "out.json:/res", "--values", r#"{"x": 1}"#])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn malformed_locations_fail() {
    let sb = Sandbox::new();
    sb.rstore()
        .args(["check", "a:b:c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed location"));
    sb.rstore()
        .args(["put", "out.json", "--values", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must contain one colon"));
}

#[test]
fn reserved_and_invalid_values_fail() {
    let sb = Sandbox::new();
    sb.put("out.json:/res", r#"{"debug": 1}"#)
        .failure()
        .stderr(predicate::str::contains("reserved"));
    sb.put("out.json:/res", r#"{"x": null}"#).failure();
    sb.put("out.json:/res", "[1, 2]")
        .failure()
        .stderr(predicate::str::contains("JSON object"));
}

#[test]
fn ls_missing_store_fails() {
    Sandbox::new()
        .rstore()
        .args(["ls", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable after 2 attempt"));
}

#[test]
fn corrupt_store_is_reported() {
    let sb = Sandbox::new();
    sb.dir.child("out.json").write_str("{ not a store").unwrap();
    sb.rstore()
        .args(["ls", "out.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt store"));
}

#[test]
fn config_set_is_picked_up() {
    let sb = Sandbox::new();
    sb.rstore()
        .args(["config", "set", "output.overwrite", "true"])
        .assert()
        .success();
    sb.dir
        .child(".resultstore/config.toml")
        .assert(predicate::str::contains("overwrite = true"));

    sb.rstore()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("output.overwrite = true"));

    sb.put("out.json:/res", r#"{"x": 1}"#).success();
    sb.put("out.json:/res", r#"{"y": 2}"#)
        .success()
        .stderr(predicate::str::contains("Overwriting"));
}

#[test]
fn config_rejects_unknown_key() {
    Sandbox::new()
        .rstore()
        .args(["config", "set", "retry.bogus", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration key"));
}

#[test]
fn completion_generates_script() {
    Sandbox::new()
        .rstore()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rstore"));
}
