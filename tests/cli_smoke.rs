//! Behavioural smoke tests for the provider binary.

use std::fs;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const GARM_VARIABLES: [&str; 6] = [
    "GARM_COMMAND",
    "GARM_CONTROLLER_ID",
    "GARM_PROVIDER_CONFIG_FILE",
    "GARM_POOL_ID",
    "GARM_INSTANCE_ID",
    "GARM_INTERFACE_VERSION",
];

fn provider() -> Command {
    let mut cmd = cargo_bin_cmd!("garm-provider-linode");
    for variable in GARM_VARIABLES {
        cmd.env_remove(variable);
    }
    cmd.env_remove("GARM_PROVIDER_LOG");
    cmd
}

fn config_dir(contents: &str) -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("linode.toml");
    fs::write(&file, contents).expect("write config");
    let path = file.to_str().expect("utf-8 temp path").to_owned();
    (dir, path)
}

#[test]
fn get_version_needs_no_configuration() {
    provider()
        .env("GARM_COMMAND", "GetVersion")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("v"))
        .stderr("");
}

#[test]
fn config_without_token_is_rejected() {
    let (_dir, path) = config_dir("region = \"us-east\"\n");

    provider()
        .env("GARM_COMMAND", "ListInstances")
        .env("GARM_CONTROLLER_ID", "controller-1")
        .env("GARM_POOL_ID", "p1")
        .env("GARM_PROVIDER_CONFIG_FILE", &path)
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("token needs to be set"));
}

#[test]
fn malformed_bootstrap_input_fails() {
    let (_dir, path) = config_dir("token = \"foo\"\n");

    provider()
        .env("GARM_COMMAND", "CreateInstance")
        .env("GARM_CONTROLLER_ID", "controller-1")
        .env("GARM_PROVIDER_CONFIG_FILE", &path)
        .write_stdin("this is not json")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("decoding bootstrap params"));
}

#[test]
fn list_without_pool_fails() {
    let (_dir, path) = config_dir("token = \"foo\"\n");

    provider()
        .env("GARM_COMMAND", "ListInstances")
        .env("GARM_CONTROLLER_ID", "controller-1")
        .env("GARM_PROVIDER_CONFIG_FILE", &path)
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("missing GARM_POOL_ID"));
}

#[test]
fn unknown_command_is_rejected() {
    provider()
        .env("GARM_COMMAND", "Reboot")
        .assert()
        .failure()
        .stdout("");
}
