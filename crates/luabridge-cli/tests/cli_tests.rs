//! CLI integration tests
//!
//! Runs the `luabridge` binary end to end.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn luabridge_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("luabridge").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("LUABRIDGE_LIBRARIES")
        .env_remove("LUABRIDGE_ARITY_CHECK")
        .env_remove("LUABRIDGE_JSON")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_shows_examples() {
    let dir = TempDir::new().unwrap();
    luabridge_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXAMPLES"))
        .stdout(predicate::str::contains("LUABRIDGE_LIBRARIES"));
}

#[test]
fn test_eval_prints_string_raw() {
    let dir = TempDir::new().unwrap();
    luabridge_cmd(&dir)
        .args(["eval", "return 'hi' .. 1"])
        .assert()
        .success()
        .stdout("hi1\n");
}

#[test]
fn test_eval_prints_table_as_json() {
    let dir = TempDir::new().unwrap();
    luabridge_cmd(&dir)
        .args(["eval", "return {1, 2, 3}"])
        .assert()
        .success()
        .stdout("[1,2,3]\n");
}

#[test]
fn test_eval_null_json() {
    let dir = TempDir::new().unwrap();
    luabridge_cmd(&dir)
        .args(["eval", "local x = 1", "--json"])
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn test_eval_syntax_error_fails() {
    let dir = TempDir::new().unwrap();
    luabridge_cmd(&dir)
        .args(["eval", "return ("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Syntax error"));
}

#[test]
fn test_run_script() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.lua"), "return math.floor(7.9)\n").unwrap();
    luabridge_cmd(&dir)
        .args(["run", "main.lua"])
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn test_call_with_json_args() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("lib.lua"),
        "function total(list) local s = 0 for _, v in ipairs(list) do s = s + v end return s end\n",
    )
    .unwrap();
    luabridge_cmd(&dir)
        .args(["call", "total", "[1, 2, 3.5]", "--script", "lib.lua"])
        .assert()
        .success()
        .stdout("6.5\n");
}

#[test]
fn test_library_flag() {
    let dir = TempDir::new().unwrap();
    luabridge_cmd(&dir)
        .args(["eval", "return type(os)"])
        .assert()
        .success()
        .stdout("nil\n");
    luabridge_cmd(&dir)
        .args(["eval", "return type(os)", "--lib", "os"])
        .assert()
        .success()
        .stdout("table\n");
}

#[test]
fn test_config_file_in_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("luabridge.toml"),
        "[runtime]\nlibraries = [\"base\"]\n",
    )
    .unwrap();
    luabridge_cmd(&dir)
        .args(["eval", "return type(string)"])
        .assert()
        .success()
        .stdout("nil\n");
}

#[test]
fn test_environment_override() {
    let dir = TempDir::new().unwrap();
    luabridge_cmd(&dir)
        .env("LUABRIDGE_LIBRARIES", "base,io")
        .args(["eval", "return type(io) .. type(math)"])
        .assert()
        .success()
        .stdout("tablenil\n");
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    luabridge_cmd(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lua 5.4"));
}
