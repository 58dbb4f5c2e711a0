use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn cmd() -> Command {
    Command::cargo_bin("sediff").unwrap()
}

#[test]
fn identical_policies_print_nothing() {
    cmd()
        .args(["data/policies/base.conf", "data/policies/base.conf"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn full_diff_prints_all_categories() {
    cmd()
        .args(["data/policies/base.conf", "data/policies/updated.conf"])
        .assert()
        .success()
        .stdout(contains("Types (1 Added, 0 Removed, 2 Modified)"))
        .stdout(contains("      * allow init_t bin_t:file { read +append -write };"))
        .stdout(contains("Policy Capabilities (1 Added, 0 Removed)"));
}

#[test]
fn stats_suppresses_details() {
    cmd()
        .args(["--stats", "data/policies/base.conf", "data/policies/updated.conf"])
        .assert()
        .success()
        .stdout(contains("Types (1 Added, 0 Removed, 2 Modified)"))
        .stdout(contains("+ shell_t").not());
}

#[test]
fn section_flags_are_exclusive() {
    cmd()
        .args(["-b", "data/policies/base.conf", "data/policies/updated.conf"])
        .assert()
        .success()
        .stdout(contains("Booleans (1 Added, 1 Removed, 1 Modified)"))
        .stdout(contains("Types (").not());
}

#[test]
fn requested_empty_section_still_prints_header() {
    cmd()
        .args(["--neverallow", "data/policies/base.conf", "data/policies/updated.conf"])
        .assert()
        .success()
        .stdout("Neverallow Rules (0 Added, 0 Removed, 0 Modified)\n\n");
}

#[test]
fn missing_policy_fails() {
    cmd()
        .args(["data/policies/base.conf", "data/policies/no_such.conf"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("I/O error"));
}

#[test]
fn malformed_policy_fails_with_diagnostics() {
    cmd()
        .args(["data/error_policies/bad.conf", "data/policies/base.conf"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Unknown statement"));
}

#[test]
fn version_flag() {
    cmd().arg("--version").assert().success();
}
