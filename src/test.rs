use std::fs;

use crate::error::LoadErrorItem;
use crate::{diff_policies, Report, SectionSelection};

const BASE_POLICY: &str = "data/policies/base.conf";
const UPDATED_POLICY: &str = "data/policies/updated.conf";
const BAD_POLICY: &str = "data/error_policies/bad.conf";

fn render(policy1: &str, policy2: &str, stats: bool) -> String {
    let diff = diff_policies(policy1, policy2).expect("policies should load");
    let report = Report::new(&diff, SectionSelection::all(), stats);
    let mut out = Vec::new();
    report.write(&mut out).expect("report should render");
    String::from_utf8(out).expect("report should be utf-8")
}

#[test]
fn full_report_matches_reference() {
    let expected = fs::read_to_string("data/expected_reports/full.txt").unwrap();
    assert_eq!(render(BASE_POLICY, UPDATED_POLICY, false), expected);
}

#[test]
fn stats_report_matches_reference() {
    let expected = fs::read_to_string("data/expected_reports/stats.txt").unwrap();
    assert_eq!(render(BASE_POLICY, UPDATED_POLICY, true), expected);
}

#[test]
fn identical_policy_files_report_nothing() {
    assert_eq!(render(BASE_POLICY, BASE_POLICY, false), "");
    assert_eq!(render(UPDATED_POLICY, UPDATED_POLICY, true), "");
}

#[test]
fn missing_policy_file_is_an_io_error() {
    let errors = diff_policies(BASE_POLICY, "data/policies/no_such.conf").unwrap_err();
    assert_eq!(errors.error_count(), 1);
    assert!(errors
        .into_iter()
        .all(|e| matches!(e, LoadErrorItem::IO(_))));
}

#[test]
fn errors_from_both_policies_accumulate() {
    let errors = diff_policies(BAD_POLICY, "data/policies/no_such.conf").unwrap_err();
    assert_eq!(errors.error_count(), 5);
}

#[test]
fn malformed_policy_reports_every_bad_statement() {
    let errors = diff_policies(BAD_POLICY, BASE_POLICY).unwrap_err();
    assert_eq!(errors.error_count(), 4);
    assert!(errors
        .into_iter()
        .all(|e| matches!(e, LoadErrorItem::Parse(_))));
}
