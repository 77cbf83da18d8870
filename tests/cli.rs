//! CLI integration tests for the filter_query binary.
//!
//! These check exit codes and the parts of the output that identify the parsed tree
//! or the reported error.

use assert_cmd::Command;
use predicates::prelude::*;

fn filter_query() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("filter_query").unwrap()
}

#[test]
fn prints_tree_by_default() {
    filter_query()
        .arg("A = 1 OR B = 2 AND C = 3")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Or\n  Condition A = 1\n  And\n"));
}

#[test]
fn prints_canonical_query() {
    filter_query()
        .args(["--format", "query", "(a=1 or b=2)and c in(1,2)"])
        .assert()
        .success()
        .stdout("(a = 1 OR b = 2) AND c IN (1, 2)\n");
}

#[test]
fn prints_json() {
    filter_query()
        .args(["--format", "json", "Y NOT IN ('a', 'b')"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"membership\""))
        .stdout(predicate::str::contains("\"negated\": true"));
}

#[test]
fn reports_missing_connective() {
    filter_query()
        .arg("A=1 B=2")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("missing AND/OR between conditions near 'B'"));
}

#[test]
fn reports_invalid_operator() {
    filter_query()
        .arg("A ~ 1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid operator '~'"));
}

#[test]
fn field_delimiter_flag() {
    filter_query()
        .args(["--field-delimiter", "`", "--format", "query", "`first-name` = 'Ann'"])
        .assert()
        .success()
        .stdout("first-name = 'Ann'\n");

    filter_query()
        .args(["--field-delimiter", "`", "first-name = 'Ann'"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("field name must be enclosed in '`'"));
}

#[test]
fn reports_end_of_input_after_multibyte_whitespace() {
    for query in ["A =\u{3000}", "A =\u{a0}"] {
        filter_query()
            .arg(query)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("missing value after operator '='"));
    }
}

#[test]
fn rejects_reserved_field_delimiter() {
    filter_query()
        .args(["--field-delimiter", "'", "'a' = 1"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("part of the query syntax"));
}

#[test]
fn verbose_logs_parser_events() {
    filter_query()
        .env_remove("RUST_LOG")
        .args(["--verbose", "A = 1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed query"));

    filter_query()
        .env_remove("RUST_LOG")
        .arg("A = 1")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn reports_nesting_too_deep() {
    let query = format!("{}A=1{}", "(".repeat(300), ")".repeat(300));
    filter_query()
        .arg(query)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("nested deeper than 256 levels"));
}
