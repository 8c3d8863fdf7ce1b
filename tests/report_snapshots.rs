//! Snapshot tests for console report output

use std::path::Path;
use std::time::Duration;

use plane_tester::compare::{Verdict, compare};
use plane_tester::runner::{ConsoleReporter, FailureCause, RunResult, RunStatus, TestReporter};
use plane_tester::suite::parse_suite;

fn render(f: impl FnOnce(&mut ConsoleReporter<Vec<u8>>)) -> String {
    let mut reporter = ConsoleReporter::with_writer(Vec::new(), false, false);
    f(&mut reporter);
    String::from_utf8(reporter.into_inner()).unwrap()
}

#[test]
fn mismatch_report() {
    let Verdict::Fail(mismatch) = compare("1\n3\nextra", "1\n2\n") else {
        panic!("outputs should differ");
    };
    let result = RunResult {
        name: "addition".to_string(),
        status: RunStatus::Failure {
            iteration: 1,
            cause: FailureCause::Mismatch {
                actual: "1\n3\nextra".to_string(),
                mismatch,
            },
        },
        repeated: false,
        duration: Duration::ZERO,
    };

    let out = render(|r| r.on_test_complete(&result));
    insta::assert_snapshot!(out, @r"
Test addition                              FAILURE
      line | expected        | actual
         1 | 1               | 1
    >    2 | 2               | 3
    >    3 | <no more lines> | extra (no newline)
");
}

#[test]
fn parse_error_report() {
    let source = "test fine\n\tprint(1)\nexpect\n\t1\nend\ntest broken\nprint(2)\nexpect\nend\n";
    let error = parse_suite(source, Path::new("broken.test")).unwrap_err();

    let out = render(|r| r.on_parse_error(Path::new("broken.test"), &error));
    insta::assert_snapshot!(out, @r"
FAILURE: broken.test:7: in test `broken`: malformed indentation
    | print(2)
    help: indent content lines with one tab or four spaces; blank lines may be empty
");
}

#[test]
fn suite_with_skipped_and_passing_tests() {
    let out = render(|r| {
        r.on_suite_start(Path::new("tests/basics.test"));
        r.on_test_complete(&RunResult {
            name: "addition".to_string(),
            status: RunStatus::Success { iterations: 1 },
            repeated: false,
            duration: Duration::ZERO,
        });
        r.on_test_complete(&RunResult {
            name: "closures".to_string(),
            status: RunStatus::Skipped,
            repeated: false,
            duration: Duration::ZERO,
        });
    });
    insta::assert_snapshot!(out, @r"
Running tests in basics.test

Test addition                              SUCCESS
Test closures                              SKIPPED
");
}
