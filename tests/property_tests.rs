//! Property-based tests for suite parsing and output comparison
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use std::collections::BTreeMap;
use std::path::Path;

use plane_tester::compare::{Verdict, compare};
use plane_tester::suite::dedent::dedent;
use plane_tester::suite::{TestCase, parse_suite};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// A content line (with terminator) that can never be mistaken for block syntax.
fn content_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("\n".to_string()),
        "[a-z0-9(){}=+ ]{1,20}".prop_map(|s| format!("x{s}\n")),
        "[a-z]{1,8}".prop_map(|s| format!("\tx{s}\n")),
    ]
}

fn block() -> impl Strategy<Value = String> {
    prop::collection::vec(content_line(), 0..6).prop_map(|lines| lines.concat())
}

fn case_strategy() -> impl Strategy<Value = TestCase> {
    (
        "[a-z][a-z0-9_]{0,12}",
        block(),
        prop::collection::btree_map("[a-z]{1,6}\\.src", block(), 0..3),
        block(),
    )
        .prop_map(|(name, code, files, expected_output)| TestCase {
            name,
            code,
            files,
            expected_output,
            annotations: Default::default(),
            line: 1,
        })
}

// =============================================================================
// Dedent Properties
// =============================================================================

proptest! {
    /// Property: one tab or four spaces are removed, nothing more
    #[test]
    fn dedent_strips_exactly_one_prefix(body in "[a-z \t]{0,20}") {
        let tabbed = format!("\t{body}\n");
        let spaced = format!("    {body}\n");
        let expected = format!("{body}\n");
        prop_assert_eq!(dedent(&tabbed), Ok(expected.as_str()));
        prop_assert_eq!(dedent(&spaced), Ok(expected.as_str()));
    }

    /// Property: lines starting with a visible character are never accepted
    #[test]
    fn dedent_rejects_unindented_text(body in "[a-z][a-z ]{0,20}") {
        let input = format!("{body}\n");
        prop_assert!(dedent(&input).is_err());
    }
}

// =============================================================================
// Parser Properties
// =============================================================================

proptest! {
    /// Property: rendering a case and parsing it back yields the same case
    #[test]
    fn render_then_parse_preserves_case(case in case_strategy()) {
        let rendered = case.render();
        let suite = parse_suite(&rendered, Path::new("prop.test")).unwrap();
        prop_assert_eq!(suite.cases.len(), 1);
        prop_assert_eq!(&suite.cases[0], &case);
    }

    /// Property: file block contents survive exactly, including trailing blank lines
    #[test]
    fn file_blocks_keep_content(content in block()) {
        let case = TestCase {
            name: "files".to_string(),
            code: String::new(),
            files: BTreeMap::from([("data.src".to_string(), content.clone())]),
            expected_output: String::new(),
            annotations: Default::default(),
            line: 1,
        };
        let suite = parse_suite(&case.render(), Path::new("prop.test")).unwrap();
        prop_assert_eq!(suite.cases[0].files.get("data.src"), Some(&content));
    }

    /// Property: parsing never panics, whatever the input
    #[test]
    fn parser_never_panics(source in "(test|skip|repeat|expect|end|file|\t|    |[a-z ]|\n){0,60}") {
        let _ = parse_suite(&source, Path::new("prop.test"));
    }

    /// Property: parsing the same text twice gives the same result
    #[test]
    fn parsing_is_deterministic(cases in prop::collection::vec(case_strategy(), 1..4)) {
        let mut source = String::new();
        for (i, case) in cases.iter().enumerate() {
            let mut case = case.clone();
            case.name = format!("{}_{i}", case.name);
            source.push_str(&case.render());
        }
        let first = parse_suite(&source, Path::new("prop.test")).unwrap();
        let second = parse_suite(&source, Path::new("prop.test")).unwrap();
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// Comparison Properties
// =============================================================================

proptest! {
    /// Property: identical output always passes
    #[test]
    fn identical_output_passes(text in "[a-z \n]{0,40}") {
        prop_assert!(compare(&text, &text).is_pass());
    }

    /// Property: any difference fails and is marked in the diff
    #[test]
    fn different_output_fails(a in "[a-z\n]{0,20}", b in "[a-z\n]{0,20}") {
        prop_assume!(a != b);
        match compare(&a, &b) {
            Verdict::Fail(mismatch) => prop_assert!(mismatch.first_difference().is_some()),
            Verdict::Pass => prop_assert!(false, "{:?} and {:?} compared equal", a, b),
        }
    }
}
