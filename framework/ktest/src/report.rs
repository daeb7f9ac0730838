//! Report line formats.
//!
//! ```text
//! Running test suite math
//! ===================================================================
//! START - test_math_add
//! test_math_add ... PASS
//! ===================================================================
//! Test suite math succeeded
//! ===================================================================
//! PROJECT EXECUTION SUCCESSFUL
//! ```
//!
//! Everything here builds strings; writing them is the caller's job.

use crate::result::{RunStatus, TestOutcome, TestResult};

/// Separator printed after each test and before the project line.
pub const SEPARATOR: &str =
    "===================================================================";

/// Report name of a test case: `test_<suite>_<case>`.
pub fn test_label(suite: &str, name: &str) -> String {
    format!("test_{suite}_{name}")
}

pub fn test_start(label: &str) -> String {
    format!("START - {label}")
}

/// `test_<suite>_<case> ... <TAG>`.
pub fn test_end(result: &TestResult) -> String {
    format!("{} ... {}", result.label(), result.outcome.tag())
}

pub fn suite_start(name: &str) -> String {
    format!("Running test suite {name}")
}

pub fn suite_end(name: &str, failed: bool) -> String {
    if failed {
        format!("Test suite {name} failed.")
    } else {
        format!("Test suite {name} succeeded")
    }
}

pub fn suite_skipped(name: &str) -> String {
    format!("Skipping test suite {name}")
}

/// Hint naming a filter that matched nothing; `*` stands for "any".
pub fn unmatched_filter(suite: Option<&str>, case: Option<&str>) -> String {
    format!(
        "    no test matches suite `{}` case `{}`",
        suite.unwrap_or("*"),
        case.unwrap_or("*")
    )
}

pub fn run_id(id: &str) -> String {
    format!("RunID: {id}")
}

/// `PROJECT EXECUTION SUCCESSFUL` or `PROJECT EXECUTION FAILED`.
pub fn project_execution(status: RunStatus) -> String {
    let verdict = match status {
        RunStatus::Pass => "SUCCESSFUL",
        RunStatus::Fail => "FAILED",
    };
    format!("PROJECT EXECUTION {verdict}")
}

/// Detailed table: one row per test plus totals.
pub fn detailed<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Vec<String> {
    let mut lines = vec!["Test Summary:".to_string()];
    let (mut passed, mut failed, mut skipped) = (0usize, 0usize, 0usize);

    for result in results {
        match result.outcome {
            TestOutcome::Passed => passed += 1,
            TestOutcome::Failed(_) => failed += 1,
            TestOutcome::Skipped => skipped += 1,
        }
        lines.push(format!(
            "  {}: {} ({:.2?})",
            result.outcome.tag(),
            result.label(),
            result.duration
        ));
    }

    lines.push(format!(
        "  {passed} passed, {failed} failed, {skipped} skipped ({} total)",
        passed + failed + skipped
    ));
    lines
}
