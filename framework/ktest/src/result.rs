//! Test result types.

use std::fmt;
use std::time::Duration;

/// Outcome of a single test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestOutcome {
    /// Test passed successfully.
    Passed,
    /// Test failed with the reason that was logged.
    Failed(String),
    /// Test was skipped.
    Skipped,
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TestOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TestOutcome::Skipped)
    }

    /// Report tag: `PASS`, `FAIL` or `SKIP`.
    pub fn tag(&self) -> &'static str {
        match self {
            TestOutcome::Passed => "PASS",
            TestOutcome::Failed(_) => "FAIL",
            TestOutcome::Skipped => "SKIP",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result of running a single test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub outcome: TestOutcome,
    /// Time taken by setup, body, teardown and mock cleanup together.
    pub duration: Duration,
}

impl TestResult {
    pub fn new(suite: &str, name: &str, outcome: TestOutcome, duration: Duration) -> Self {
        TestResult {
            suite: suite.to_string(),
            name: name.to_string(),
            outcome,
            duration,
        }
    }

    /// `test_<suite>_<case>`, the name used in report lines.
    pub fn label(&self) -> String {
        crate::report::test_label(&self.suite, &self.name)
    }
}

/// Results for one suite within one `run_filtered` call.
#[derive(Clone, Debug, Default)]
pub struct SuiteSummary {
    pub name: String,
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Whether the suite predicate kept this suite from running.
    pub predicate_skipped: bool,
    pub duration: Duration,
}

impl SuiteSummary {
    pub fn new(name: &str) -> Self {
        SuiteSummary {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_result(&mut self, result: TestResult) {
        match &result.outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed(_) => self.failed += 1,
            TestOutcome::Skipped => self.skipped += 1,
        }
        self.duration += result.duration;
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Summary of one `run_filtered` call.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub suites: Vec<SuiteSummary>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Set when fail-fast ended the run before every matching test ran.
    pub stopped_early: bool,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new() -> Self {
        RunSummary::default()
    }

    pub fn add_suite(&mut self, summary: SuiteSummary) {
        self.passed += summary.passed;
        self.failed += summary.failed;
        self.skipped += summary.skipped;
        self.duration += summary.duration;
        self.suites.push(summary);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Every result in run order.
    pub fn results(&self) -> impl Iterator<Item = &TestResult> + '_ {
        self.suites.iter().flat_map(|suite| suite.results.iter())
    }
}

/// Per-suite counters kept for the lifetime of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuiteStats {
    /// Times the suite ran.
    pub run_count: u32,
    /// Times the suite predicate skipped it.
    pub skip_count: u32,
    /// Times a run of the suite had at least one failed test.
    pub fail_count: u32,
}

/// Accumulated status of every run in the session. Only ever moves to `Fail`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunStatus {
    #[default]
    Pass,
    Fail,
}

impl RunStatus {
    /// Fold one more run's failure count in.
    #[must_use]
    pub fn merge(self, failed: usize) -> RunStatus {
        if self == RunStatus::Fail || failed > 0 {
            RunStatus::Fail
        } else {
            RunStatus::Pass
        }
    }

    /// Process exit status: 0 = all pass, 1 = something failed.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Pass => 0,
            RunStatus::Fail => 1,
        }
    }
}
