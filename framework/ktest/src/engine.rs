//! Isolation and execution engine.
//!
//! Runs one test case at a time:
//!
//! ```text
//! Setup ──► Test ──► Teardown ──► Framework
//!   │         │          ▲
//!   └─────────┴──────────┘  signal or fault: skip the rest, still tear down
//! ```
//!
//! Each phase runs under `catch_unwind`. A [`ControlSignal`] decides the
//! outcome directly; any other panic is a [`Fault`] and fails the test with
//! the phase it happened in. Teardown runs on every path. Afterwards the mock
//! store is cleaned, and leftovers fail a test that would otherwise pass.

use std::panic;
use std::time::Instant;

use crate::fault::{self, ArmedGuard, Fault};
use crate::mock::{LeakStatus, MockFailurePolicy, MockScope, MockStore};
use crate::output::Output;
use crate::phase::{Phase, PhaseGuard};
use crate::registry::{TestCase, TestFn};
use crate::report;
use crate::result::{TestOutcome, TestResult};
use crate::signal::ControlSignal;

/// How a single phase ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseEnd {
    /// The callback returned.
    Completed,
    Signal(ControlSignal),
    Fault(Fault),
}

impl PhaseEnd {
    /// Outcome when this ends setup or the body.
    fn outcome(self, completed: TestOutcome) -> TestOutcome {
        match self {
            PhaseEnd::Completed => completed,
            PhaseEnd::Signal(ControlSignal::Fail(reason)) => TestOutcome::Failed(reason),
            PhaseEnd::Signal(ControlSignal::Skip) => TestOutcome::Skipped,
            PhaseEnd::Signal(ControlSignal::Pass) => TestOutcome::Passed,
            PhaseEnd::Fault(fault) => TestOutcome::Failed(fault.to_string()),
        }
    }

    /// Line to log for this ending, if any.
    fn log_line(&self) -> Option<String> {
        match self {
            PhaseEnd::Signal(ControlSignal::Fail(reason)) => Some(format!("    {reason}")),
            PhaseEnd::Fault(fault) => Some(format!("    {fault}")),
            PhaseEnd::Completed | PhaseEnd::Signal(ControlSignal::Skip | ControlSignal::Pass) => {
                None
            }
        }
    }
}

/// Run `callback` as `phase`, catching whatever it raises.
pub fn run_phase(phase: Phase, callback: TestFn) -> PhaseEnd {
    let guard = PhaseGuard::enter(phase);
    let result = panic::catch_unwind(callback);
    drop(guard);

    match result {
        Ok(()) => PhaseEnd::Completed,
        Err(payload) => match ControlSignal::from_payload(payload) {
            Ok(signal) => PhaseEnd::Signal(signal),
            Err(payload) => PhaseEnd::Fault(fault::fault_from_payload(&*payload, phase)),
        },
    }
}

/// Fold the teardown ending into the outcome of setup and body.
///
/// Failing teardown fails the test; skipping it turns a pass into a skip;
/// pass-now in teardown changes nothing.
pub fn merge_teardown(outcome: TestOutcome, teardown: PhaseEnd) -> TestOutcome {
    match teardown {
        PhaseEnd::Completed | PhaseEnd::Signal(ControlSignal::Pass) => outcome,
        PhaseEnd::Signal(ControlSignal::Skip) if outcome.is_passed() => TestOutcome::Skipped,
        PhaseEnd::Signal(ControlSignal::Skip) => outcome,
        ended @ (PhaseEnd::Signal(ControlSignal::Fail(_)) | PhaseEnd::Fault(_)) => {
            if outcome.is_failed() {
                outcome
            } else {
                ended.outcome(TestOutcome::Passed)
            }
        }
    }
}

/// Fold mock cleanup into the outcome.
///
/// Deferred mock failures fail anything not already failed. Leaked entries
/// fail a passing test; a skipped test keeps its skip.
pub fn apply_mock_cleanup(outcome: TestOutcome, status: &LeakStatus) -> TestOutcome {
    if let Some(error) = status.deferred_failures.first() {
        if outcome.is_failed() {
            return outcome;
        }
        return TestOutcome::Failed(error.to_string());
    }
    if outcome.is_passed() && !status.leak_kinds().is_empty() {
        return TestOutcome::Failed(status.leak_reason());
    }
    outcome
}

/// Runs test cases one at a time, owning the mock store between tests.
pub struct Engine {
    mocks: MockStore,
}

impl Engine {
    pub fn new() -> Self {
        Engine::with_mock_policy(MockFailurePolicy::default())
    }

    pub fn with_mock_policy(policy: MockFailurePolicy) -> Self {
        fault::install_hook();
        Engine {
            mocks: MockStore::with_policy(policy),
        }
    }

    /// The store as left by the last test; always empty between tests.
    pub fn mocks(&self) -> &MockStore {
        &self.mocks
    }

    /// Run one test case and report it on `output`.
    #[tracing::instrument(level = "debug", skip_all, fields(suite = case.suite(), case = case.name()))]
    pub fn run_one(&mut self, case: &TestCase, output: &Output) -> TestResult {
        let _armed = ArmedGuard::arm();
        fault::clear_fault();

        let label = case.label();
        output.println(&report::test_start(&label));
        let start = Instant::now();

        let policy = self.mocks.policy();
        let scope = MockScope::activate(std::mem::replace(
            &mut self.mocks,
            MockStore::with_policy(policy),
        ));

        let setup = run_phase(Phase::Setup, case.setup());
        log_phase_end(output, &setup);
        let outcome = if setup == PhaseEnd::Completed {
            let body = run_phase(Phase::Test, case.body());
            log_phase_end(output, &body);
            body.outcome(TestOutcome::Passed)
        } else {
            setup.outcome(TestOutcome::Passed)
        };

        let teardown = run_phase(Phase::Teardown, case.teardown());
        log_phase_end(output, &teardown);
        let outcome = merge_teardown(outcome, teardown);

        self.mocks = scope.finish();
        let status = self.mocks.cleanup();
        for message in status.messages() {
            output.println(&format!("    {message}"));
        }
        let outcome = apply_mock_cleanup(outcome, &status);
        if outcome.is_failed() && !status.is_clean() {
            for kind in status.leak_kinds() {
                output.println(&format!("Test {label} failed: {kind}"));
            }
        }

        let result = TestResult::new(case.suite(), case.name(), outcome, start.elapsed());
        tracing::debug!(outcome = %result.outcome, duration = ?result.duration, "test finished");
        output.println(&report::test_end(&result));
        output.println(report::SEPARATOR);
        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

fn log_phase_end(output: &Output, end: &PhaseEnd) {
    if let Some(line) = end.log_line() {
        output.println(&line);
    }
}

#[cfg(test)]
mod tests;
