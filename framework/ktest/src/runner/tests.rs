use super::*;
use crate::registry::noop;
use crate::result::TestOutcome;
use pretty_assertions::assert_eq;

fn passes() {}

fn fails() {
    crate::signal::fail("expected failure");
}

fn skips() {
    crate::signal::skip();
}

fn never() -> bool {
    false
}

fn session(config: RunnerConfig) -> Session {
    let mut registry = Registry::new();
    registry.register("math", "add", noop, passes, noop);
    registry.register("math", "sub", noop, fails, noop);
    registry.register("math", "div", noop, skips, noop);
    registry.register("io", "read", noop, passes, noop);
    Session::with_output(registry, config, Output::buffer())
}

#[test]
fn test_run_all_counts_and_status() {
    let mut session = session(RunnerConfig::default());
    let summary = session.run_filtered(None, None);

    assert_eq!(summary.passed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.suites.len(), 2);
    assert!(!summary.stopped_early);
    assert_eq!(session.status(), RunStatus::Fail);
    assert_eq!(session.exit_code(), 1);
}

#[test]
fn test_report_lines_for_one_suite() {
    let mut session = session(RunnerConfig::default());
    session.run_filtered(Some("io"), None);
    session.final_report();

    assert_eq!(
        session.output().captured_lines(),
        [
            "Running test suite io",
            report::SEPARATOR,
            "START - test_io_read",
            "test_io_read ... PASS",
            report::SEPARATOR,
            "Test suite io succeeded",
            report::SEPARATOR,
            "PROJECT EXECUTION SUCCESSFUL",
        ]
    );
    assert_eq!(session.exit_code(), 0);
}

#[test]
fn test_no_match_reports_nothing_found() {
    let mut session = session(RunnerConfig::default());
    let summary = session.run_filtered(Some("missing"), None);

    assert_eq!(summary.total(), 0);
    assert_eq!(
        session.output().captured_lines(),
        [
            "No tests found!",
            "    no test matches suite `missing` case `*`",
        ]
    );
    assert_eq!(session.status(), RunStatus::Pass);
}

#[test]
fn test_empty_registry_prints_no_filter_hint() {
    let mut session = Session::with_output(
        Registry::new(),
        RunnerConfig::default(),
        Output::buffer(),
    );
    session.run_filtered(None, None);

    assert_eq!(session.output().captured_lines(), ["No tests found!"]);
}

#[test]
fn test_require_match_fails_unmatched_filter() {
    let config = RunnerConfig {
        require_match: true,
        ..RunnerConfig::default()
    };
    let mut session = session(config);
    session.run_filtered(Some("math"), Some("nope"));

    assert_eq!(session.final_report(), RunStatus::Fail);
    assert_eq!(session.exit_code(), 1);
    assert_eq!(
        session.output().captured_lines().last().map(String::as_str),
        Some("PROJECT EXECUTION FAILED")
    );
}

#[test]
fn test_fail_fast_stops_after_first_failure() {
    let config = RunnerConfig {
        fail_fast: true,
        ..RunnerConfig::default()
    };
    let mut session = session(config);
    let summary = session.run_filtered(None, None);

    assert!(summary.stopped_early);
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.suites.len(), 1);
    assert!(session.history().iter().all(|result| result.suite == "math"));
}

#[test]
fn test_status_accumulates_across_runs() {
    let mut session = session(RunnerConfig::default());
    session.run_filtered(Some("math"), Some("sub"));
    session.run_filtered(Some("io"), None);

    assert_eq!(session.status(), RunStatus::Fail);
    assert_eq!(session.history().len(), 2);
    assert!(session
        .output()
        .captured()
        .ends_with("Test suite io succeeded\n"));
}

#[test]
fn test_results_are_stored_on_cases() {
    let mut session = session(RunnerConfig::default());
    session.run_filtered(Some("math"), None);

    let outcomes: Vec<_> = session
        .registry()
        .filter(Some("math"), None)
        .iter()
        .map(|case| case.result().map(TestOutcome::tag))
        .collect();
    assert_eq!(outcomes, [Some("PASS"), Some("FAIL"), Some("SKIP")]);
    assert_eq!(
        session.registry().suite("io").map(|suite| suite.cases()[0].result()),
        Some(None)
    );
}

#[test]
fn test_suite_stats() {
    let mut session = session(RunnerConfig::default());
    session.registry_mut().set_suite_predicate("io", never);
    session.run_filtered(None, None);
    session.run_filtered(Some("math"), Some("add"));

    assert_eq!(
        session.suite_stats("math"),
        SuiteStats {
            run_count: 2,
            skip_count: 0,
            fail_count: 1,
        }
    );
    assert_eq!(
        session.suite_stats("io"),
        SuiteStats {
            run_count: 0,
            skip_count: 1,
            fail_count: 0,
        }
    );
    assert_eq!(session.suite_stats("unknown"), SuiteStats::default());
}

#[test]
fn test_predicate_skips_suite() {
    let mut session = session(RunnerConfig::default());
    session.registry_mut().set_suite_predicate("io", never);
    let summary = session.run_filtered(Some("io"), None);

    assert_eq!(summary.total(), 0);
    assert!(summary.suites[0].predicate_skipped);
    assert_eq!(
        session.output().captured_lines(),
        ["Skipping test suite io"]
    );
}

#[test]
fn test_final_report_with_details_and_run_id() {
    let config = RunnerConfig {
        detailed: true,
        run_id: Some("ci-7".into()),
        ..RunnerConfig::default()
    };
    let mut session = session(config);
    session.run_filtered(Some("math"), Some("add"));
    session.output().clear();

    assert_eq!(session.final_report(), RunStatus::Pass);
    let lines = session.output().captured_lines();
    assert_eq!(lines[0], "Test Summary:");
    assert!(lines[1].starts_with("  PASS: test_math_add ("));
    assert_eq!(
        lines[2..].to_vec(),
        [
            "  1 passed, 0 failed, 0 skipped (1 total)",
            report::SEPARATOR,
            "RunID: ci-7",
            "PROJECT EXECUTION SUCCESSFUL",
        ]
    );
}

#[test]
fn test_cases_registered_between_runs() {
    let mut session = session(RunnerConfig::default());
    session.run_filtered(Some("io"), None);
    session
        .registry_mut()
        .register("io", "write", noop, passes, noop);
    let summary = session.run_filtered(Some("io"), None);

    assert_eq!(summary.passed, 2);
}
