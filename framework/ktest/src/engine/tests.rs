use super::*;
use crate::mock;
use std::cell::{Cell, RefCell};

thread_local! {
    static TRACE: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    static TEARDOWNS: Cell<u32> = const { Cell::new(0) };
}

fn trace(step: &'static str) {
    TRACE.with(|trace| trace.borrow_mut().push(step));
}

fn take_trace() -> Vec<&'static str> {
    TRACE.with(|trace| std::mem::take(&mut *trace.borrow_mut()))
}

fn setup() {
    trace("setup");
}

fn teardown() {
    trace("teardown");
    TEARDOWNS.with(|count| count.set(count.get() + 1));
}

fn passes() {
    trace("body");
}

fn fails() {
    trace("body");
    crate::kassert_eq!(1 + 1, 3);
    trace("after assertion");
}

fn skips() {
    trace("body");
    crate::signal::skip();
}

fn passes_early() {
    trace("body");
    crate::signal::pass();
}

fn faults() {
    trace("body");
    let empty: Vec<u8> = Vec::new();
    std::hint::black_box(empty[1]);
}

fn setup_fails() {
    trace("setup");
    crate::signal::fail("no device");
}

fn teardown_fails() {
    trace("teardown");
    crate::signal::fail("cleanup failed");
}

fn teardown_skips() {
    trace("teardown");
    crate::signal::skip();
}

fn leaks_expectation() {
    mock::expect_value("read_sensor", "channel", 1);
}

fn leaks_then_skips() {
    mock::returns_value("read_sensor", 1);
    crate::signal::skip();
}

fn checks_unregistered_parameter() {
    mock::check_expected_value("foo", "x", 5);
    trace("after check");
}

fn misses_return_value() {
    let _ = mock::get_return_value("read_sensor");
    trace("after lookup");
}

fn run(case: TestCase) -> (TestResult, Vec<String>) {
    let mut engine = Engine::new();
    let output = Output::buffer();
    let result = engine.run_one(&case, &output);
    (result, output.captured_lines())
}

fn case(body: TestFn) -> TestCase {
    TestCase::new("engine", "case", body).with_fixture(setup, teardown)
}

#[test]
fn test_pass_runs_every_phase() {
    let (result, lines) = run(case(passes));

    assert_eq!(result.outcome, TestOutcome::Passed);
    assert_eq!(take_trace(), ["setup", "body", "teardown"]);
    assert_eq!(
        lines,
        [
            "START - test_engine_case",
            "test_engine_case ... PASS",
            report::SEPARATOR,
        ]
    );
}

#[test]
fn test_failed_assertion_stops_body_and_tears_down() {
    let (result, lines) = run(case(fails));

    let TestOutcome::Failed(reason) = &result.outcome else {
        panic!("expected a failure, got {:?}", result.outcome);
    };
    assert!(reason.contains("1 + 1 == 3"), "{reason}");
    assert_eq!(take_trace(), ["setup", "body", "teardown"]);
    assert!(lines.contains(&format!("    {reason}")));
    assert_eq!(lines[lines.len() - 2], "test_engine_case ... FAIL");
}

#[test]
fn test_skip_still_tears_down() {
    let (result, _) = run(case(skips));

    assert_eq!(result.outcome, TestOutcome::Skipped);
    assert_eq!(take_trace(), ["setup", "body", "teardown"]);
}

#[test]
fn test_pass_now_ends_body_as_passed() {
    let (result, _) = run(case(passes_early));

    assert_eq!(result.outcome, TestOutcome::Passed);
    assert_eq!(take_trace(), ["setup", "body", "teardown"]);
}

#[test]
fn test_fault_fails_with_phase() {
    let (result, lines) = run(case(faults));

    let TestOutcome::Failed(reason) = &result.outcome else {
        panic!("expected a failure, got {:?}", result.outcome);
    };
    assert!(reason.contains("index out of bounds"), "{reason}");
    assert!(reason.contains("at unit test function"), "{reason}");
    assert!(lines.iter().any(|line| line.contains("unit test function")));
    assert_eq!(take_trace(), ["setup", "body", "teardown"]);
}

#[test]
fn test_failed_setup_skips_body() {
    let (result, _) =
        run(TestCase::new("engine", "case", passes).with_fixture(setup_fails, teardown));

    assert_eq!(result.outcome, TestOutcome::Failed("no device".into()));
    assert_eq!(take_trace(), ["setup", "teardown"]);
}

#[test]
fn test_failed_teardown_fails_passing_test() {
    let (result, _) =
        run(TestCase::new("engine", "case", passes).with_fixture(setup, teardown_fails));

    assert_eq!(result.outcome, TestOutcome::Failed("cleanup failed".into()));
    assert_eq!(take_trace(), ["setup", "body", "teardown"]);
}

#[test]
fn test_merge_teardown() {
    let failed = TestOutcome::Failed("body".into());
    let teardown_fail = || PhaseEnd::Signal(ControlSignal::Fail("teardown".into()));

    assert_eq!(
        merge_teardown(TestOutcome::Passed, PhaseEnd::Completed),
        TestOutcome::Passed
    );
    assert_eq!(
        merge_teardown(TestOutcome::Passed, PhaseEnd::Signal(ControlSignal::Skip)),
        TestOutcome::Skipped
    );
    assert_eq!(
        merge_teardown(failed.clone(), PhaseEnd::Signal(ControlSignal::Skip)),
        failed
    );
    assert_eq!(merge_teardown(failed.clone(), teardown_fail()), failed);
    assert_eq!(
        merge_teardown(TestOutcome::Skipped, teardown_fail()),
        TestOutcome::Failed("teardown".into())
    );
    assert_eq!(
        merge_teardown(TestOutcome::Skipped, PhaseEnd::Signal(ControlSignal::Pass)),
        TestOutcome::Skipped
    );
}

#[test]
fn test_skip_in_teardown_turns_pass_into_skip() {
    let (result, _) =
        run(TestCase::new("engine", "case", passes).with_fixture(setup, teardown_skips));

    assert_eq!(result.outcome, TestOutcome::Skipped);
}

#[test]
fn test_leaked_expectation_fails_passing_test() {
    let mut engine = Engine::new();
    let output = Output::buffer();
    let result = engine.run_one(&TestCase::new("engine", "leak", leaks_expectation), &output);

    assert_eq!(
        result.outcome,
        TestOutcome::Failed("Unused mock parameter values".into())
    );
    let lines = output.captured_lines();
    assert!(lines.contains(&"    Parameter not used by mock: read_sensor:channel".to_string()));
    assert!(lines.contains(&"Test test_engine_leak failed: Unused mock parameter values".to_string()));
    assert!(engine.mocks().is_empty());
}

#[test]
fn test_leak_after_skip_stays_skip() {
    let (result, lines) = run(TestCase::new("engine", "case", leaks_then_skips));

    assert_eq!(result.outcome, TestOutcome::Skipped);
    assert!(lines.contains(&"    Return value not used by mock: read_sensor".to_string()));
}

#[test]
fn test_store_is_clean_between_tests() {
    let mut engine = Engine::new();
    let output = Output::Silent;

    engine.run_one(&TestCase::new("engine", "leak", leaks_expectation), &output);
    let result = engine.run_one(&TestCase::new("engine", "case", passes), &output);

    assert_eq!(result.outcome, TestOutcome::Passed);
    assert_eq!(engine.mocks().pending(), 0);
    assert!(!mock::is_active());
    take_trace();
}

#[test]
fn test_missing_return_value_aborts_by_default() {
    let (result, _) = run(TestCase::new("engine", "case", misses_return_value));

    assert_eq!(
        result.outcome,
        TestOutcome::Failed("Failed to find return value for function read_sensor".into())
    );
    assert!(take_trace().is_empty());
}

#[test]
fn test_deferred_mock_failure_fails_after_teardown() {
    let mut engine = Engine::with_mock_policy(MockFailurePolicy::DeferToEnd);
    let output = Output::buffer();
    let result = engine.run_one(
        &TestCase::new("engine", "case", misses_return_value).with_fixture(setup, teardown),
        &output,
    );

    assert_eq!(
        result.outcome,
        TestOutcome::Failed("Failed to find return value for function read_sensor".into())
    );
    assert_eq!(take_trace(), ["setup", "after lookup", "teardown"]);
    assert_eq!(engine.mocks().policy(), MockFailurePolicy::DeferToEnd);
}

#[test]
fn test_rerun_gives_same_outcome() {
    let mut engine = Engine::new();
    let output = Output::Silent;
    let case = case(fails);

    let first = engine.run_one(&case, &output);
    let second = engine.run_one(&case, &output);

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(TEARDOWNS.with(Cell::get), 2);
    take_trace();
}

#[test]
fn test_apply_mock_cleanup_keeps_existing_failure() {
    let status = LeakStatus {
        unused_parameters: vec![mock::MockKey::new("f", "p")],
        ..LeakStatus::default()
    };
    let failed = TestOutcome::Failed("body".into());

    assert_eq!(apply_mock_cleanup(failed.clone(), &status), failed);
    assert_eq!(
        apply_mock_cleanup(TestOutcome::Skipped, &status),
        TestOutcome::Skipped
    );
}

#[test]
fn test_check_without_expectation_fails_and_leaves_store_empty() {
    let mut engine = Engine::new();
    let output = Output::buffer();
    let result = engine.run_one(
        &TestCase::new("engine", "unregistered", checks_unregistered_parameter),
        &output,
    );

    assert_eq!(
        result.outcome,
        TestOutcome::Failed("Failed to find parameter x for foo".into())
    );
    assert_eq!(engine.mocks().pending(), 0);
    assert!(take_trace().is_empty());
    assert!(output
        .captured_lines()
        .contains(&"    Failed to find parameter x for foo".to_string()));
}
