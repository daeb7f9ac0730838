//! Suite runner and reporter.
//!
//! A [`Session`] is the explicit home of everything that outlives a single
//! test: the registry, the engine (and its mock store), the report sink, the
//! per-suite statistics and the accumulated [`RunStatus`]. Construct one per
//! process, or per top-level run when independent results are wanted.

use std::env;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::engine::Engine;
use crate::mock::MockFailurePolicy;
use crate::output::Output;
use crate::registry::{CaseId, Registry, RegistrationOrder};
use crate::report;
use crate::result::{RunStatus, RunSummary, SuiteStats, SuiteSummary, TestResult};

/// Configuration for the runner.
#[derive(Clone, Debug, Default)]
pub struct RunnerConfig {
    /// Stop a run after the first failed test.
    pub fail_fast: bool,
    /// Print every test and the totals in the final report.
    pub detailed: bool,
    /// How mock failures reach the running test.
    pub mock_policy: MockFailurePolicy,
    /// Case order used by registries the CLI builds.
    pub order: RegistrationOrder,
    /// Printed as `RunID: <id>` before the project line.
    pub run_id: Option<String>,
    /// A filter that matches no test fails the run.
    pub require_match: bool,
}

impl RunnerConfig {
    /// Defaults overridden by `KTEST_FAIL_FAST`, `KTEST_DETAILED` and `KTEST_RUNID`.
    pub fn from_env() -> Self {
        let mut config = RunnerConfig::default();
        if env_flag("KTEST_FAIL_FAST") {
            config.fail_fast = true;
        }
        if env_flag("KTEST_DETAILED") {
            config.detailed = true;
        }
        if env_flag("KTEST_REQUIRE_MATCH") {
            config.require_match = true;
        }
        config.run_id = env::var("KTEST_RUNID").ok().filter(|id| !id.is_empty());
        config
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|value| matches!(value.as_str(), "1" | "true" | "yes" | "on"))
}

/// One process-wide test session.
pub struct Session {
    registry: Registry,
    engine: Engine,
    output: Output,
    config: RunnerConfig,
    status: RunStatus,
    suite_stats: FxHashMap<String, SuiteStats>,
    history: Vec<TestResult>,
}

impl Session {
    /// Session reporting to stdout.
    pub fn new(registry: Registry, config: RunnerConfig) -> Self {
        Session::with_output(registry, config, Output::Stdout)
    }

    pub fn with_output(registry: Registry, config: RunnerConfig, output: Output) -> Self {
        Session {
            registry,
            engine: Engine::with_mock_policy(config.mock_policy),
            output,
            config,
            status: RunStatus::Pass,
            suite_stats: FxHashMap::default(),
            history: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// For registering more cases between runs.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Accumulated status of every run so far.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn suite_stats(&self, suite: &str) -> SuiteStats {
        self.suite_stats.get(suite).copied().unwrap_or_default()
    }

    /// Every result of every run, in order.
    pub fn history(&self) -> &[TestResult] {
        &self.history
    }

    /// Run the cases matching `suite` and `case` (`None` matches anything).
    pub fn run_filtered(&mut self, suite: Option<&str>, case: Option<&str>) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::new();
        let ids = self.registry.filter_ids(suite, case);

        if ids.is_empty() {
            tracing::warn!(?suite, ?case, "no registered test matches the filter");
            self.output.println("No tests found!");
            if suite.is_some() || case.is_some() {
                self.output.println(&report::unmatched_filter(suite, case));
            }
            if self.config.require_match {
                self.status = RunStatus::Fail;
            }
            return summary;
        }

        for group in ids.chunk_by(|a, b| a.suite == b.suite) {
            let stop = self.run_suite_group(group, &mut summary);
            if stop {
                summary.stopped_early = true;
                break;
            }
        }

        self.status = self.status.merge(summary.failed);
        self.history.extend(summary.results().cloned());
        summary.duration = start.elapsed();
        tracing::info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "run finished"
        );
        summary
    }

    /// Run the cases of one suite. Returns whether fail-fast tripped.
    fn run_suite_group(&mut self, group: &[CaseId], summary: &mut RunSummary) -> bool {
        let Some(first) = group.first() else {
            return false;
        };
        let test_suite = self.registry.suite_at(first.suite);
        let name = test_suite.name().to_string();
        let mut suite_summary = SuiteSummary::new(&name);

        if !test_suite.should_run() {
            tracing::info!(suite = %name, "suite predicate declined to run");
            self.output.println(&report::suite_skipped(&name));
            self.suite_stats.entry(name).or_default().skip_count += 1;
            suite_summary.predicate_skipped = true;
            summary.add_suite(suite_summary);
            return false;
        }

        let _span = tracing::info_span!("suite", suite = %name).entered();
        self.output.println(&report::suite_start(&name));
        self.output.println(report::SEPARATOR);

        let mut stop = false;
        for &id in group {
            let result = self.engine.run_one(self.registry.case(id), &self.output);
            self.registry.case_mut(id).set_result(result.outcome.clone());
            let failed = result.outcome.is_failed();
            suite_summary.add_result(result);

            if failed && self.config.fail_fast {
                tracing::info!(suite = %name, "fail-fast: stopping run");
                stop = true;
                break;
            }
        }

        self.output
            .println(&report::suite_end(&name, suite_summary.has_failures()));

        let stats = self.suite_stats.entry(name).or_default();
        stats.run_count += 1;
        if suite_summary.has_failures() {
            stats.fail_count += 1;
        }

        summary.add_suite(suite_summary);
        stop
    }

    /// Print the closing report and return the accumulated status.
    pub fn final_report(&self) -> RunStatus {
        if self.config.detailed {
            for line in report::detailed(&self.history) {
                self.output.println(&line);
            }
        }
        self.output.println(report::SEPARATOR);
        if let Some(id) = &self.config.run_id {
            self.output.println(&report::run_id(id));
        }
        self.output
            .println(&report::project_execution(self.status));
        self.status
    }

    /// Process exit status for the accumulated status.
    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

#[cfg(test)]
mod tests;
