//! ktest: unit testing for embedded and kernel-style code.
//!
//! Tests are `fn()` callbacks grouped into named suites. The engine runs each
//! one isolated from the others: a failed assertion, an explicit skip, or a
//! fault (any panic) ends that test only, teardown always runs, and the mock
//! parameter store is emptied between tests.
//!
//! # Architecture
//!
//! ```text
//! register_test! / Registry::register
//!     │
//!     ▼
//! Registry ──filter──► Session::run_filtered
//!                          │
//!                          ▼
//!                      Engine::run_one ◄──► mock (active MockStore)
//!                          │
//!                          ▼
//!                      TestResult ──► RunSummary ──► final_report
//! ```
//!
//! # Example
//!
//! ```text
//! use ktest::{kassert_eq, register_test};
//!
//! fn adds() {
//!     kassert_eq!(1 + 1, 2);
//! }
//! register_test!(math, add, adds);
//!
//! fn main() -> std::process::ExitCode {
//!     ktest::cli::main()
//! }
//! ```

pub mod assert;
pub mod cli;
pub mod engine;
pub mod fault;
pub mod mock;
pub mod output;
pub mod phase;
pub mod registry;
pub mod report;
pub mod result;
pub mod runner;
pub mod signal;

use std::sync::Once;

#[doc(hidden)]
pub use linkme as __linkme;

// Re-exports for convenience
pub use engine::Engine;
pub use mock::{MockFailurePolicy, MockStore};
pub use output::Output;
pub use phase::Phase;
pub use registry::{noop, RegistrationOrder, Registry, TestCase, TestFn, TestSuite};
pub use result::{RunStatus, RunSummary, SuiteStats, TestOutcome, TestResult};
pub use runner::{RunnerConfig, Session};
pub use signal::{fail, pass, skip, ControlSignal};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=ktest=debug` or `RUST_LOG=ktest=trace`; output goes
/// to stderr so the report on stdout stays clean.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let layer = tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_writer(std::io::stderr);
            // Another subscriber may already be installed by the host binary.
            let _ = tracing_subscriber::registry()
                .with(layer)
                .with(filter)
                .try_init();
        }
    });
}
