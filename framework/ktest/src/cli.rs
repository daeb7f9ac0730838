//! Command-line entry point for test binaries.
//!
//! A test binary registers its cases with [`register_test!`](crate::register_test)
//! and hands control to [`main`]:
//!
//! ```text
//! fn main() -> std::process::ExitCode {
//!     ktest::cli::main()
//! }
//! ```
//!
//! ```text
//! usage: <binary> [options] [SUITE [CASE]]
//! ```

use std::process::ExitCode;

use crate::mock::MockFailurePolicy;
use crate::registry::{RegistrationOrder, Registry};
use crate::runner::{RunnerConfig, Session};

const USAGE: &str = "\
Usage: <test-binary> [options] [SUITE [CASE]]

Runs every registered test, or only those of SUITE (and CASE).

Options:
  --suite=<name>           Only run this suite
  --case=<name>            Only run cases with this name
  --fail-fast              Stop after the first failing test
  -v, --detailed           Print every test and totals at the end
  --require-match          Fail when the filter matches no test
  --reverse                Run cases of a suite newest first
  --defer-mock-failures    Fail on mock mismatches after teardown instead of at once
  --run-id=<id>            Print `RunID: <id>` in the final report
  -h, --help               Show this help

Environment:
  KTEST_FAIL_FAST, KTEST_DETAILED, KTEST_RUNID,
  KTEST_REQUIRE_MATCH                            defaults for the options above
  RUST_LOG                                       tracing filter (logs go to stderr)";

/// Bad command line.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CliError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("option `{0}` needs a value")]
    MissingValue(&'static str),
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    #[error("empty {0} filter")]
    EmptyFilter(&'static str),
    #[error("{0} filter given twice")]
    DuplicateFilter(&'static str),
}

/// Parsed command line.
#[derive(Clone, Debug, Default)]
pub struct CliArgs {
    pub suite: Option<String>,
    pub case: Option<String>,
    pub config: RunnerConfig,
    pub help: bool,
}

/// Parse `args` (without the program name) on top of `config`.
pub fn parse_args<I>(args: I, config: RunnerConfig) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs {
        config,
        ..CliArgs::default()
    };
    let mut positional = 0usize;

    for arg in args {
        if let Some(suite) = arg.strip_prefix("--suite=") {
            set_filter(&mut parsed.suite, suite, "suite")?;
        } else if let Some(case) = arg.strip_prefix("--case=") {
            set_filter(&mut parsed.case, case, "case")?;
        } else if let Some(id) = arg.strip_prefix("--run-id=") {
            if id.is_empty() {
                return Err(CliError::MissingValue("--run-id"));
            }
            parsed.config.run_id = Some(id.to_string());
        } else if arg == "--fail-fast" {
            parsed.config.fail_fast = true;
        } else if arg == "--detailed" || arg == "-v" {
            parsed.config.detailed = true;
        } else if arg == "--require-match" {
            parsed.config.require_match = true;
        } else if arg == "--reverse" {
            parsed.config.order = RegistrationOrder::Reverse;
        } else if arg == "--defer-mock-failures" {
            parsed.config.mock_policy = MockFailurePolicy::DeferToEnd;
        } else if arg == "--help" || arg == "-h" {
            parsed.help = true;
        } else if arg.starts_with('-') {
            return Err(CliError::UnknownOption(arg));
        } else {
            match positional {
                0 => set_filter(&mut parsed.suite, &arg, "suite")?,
                1 => set_filter(&mut parsed.case, &arg, "case")?,
                _ => return Err(CliError::UnexpectedArgument(arg)),
            }
            positional += 1;
        }
    }

    Ok(parsed)
}

fn set_filter(slot: &mut Option<String>, value: &str, what: &'static str) -> Result<(), CliError> {
    if value.is_empty() {
        return Err(CliError::EmptyFilter(what));
    }
    if slot.is_some() {
        return Err(CliError::DuplicateFilter(what));
    }
    *slot = Some(value.to_string());
    Ok(())
}

/// Run the statically registered tests as the command line asks.
///
/// Returns the process exit status: 0 when everything passed, 1 when a test
/// failed or the command line was bad.
pub fn run_with_args<I>(args: I) -> i32
where
    I: IntoIterator<Item = String>,
{
    crate::init_tracing();

    let args = match parse_args(args, RunnerConfig::from_env()) {
        Ok(args) => args,
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!();
            eprintln!("{USAGE}");
            return 1;
        }
    };
    if args.help {
        println!("{USAGE}");
        return 0;
    }

    let registry = Registry::from_registered(args.config.order);
    let mut session = Session::new(registry, args.config);
    session.run_filtered(args.suite.as_deref(), args.case.as_deref());
    session.final_report();
    session.exit_code()
}

/// [`run_with_args`] on the process arguments.
pub fn main() -> ExitCode {
    let code = run_with_args(std::env::args().skip(1));
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
