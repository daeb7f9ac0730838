//! Execution phase of the running test.
//!
//! The phase only gives crash handling its context: a fault in `Setup`,
//! `Test` or `Teardown` fails one test, a fault in `Framework` means the
//! engine itself is broken. It is thread-local because tests run on the
//! thread that called the engine.
//!
//! Phases are entered through [`PhaseGuard`], which puts the thread back into
//! `Framework` when dropped, including while a signal or fault unwinds.

use std::cell::Cell;
use std::fmt;

thread_local! {
    static CURRENT_PHASE: Cell<Phase> = const { Cell::new(Phase::Framework) };
}

/// Which callback of the current test is executing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    Test,
    Teardown,
    /// Engine code between callbacks, or no test at all.
    #[default]
    Framework,
}

impl Phase {
    /// Phase of the calling thread.
    pub fn current() -> Phase {
        CURRENT_PHASE.with(Cell::get)
    }

    /// Whether a fault in this phase is a test failure rather than a crash.
    pub fn is_test_phase(self) -> bool {
        !matches!(self, Phase::Framework)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Setup => "setup",
            Phase::Test => "unit test",
            Phase::Teardown => "teardown",
            Phase::Framework => "framework",
        })
    }
}

/// RAII guard for one phase.
///
/// Phases never nest within a single test, so dropping always returns to
/// `Framework` rather than to whatever was current before.
pub struct PhaseGuard {
    phase: Phase,
}

impl PhaseGuard {
    /// Mark the calling thread as executing `phase`.
    pub fn enter(phase: Phase) -> Self {
        CURRENT_PHASE.with(|current| current.set(phase));
        tracing::trace!(%phase, "enter phase");
        PhaseGuard { phase }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        CURRENT_PHASE.with(|current| current.set(Phase::Framework));
    }
}
