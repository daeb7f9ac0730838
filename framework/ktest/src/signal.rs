//! Early-termination signals raised from inside a running test.
//!
//! A test phase can stop in three controlled ways: fail-now, skip-now and
//! pass-now. Each is a [`ControlSignal`] payload carried by stack unwinding
//! (`std::panic::resume_unwind`), so every frame between the raise point and
//! the engine is skipped, and the engine catches it exactly once per phase.
//!
//! `resume_unwind` does not invoke the panic hook, so signals never produce
//! panic noise; only genuine faults reach [`crate::fault`].

use std::any::Any;
use std::fmt;
use std::panic;

use crate::phase::Phase;

/// Controlled way for a test phase to end early.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlSignal {
    /// Failed assertion, failed mock check, or an explicit [`fail`].
    Fail(String),
    /// Explicit [`skip`].
    Skip,
    /// Explicit [`pass`], used when success means "reached a fault handler".
    Pass,
}

impl ControlSignal {
    /// Recover a signal from a `catch_unwind` payload.
    ///
    /// Returns the payload back when it is not a signal (an abnormal fault).
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Result<Self, Box<dyn Any + Send>> {
        payload.downcast::<ControlSignal>().map(|signal| *signal)
    }
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlSignal::Fail(reason) => write!(f, "fail: {reason}"),
            ControlSignal::Skip => f.write_str("skip"),
            ControlSignal::Pass => f.write_str("pass"),
        }
    }
}

/// Unwind to the engine with `signal`.
///
/// Outside a running test there is no engine to catch the signal, so this
/// turns into an ordinary panic that names the misuse.
pub fn raise(signal: ControlSignal) -> ! {
    if !crate::fault::is_armed() || Phase::current() == Phase::Framework {
        panic!("ktest: `{signal}` raised outside a running test");
    }
    panic::resume_unwind(Box::new(signal))
}

/// Fail the currently running test.
///
/// This is what the assertion macros and the mock checks call. The rest of the
/// current phase does not run; teardown still does.
#[cold]
pub fn fail(reason: impl Into<String>) -> ! {
    raise(ControlSignal::Fail(reason.into()))
}

/// Skip the currently running test. Teardown still runs.
#[cold]
pub fn skip() -> ! {
    raise(ControlSignal::Skip)
}

/// Pass the currently running test without returning from the body.
pub fn pass() -> ! {
    raise(ControlSignal::Pass)
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "tests panic on unexpected state")]
mod tests;
