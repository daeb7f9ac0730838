//! Fault isolation.
//!
//! A fault is any panic that is not a [`ControlSignal`](crate::signal::ControlSignal):
//! an out-of-bounds index, an `unwrap` on `None`, a std `assert!`. The engine
//! runs each phase under `catch_unwind`; this module supplies the process-wide
//! panic hook that records what faulted, where, and in which [`Phase`].
//!
//! The hook only acts on threads that are *armed*, meaning they are inside
//! [`Engine::run_one`](crate::engine::Engine::run_one). Every other panic is
//! passed to the hook that was installed before ours, so `cargo test` and the
//! host application keep their normal panic reporting.
//!
//! # Platform boundary
//!
//! Only unwinding panics are observable. Hardware faults raised from `unsafe`
//! code (SIGSEGV, SIGBUS) and builds with `panic = "abort"` terminate the
//! process; isolating those needs a supervising parent process.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic;
use std::sync::Once;

use crate::phase::Phase;

static HOOK_INIT: Once = Once::new();

thread_local! {
    /// Nesting depth of `run_one` calls on this thread.
    static ARMED_DEPTH: Cell<u32> = const { Cell::new(0) };

    /// Fault recorded by the hook, waiting for the engine to pick it up.
    static LAST_FAULT: RefCell<Option<Fault>> = const { RefCell::new(None) };
}

/// An abnormal termination caught inside a test phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub phase: Phase,
    pub message: String,
    /// `file:line` of the panic, when the hook saw it.
    pub location: Option<String>,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} function", self.message, self.phase)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

/// What the hook does with a panic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultDisposition {
    /// Not ours: hand over to the previously installed hook.
    Chain,
    /// Record it; the engine turns it into a failed test.
    Recover,
    /// The engine itself faulted. Print a crash notice and exit.
    Crash,
}

/// Decide how a panic on a thread in `phase` is handled.
pub fn classify(armed: bool, phase: Phase) -> FaultDisposition {
    match (armed, phase.is_test_phase()) {
        (false, _) => FaultDisposition::Chain,
        (true, true) => FaultDisposition::Recover,
        (true, false) => FaultDisposition::Crash,
    }
}

/// Install the fault hook. Safe to call any number of times.
pub fn install_hook() {
    HOOK_INIT.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let phase = Phase::current();
            let location = info
                .location()
                .map(|location| format!("{}:{}", location.file(), location.line()));
            match classify(is_armed(), phase) {
                FaultDisposition::Chain => previous(info),
                FaultDisposition::Recover => {
                    let fault = Fault {
                        phase,
                        message: payload_message(info.payload()),
                        location,
                    };
                    tracing::error!(%fault, "fault in test phase");
                    // The slot may already be gone during thread teardown.
                    let _ = LAST_FAULT.try_with(|slot| *slot.borrow_mut() = Some(fault));
                }
                FaultDisposition::Crash => {
                    let message = payload_message(info.payload());
                    tracing::error!(%message, ?location, "fault in framework code");
                    match location {
                        Some(location) => println!("    {message} ({location})"),
                        None => println!("    {message}"),
                    }
                    println!("Test suite crashed.");
                    std::process::exit(1);
                }
            }
        }));
    });
}

/// Whether the calling thread is inside `run_one`.
pub fn is_armed() -> bool {
    ARMED_DEPTH.with(Cell::get) > 0
}

/// Arms the calling thread for as long as it lives.
pub struct ArmedGuard {
    _private: (),
}

impl ArmedGuard {
    pub fn arm() -> Self {
        install_hook();
        ARMED_DEPTH.with(|depth| depth.set(depth.get() + 1));
        ArmedGuard { _private: () }
    }
}

impl Drop for ArmedGuard {
    fn drop(&mut self) {
        ARMED_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Best-effort text of a panic payload.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Drop any fault left over from an earlier test on this thread.
pub(crate) fn clear_fault() {
    LAST_FAULT.with(|slot| slot.borrow_mut().take());
}

/// Turn a caught non-signal payload into a [`Fault`].
///
/// Prefers what the hook recorded (it has the location); falls back to the
/// payload itself when another hook replaced ours.
pub(crate) fn fault_from_payload(payload: &(dyn Any + Send), phase: Phase) -> Fault {
    LAST_FAULT
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(|| Fault {
            phase,
            message: payload_message(payload),
            location: None,
        })
}

#[cfg(test)]
mod tests;
