//! Mocking support for stub functions.
//!
//! A test registers what a stub should receive and return; the stub consumes
//! those entries when the code under test calls it:
//!
//! ```text
//! fn read_sensor(channel: usize) -> usize {
//!     ktest::mock::check_expected_value("read_sensor", "channel", channel);
//!     ktest::mock::get_return_value("read_sensor")
//! }
//!
//! fn reads_channel_three() {
//!     ktest::mock::expect_value("read_sensor", "channel", 3);
//!     ktest::mock::returns_value("read_sensor", 42);
//!     kassert_eq!(read_sensor(3), 42);
//! }
//! ```
//!
//! The functions here act on the [`MockStore`] the engine activated for the
//! running test. The store is thread-local and unlocked: stubs called from a
//! thread the test body spawned find no running test. Failures go through
//! the store's [`MockFailurePolicy`]: abort fails the test on the spot, defer
//! records the failure and lets the engine fail the test after teardown.

mod error;
mod store;

use std::cell::RefCell;

pub use error::{LeakKind, MockError};
pub use store::{LeakStatus, MockFailurePolicy, MockKey, MockStore};

use crate::signal;

thread_local! {
    static ACTIVE: RefCell<Option<MockStore>> = const { RefCell::new(None) };
}

/// Scope during which a store serves the free functions of this module.
///
/// Activation nests: the store active before [`MockScope::activate`] comes
/// back when the scope finishes or is dropped.
pub struct MockScope {
    previous: Option<MockStore>,
    finished: bool,
}

impl MockScope {
    pub fn activate(store: MockStore) -> Self {
        let previous = ACTIVE.with(|active| active.replace(Some(store)));
        MockScope {
            previous,
            finished: false,
        }
    }

    /// End the scope and hand the store back.
    pub fn finish(mut self) -> MockStore {
        self.finished = true;
        let previous = self.previous.take();
        ACTIVE
            .with(|active| active.replace(previous))
            .unwrap_or_default()
    }
}

impl Drop for MockScope {
    fn drop(&mut self) {
        if !self.finished {
            let previous = self.previous.take();
            ACTIVE.with(|active| active.replace(previous));
        }
    }
}

/// Whether a store is active on this thread.
pub fn is_active() -> bool {
    ACTIVE.with(|active| active.borrow().is_some())
}

fn with_active<R>(call: &'static str, f: impl FnOnce(&mut MockStore) -> R) -> R {
    let result = ACTIVE.with(|active| active.borrow_mut().as_mut().map(f));
    match result {
        Some(result) => result,
        None => panic!("ktest: {}", MockError::NoActiveTest { call }),
    }
}

/// Run a fallible store operation and apply the failure policy.
///
/// Returns `None` when a failure was deferred. The store borrow ends before
/// any signal is raised.
fn settle<T>(
    call: &'static str,
    op: impl FnOnce(&mut MockStore) -> Result<T, MockError>,
) -> Option<T> {
    let outcome = with_active(call, |store| match op(store) {
        Ok(value) => Ok(value),
        Err(error) if store.policy() == MockFailurePolicy::DeferToEnd => {
            store.record_failure(error);
            Err(None)
        }
        Err(error) => Err(Some(error)),
    });
    match outcome {
        Ok(value) => Some(value),
        Err(None) => None,
        Err(Some(error)) => signal::fail(error.to_string()),
    }
}

/// Tell `function` to expect `value` for `param`.
pub fn expect_value(function: &str, param: &str, value: usize) {
    with_active("expect_value", |store| {
        store.expect_value(function, param, value);
    });
}

/// Check `actual` against the oldest expectation for `(function, param)`.
///
/// Returns `false` only under the defer policy; under abort a mismatch never
/// returns.
pub fn check_expected_value(function: &str, param: &str, actual: usize) -> bool {
    settle("check_expected_value", |store| {
        store.check_expected_value(function, param, actual)
    })
    .is_some()
}

/// Tell `function` to expect the bytes of `data` (`None` = null) for `param`.
pub fn expect_data(function: &str, param: &str, data: Option<&[u8]>) {
    with_active("expect_data", |store| {
        store.expect_data(function, param, data);
    });
}

/// Check `data` against the oldest data expectation for `(function, param)`.
pub fn check_expected_data(function: &str, param: &str, data: Option<&[u8]>) -> bool {
    settle("check_expected_data", |store| {
        store.check_expected_data(function, param, data)
    })
    .is_some()
}

/// Queue `value` as the next return value of `function`.
pub fn returns_value(function: &str, value: usize) {
    with_active("returns_value", |store| store.returns_value(function, value));
}

/// Next queued return value of `function`; 0 when a failure was deferred.
pub fn get_return_value(function: &str) -> usize {
    settle("get_return_value", |store| store.get_return_value(function)).unwrap_or_default()
}

/// Queue `data` to be copied out through `param` of `function`.
pub fn return_data(function: &str, param: &str, data: &[u8]) {
    with_active("return_data", |store| {
        store.return_data(function, param, data);
    });
}

/// Copy the next queued data for `(function, param)` into `destination`.
pub fn copy_return_data(function: &str, param: &str, destination: Option<&mut [u8]>) -> bool {
    settle("copy_return_data", |store| {
        store.copy_return_data(function, param, destination)
    })
    .is_some()
}

/// Entries still queued in the active store.
pub fn pending() -> usize {
    with_active("pending", |store| store.pending())
}
