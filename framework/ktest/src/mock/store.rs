//! Mock parameter store.
//!
//! Two FIFO queues of `(key, value)` entries:
//! - inputs: values a stub expects to receive (`expect_value`, `expect_data`)
//! - outputs: values a stub should hand back (`returns_value`, `return_data`)
//!
//! Lookup is by exact [`MockKey`]; the oldest matching entry is consumed, so a
//! stub called twice sees its expectations in registration order. Entries left
//! at the end of a test are leaks, reported by [`MockStore::cleanup`].

use std::collections::VecDeque;
use std::fmt;

use super::error::{LeakKind, MockError};

/// Which function (and parameter) an entry belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MockKey {
    pub function: String,
    /// Empty for return values, which are keyed by function only.
    pub param: String,
}

impl MockKey {
    pub fn new(function: &str, param: &str) -> Self {
        MockKey {
            function: function.to_string(),
            param: param.to_string(),
        }
    }

    fn matches(&self, function: &str, param: &str) -> bool {
        self.function == function && self.param == param
    }
}

impl fmt::Display for MockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.param.is_empty() {
            f.write_str(&self.function)
        } else {
            write!(f, "{}:{}", self.function, self.param)
        }
    }
}

/// Stored value: an opaque word or a byte buffer (`None` = null pointer).
#[derive(Clone, Debug, PartialEq, Eq)]
enum Payload {
    Value(usize),
    Data(Option<Vec<u8>>),
}

#[derive(Clone, Debug)]
struct MockParameter {
    key: MockKey,
    payload: Payload,
}

#[derive(Clone, Debug, Default)]
struct ParameterQueue {
    entries: VecDeque<MockParameter>,
}

impl ParameterQueue {
    fn insert(&mut self, key: MockKey, payload: Payload) {
        tracing::debug!(%key, "mock entry queued");
        self.entries.push_back(MockParameter { key, payload });
    }

    /// Remove and return the oldest entry for `(function, param)`.
    fn find_and_remove(&mut self, function: &str, param: &str) -> Option<Payload> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.key.matches(function, param))?;
        let entry = self.entries.remove(position)?;
        tracing::debug!(key = %entry.key, "mock entry consumed");
        Some(entry.payload)
    }

    fn drain_keys(&mut self) -> Vec<MockKey> {
        self.entries.drain(..).map(|entry| entry.key).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// How mock failures reach the running test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MockFailurePolicy {
    /// Fail the test immediately, like a failed assertion.
    #[default]
    AbortTest,
    /// Keep running; the engine fails the test after teardown.
    DeferToEnd,
}

/// What [`MockStore::cleanup`] found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeakStatus {
    /// Expectations no stub consumed.
    pub unused_parameters: Vec<MockKey>,
    /// Return values or data no stub consumed.
    pub unused_returns: Vec<MockKey>,
    /// Failures recorded under [`MockFailurePolicy::DeferToEnd`].
    pub deferred_failures: Vec<MockError>,
}

impl LeakStatus {
    /// No leaks and no deferred failures.
    pub fn is_clean(&self) -> bool {
        self.unused_parameters.is_empty()
            && self.unused_returns.is_empty()
            && self.deferred_failures.is_empty()
    }

    /// Leak kinds present, parameters first.
    pub fn leak_kinds(&self) -> Vec<LeakKind> {
        let mut kinds = Vec::new();
        if !self.unused_parameters.is_empty() {
            kinds.push(LeakKind::UnusedParameter);
        }
        if !self.unused_returns.is_empty() {
            kinds.push(LeakKind::UnusedReturnValue);
        }
        kinds
    }

    /// Report lines describing every problem, in the order found.
    pub fn messages(&self) -> Vec<String> {
        let parameters = self
            .unused_parameters
            .iter()
            .map(|key| format!("Parameter not used by mock: {key}"));
        let returns = self
            .unused_returns
            .iter()
            .map(|key| format!("Return value not used by mock: {key}"));
        let deferred = self.deferred_failures.iter().map(ToString::to_string);
        parameters.chain(returns).chain(deferred).collect()
    }

    /// One-line description of the leak kinds, e.g. for a failure reason.
    pub fn leak_reason(&self) -> String {
        self.leak_kinds()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// The two queues plus the failure policy.
#[derive(Clone, Debug, Default)]
pub struct MockStore {
    inputs: ParameterQueue,
    outputs: ParameterQueue,
    policy: MockFailurePolicy,
    deferred: Vec<MockError>,
}

impl MockStore {
    pub fn new() -> Self {
        MockStore::default()
    }

    pub fn with_policy(policy: MockFailurePolicy) -> Self {
        MockStore {
            policy,
            ..MockStore::default()
        }
    }

    pub fn policy(&self) -> MockFailurePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: MockFailurePolicy) {
        self.policy = policy;
    }

    /// Expect `value` for `param` on the next matching call of `function`.
    pub fn expect_value(&mut self, function: &str, param: &str, value: usize) {
        self.inputs
            .insert(MockKey::new(function, param), Payload::Value(value));
    }

    /// Consume the oldest expectation for `(function, param)` and compare.
    pub fn check_expected_value(
        &mut self,
        function: &str,
        param: &str,
        actual: usize,
    ) -> Result<(), MockError> {
        match self.take_input(function, param)? {
            Payload::Value(expected) if expected == actual => Ok(()),
            Payload::Value(expected) => Err(MockError::ValueMismatch {
                function: function.to_string(),
                param: param.to_string(),
                expected,
                actual,
            }),
            Payload::Data(_) => Err(MockError::KindMismatch {
                function: function.to_string(),
                param: param.to_string(),
                expected: "value",
                registered: "data",
            }),
        }
    }

    /// Expect the bytes of `data` (`None` = null) for `param`.
    pub fn expect_data(&mut self, function: &str, param: &str, data: Option<&[u8]>) {
        self.inputs.insert(
            MockKey::new(function, param),
            Payload::Data(data.map(<[u8]>::to_vec)),
        );
    }

    /// Consume the oldest expectation for `(function, param)` and compare bytes.
    pub fn check_expected_data(
        &mut self,
        function: &str,
        param: &str,
        actual: Option<&[u8]>,
    ) -> Result<(), MockError> {
        let expected = match self.take_input(function, param)? {
            Payload::Data(expected) => expected,
            Payload::Value(_) => {
                return Err(MockError::KindMismatch {
                    function: function.to_string(),
                    param: param.to_string(),
                    expected: "data",
                    registered: "value",
                })
            }
        };

        match (expected.as_deref(), actual) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(MockError::ExpectedNull {
                function: function.to_string(),
                param: param.to_string(),
            }),
            (Some(_), None) => Err(MockError::UnexpectedNull {
                function: function.to_string(),
                param: param.to_string(),
            }),
            (Some(expected), Some(actual)) if expected == actual => Ok(()),
            (Some(_), Some(_)) => Err(MockError::DataMismatch {
                function: function.to_string(),
                param: param.to_string(),
            }),
        }
    }

    /// Queue `value` as the next return value of `function`.
    pub fn returns_value(&mut self, function: &str, value: usize) {
        self.outputs
            .insert(MockKey::new(function, ""), Payload::Value(value));
    }

    /// Consume the oldest return value queued for `function`.
    pub fn get_return_value(&mut self, function: &str) -> Result<usize, MockError> {
        match self.outputs.find_and_remove(function, "") {
            Some(Payload::Value(value)) => Ok(value),
            Some(Payload::Data(_)) => Err(MockError::KindMismatch {
                function: function.to_string(),
                param: String::new(),
                expected: "value",
                registered: "data",
            }),
            None => Err(MockError::MissingReturnValue {
                function: function.to_string(),
            }),
        }
    }

    /// Queue `data` to be copied out through `param` by the next call.
    pub fn return_data(&mut self, function: &str, param: &str, data: &[u8]) {
        self.outputs.insert(
            MockKey::new(function, param),
            Payload::Data(Some(data.to_vec())),
        );
    }

    /// Copy the oldest queued data for `(function, param)` into `destination`.
    ///
    /// Copies as many bytes as both sides hold and zero-fills the rest of
    /// `destination`. On a missing entry `destination` is zeroed entirely.
    pub fn copy_return_data(
        &mut self,
        function: &str,
        param: &str,
        destination: Option<&mut [u8]>,
    ) -> Result<(), MockError> {
        let Some(destination) = destination else {
            return Err(MockError::NullDestination {
                function: function.to_string(),
                param: param.to_string(),
            });
        };

        match self.outputs.find_and_remove(function, param) {
            Some(Payload::Data(data)) => {
                let data = data.unwrap_or_default();
                let copied = data.len().min(destination.len());
                destination[..copied].copy_from_slice(&data[..copied]);
                destination[copied..].fill(0);
                Ok(())
            }
            Some(Payload::Value(_)) => {
                destination.fill(0);
                Err(MockError::KindMismatch {
                    function: function.to_string(),
                    param: param.to_string(),
                    expected: "data",
                    registered: "value",
                })
            }
            None => {
                destination.fill(0);
                Err(MockError::MissingReturnData {
                    function: function.to_string(),
                    param: param.to_string(),
                })
            }
        }
    }

    /// Remember a failure to be reported at cleanup.
    pub fn record_failure(&mut self, error: MockError) {
        tracing::debug!(%error, "mock failure deferred");
        self.deferred.push(error);
    }

    /// Pending entries across both queues.
    pub fn pending(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0 && self.deferred.is_empty()
    }

    /// Report leaks and deferred failures, then empty everything.
    pub fn cleanup(&mut self) -> LeakStatus {
        let status = LeakStatus {
            unused_parameters: self.inputs.drain_keys(),
            unused_returns: self.outputs.drain_keys(),
            deferred_failures: std::mem::take(&mut self.deferred),
        };
        if !status.is_clean() {
            tracing::warn!(
                unused_parameters = status.unused_parameters.len(),
                unused_returns = status.unused_returns.len(),
                deferred = status.deferred_failures.len(),
                "mock store not clean at end of test"
            );
        }
        status
    }

    fn take_input(&mut self, function: &str, param: &str) -> Result<Payload, MockError> {
        self.inputs
            .find_and_remove(function, param)
            .ok_or_else(|| MockError::MissingExpectation {
                function: function.to_string(),
                param: param.to_string(),
            })
    }
}
