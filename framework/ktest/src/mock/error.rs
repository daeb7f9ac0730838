//! Mock failure and leak kinds.

use std::fmt;

/// A mock check or lookup that did not go as registered.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    #[error("Failed to find parameter {param} for {function}")]
    MissingExpectation { function: String, param: String },

    #[error("{function}:{param} received wrong value: Got {actual}, expected {expected}")]
    ValueMismatch {
        function: String,
        param: String,
        expected: usize,
        actual: usize,
    },

    #[error("{function}:{param} received null pointer")]
    UnexpectedNull { function: String, param: String },

    #[error("{function}:{param} received data while expected null pointer")]
    ExpectedNull { function: String, param: String },

    #[error("{function}:{param} data provided don't match")]
    DataMismatch { function: String, param: String },

    #[error("{function}:{param} checked as {expected} but was registered as {registered}")]
    KindMismatch {
        function: String,
        param: String,
        expected: &'static str,
        registered: &'static str,
    },

    #[error("Failed to find return value for function {function}")]
    MissingReturnValue { function: String },

    #[error("Failed to find return data {param} for {function}")]
    MissingReturnData { function: String, param: String },

    #[error("{function}:{param} received null destination")]
    NullDestination { function: String, param: String },

    #[error("{call} called outside a running test")]
    NoActiveTest { call: &'static str },
}

/// Kind of entry left behind at the end of a test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeakKind {
    /// An `expect_*` entry no stub checked.
    UnusedParameter,
    /// A `returns_value`/`return_data` entry no stub consumed.
    UnusedReturnValue,
}

impl fmt::Display for LeakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LeakKind::UnusedParameter => "Unused mock parameter values",
            LeakKind::UnusedReturnValue => "Unused mock return values",
        })
    }
}
