// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for configuration loading and call verification.

use thiserror::Error;

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// An environment variable held something other than a boolean flag.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value found.
        value: String,
    },
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// A recorded-call expectation that did not hold.
///
/// `stub` is the stub's slot name when it has one, otherwise its id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// No call was recorded.
    #[error("{stub} was never called")]
    NeverCalled {
        /// Stub label.
        stub: String,
    },
    /// No recorded call matched the expected arguments.
    #[error("{stub} was never called with {expected}; recorded: [{}]", .calls.join(", "))]
    NotCalledWith {
        /// Stub label.
        stub: String,
        /// Expected arguments, debug-formatted.
        expected: String,
        /// Arguments of every recorded call, debug-formatted.
        calls: Vec<String>,
    },
    /// No recorded call returned the expected value.
    #[error("{stub} never returned {expected}")]
    NeverReturned {
        /// Stub label.
        stub: String,
        /// Expected value, debug-formatted.
        expected: String,
    },
    /// The number of recorded calls differs from the expectation.
    #[error("{stub} was called {actual} time(s), expected {expected}")]
    CallCount {
        /// Stub label.
        stub: String,
        /// Expected number of calls.
        expected: usize,
        /// Recorded number of calls.
        actual: usize,
    },
}
