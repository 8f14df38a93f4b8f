// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `Result`-returning expectations over recorded calls.
//!
//! The boolean queries on [`Stub`] answer "did it happen?"; these helpers
//! answer with a [`VerifyError`] describing what was recorded instead, so
//! tests can propagate them with `?`.

use crate::error::VerifyError;
use crate::stub::Stub;
use std::fmt::Debug;

impl<A, R> Stub<A, R> {
    fn label(&self) -> String {
        self.name()
            .map_or_else(|| self.id().to_string(), ToString::to_string)
    }

    /// Fail unless at least one call was recorded.
    pub fn verify_called(&self) -> Result<(), VerifyError> {
        if self.called() {
            Ok(())
        } else {
            Err(VerifyError::NeverCalled { stub: self.label() })
        }
    }

    /// Fail unless exactly `expected` calls were recorded.
    pub fn verify_call_count(&self, expected: usize) -> Result<(), VerifyError> {
        let actual = self.call_count();
        if actual == expected {
            Ok(())
        } else {
            Err(VerifyError::CallCount {
                stub: self.label(),
                expected,
                actual,
            })
        }
    }

    /// Fail unless some recorded call received exactly `args`.
    pub fn verify_called_with(&self, args: &A) -> Result<(), VerifyError>
    where
        A: PartialEq + Debug + Clone,
        R: Clone,
    {
        if self.called_with(args) {
            return Ok(());
        }
        Err(VerifyError::NotCalledWith {
            stub: self.label(),
            expected: format!("{args:?}"),
            calls: self
                .calls()
                .iter()
                .map(|call| format!("{:?}", call.args()))
                .collect(),
        })
    }

    /// Fail unless some recorded call returned `value`.
    pub fn verify_returned(&self, value: &R) -> Result<(), VerifyError>
    where
        R: PartialEq + Debug,
    {
        if self.returned(value) {
            Ok(())
        } else {
            Err(VerifyError::NeverReturned {
                stub: self.label(),
                expected: format!("{value:?}"),
            })
        }
    }
}
