// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures and fakes for decoy tests.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`hosts`] - Host objects whose methods live in patchable slots

pub mod config;
pub mod hosts;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use hosts::{Calculator, Clock, Greeter, DEFAULT_GREETING, FIXED_EPOCH_SECS};
