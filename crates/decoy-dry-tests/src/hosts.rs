// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host objects whose methods are routed through [`MethodSlot`]s.
//!
//! Each type keeps its real implementation in a slot and its inherent
//! methods only forward to that slot, so tests can patch and restore them.

use decoy::MethodSlot;

/// Greeting prefix used by [`Greeter::new`].
pub const DEFAULT_GREETING: &str = "Hello";

/// Timestamp reported by [`Clock::fixed`].
pub const FIXED_EPOCH_SECS: u64 = 1_700_000_000;

/// Builds greetings for a name.
#[derive(Debug)]
pub struct Greeter {
    /// Implementation of [`Greeter::greet`].
    pub greet: MethodSlot<(String,), String>,
}

impl Greeter {
    /// Greeter using [`DEFAULT_GREETING`].
    pub fn new() -> Self {
        Self::with_greeting(DEFAULT_GREETING)
    }

    /// Greeter using a custom greeting.
    pub fn with_greeting(greeting: &str) -> Self {
        let greeting = greeting.to_string();
        Self {
            greet: MethodSlot::named("greet", move |(name,): (String,)| {
                format!("{greeting}, {name}!")
            }),
        }
    }

    /// Greet `name`; an empty string when the slot produces nothing.
    pub fn greet(&self, name: &str) -> String {
        self.greet
            .invoke_on(self, (name.to_string(),))
            .unwrap_or_default()
    }
}

impl Default for Greeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer arithmetic with patchable operations.
#[derive(Debug)]
pub struct Calculator {
    /// Implementation of [`Calculator::add`].
    pub add: MethodSlot<(i64, i64), i64>,
    /// Implementation of [`Calculator::div`]; `None` on division by zero.
    pub div: MethodSlot<(i64, i64), Option<i64>>,
}

impl Calculator {
    /// Calculator with the real operations installed.
    pub fn new() -> Self {
        Self {
            add: MethodSlot::named("add", |(a, b): (i64, i64)| a + b),
            div: MethodSlot::named("div", |(a, b): (i64, i64)| a.checked_div(b)),
        }
    }

    /// `a + b` via the slot.
    pub fn add(&self, a: i64, b: i64) -> Option<i64> {
        self.add.invoke_on(self, (a, b))
    }

    /// `a / b` via the slot.
    pub fn div(&self, a: i64, b: i64) -> Option<i64> {
        self.div.invoke_on(self, (a, b)).flatten()
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of wall-clock seconds.
#[derive(Debug)]
pub struct Clock {
    /// Implementation of [`Clock::now`].
    pub now: MethodSlot<(), u64>,
}

impl Clock {
    /// Clock frozen at [`FIXED_EPOCH_SECS`].
    pub fn fixed() -> Self {
        Self {
            now: MethodSlot::named("now", |()| FIXED_EPOCH_SECS),
        }
    }

    /// Clock with no implementation installed yet.
    pub fn unset() -> Self {
        Self {
            now: MethodSlot::empty("now"),
        }
    }

    /// Current time, or `None` when nothing is installed.
    pub fn now(&self) -> Option<u64> {
        self.now.invoke_on(self, ())
    }
}
