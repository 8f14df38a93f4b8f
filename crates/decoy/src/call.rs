// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable records of individual stub invocations.

use std::fmt;

/// Identity of the receiver a method-style call was made on.
///
/// A context only remembers *which* object the call was bound to (its type
/// name and address), never the object itself, so records stay `'static`
/// and cheap to copy. Two contexts are equal iff they were taken from the
/// same live object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallContext {
    type_name: &'static str,
    addr: usize,
}

impl CallContext {
    /// Capture the identity of `receiver`.
    pub fn of<T: ?Sized>(receiver: &T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            addr: std::ptr::from_ref(receiver).cast::<()>().addr(),
        }
    }

    /// Type name of the receiver.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this context was taken from `receiver`.
    pub fn is<T: ?Sized>(&self, receiver: &T) -> bool {
        *self == Self::of(receiver)
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallContext({}@{:#x})", self.type_name, self.addr)
    }
}

/// Snapshot of one invocation: the arguments, the resolved return value and
/// the receiver for method-style calls.
///
/// Records are created by the stub's handler and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord<A, R> {
    args: A,
    return_value: Option<R>,
    context: Option<CallContext>,
}

impl<A, R> CallRecord<A, R> {
    pub(crate) fn new(args: A, return_value: Option<R>, context: Option<CallContext>) -> Self {
        Self {
            args,
            return_value,
            context,
        }
    }

    /// Arguments exactly as they were passed.
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Value handed back to the caller; `None` when nothing was configured.
    pub fn return_value(&self) -> Option<&R> {
        self.return_value.as_ref()
    }

    /// Receiver of a method-style call, `None` for free calls.
    pub fn context(&self) -> Option<CallContext> {
        self.context
    }

    /// Decompose into `(args, return_value, context)`.
    pub fn into_parts(self) -> (A, Option<R>, Option<CallContext>) {
        (self.args, self.return_value, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Receiver {
        _tag: u8,
    }

    #[test]
    fn context_identity_distinguishes_equal_objects() {
        let a = Receiver { _tag: 1 };
        let b = Receiver { _tag: 1 };

        assert_eq!(CallContext::of(&a), CallContext::of(&a));
        assert_ne!(CallContext::of(&a), CallContext::of(&b));
        assert!(CallContext::of(&b).is(&b));
        assert!(CallContext::of(&a).type_name().ends_with("Receiver"));
    }

    #[test]
    fn record_exposes_fields() {
        let record: CallRecord<(i32, &str), u8> = CallRecord::new((1, "x"), Some(7), None);
        assert_eq!(record.args(), &(1, "x"));
        assert_eq!(record.return_value(), Some(&7));
        assert_eq!(record.context(), None);
        assert_eq!(record.into_parts(), ((1, "x"), Some(7), None));
    }
}
