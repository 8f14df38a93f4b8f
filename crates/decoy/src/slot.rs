// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Patchable methods.
//!
//! Rust objects cannot have their methods reassigned at runtime, so a host
//! type that wants a method to be stubbable stores it in a [`MethodSlot`] and
//! routes calls through the slot:
//!
//! ```
//! use decoy::MethodSlot;
//!
//! struct Clock {
//!     now: MethodSlot<(), u64>,
//! }
//!
//! impl Clock {
//!     fn now(&self) -> u64 {
//!         self.now.invoke_on(self, ()).unwrap_or_default()
//!     }
//! }
//!
//! let clock = Clock { now: MethodSlot::named("now", |()| 1_700_000_000) };
//! let s = decoy::stub_method(&clock.now);
//! s.returns(42);
//! assert_eq!(clock.now(), 42);
//!
//! s.restore();
//! assert_eq!(clock.now(), 1_700_000_000);
//! ```

use crate::call::CallContext;
use crate::callable::Callable;
use crate::lock;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

struct SlotInner<A, R> {
    name: Cow<'static, str>,
    current: Mutex<Option<Callable<A, R>>>,
}

/// Indirection cell holding the implementation of one patchable method.
///
/// Clones share the same cell; this is how a stub's restore action writes
/// the original back into the host object.
pub struct MethodSlot<A, R> {
    inner: Arc<SlotInner<A, R>>,
}

impl<A: 'static, R: 'static> MethodSlot<A, R> {
    /// Slot initialised with `f`.
    pub fn named<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::with_callable(name, Some(Callable::new(f)))
    }

    /// Slot initialised with an existing callable, or empty.
    pub fn with_callable(name: impl Into<Cow<'static, str>>, current: Option<Callable<A, R>>) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                name: name.into(),
                current: Mutex::new(current),
            }),
        }
    }

    /// Slot with no implementation; invoking it produces no value.
    pub fn empty(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_callable(name, None)
    }
}

impl<A, R> MethodSlot<A, R> {
    /// Member name, used in logs.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The callable currently installed.
    pub fn current(&self) -> Option<Callable<A, R>> {
        lock(&self.inner.current).clone()
    }

    /// Install `callable` (or clear the slot), returning the previous one.
    pub fn replace(&self, callable: Option<Callable<A, R>>) -> Option<Callable<A, R>> {
        std::mem::replace(&mut *lock(&self.inner.current), callable)
    }

    /// Whether a stub's handler is currently installed.
    pub fn is_patched(&self) -> bool {
        lock(&self.inner.current)
            .as_ref()
            .is_some_and(|current| current.stub_id().is_some())
    }

    /// Whether `callable` is what the slot currently holds.
    pub fn holds(&self, callable: &Callable<A, R>) -> bool {
        lock(&self.inner.current)
            .as_ref()
            .is_some_and(|current| current.ptr_eq(callable))
    }

    /// Invoke the current implementation as a free function.
    pub fn invoke(&self, args: A) -> Option<R> {
        self.invoke_with_context(None, args)
    }

    /// Invoke the current implementation bound to `receiver`.
    pub fn invoke_on<T: ?Sized>(&self, receiver: &T, args: A) -> Option<R> {
        self.invoke_with_context(Some(CallContext::of(receiver)), args)
    }

    fn invoke_with_context(&self, context: Option<CallContext>, args: A) -> Option<R> {
        // Clone out so the slot is unlocked while the implementation runs.
        let current = self.current();
        current.and_then(|callable| callable.call_with_context(context, args))
    }

    /// Handle that does not keep the slot alive.
    pub(crate) fn downgrade(&self) -> WeakMethodSlot<A, R> {
        WeakMethodSlot {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same slot.
    pub fn same_slot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Non-owning handle to a [`MethodSlot`], held by restore actions so a
/// forgotten patch does not keep its host's slot alive.
pub(crate) struct WeakMethodSlot<A, R> {
    inner: Weak<SlotInner<A, R>>,
}

impl<A, R> WeakMethodSlot<A, R> {
    pub(crate) fn upgrade(&self) -> Option<MethodSlot<A, R>> {
        self.inner.upgrade().map(|inner| MethodSlot { inner })
    }
}

impl<A, R> Clone for MethodSlot<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for MethodSlot<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSlot")
            .field("name", &self.inner.name)
            .field("current", &self.current())
            .finish()
    }
}
