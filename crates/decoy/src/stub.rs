// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording stubs.
//!
//! A [`Stub`] wraps an original callable and exposes a *handler*: a
//! [`Callable`] of the same shape that records every invocation and resolves
//! its return value from the stub's current mode:
//!
//! | Mode | Return value |
//! |---|---|
//! | [`ResolutionMode::None`] | `None` |
//! | [`ResolutionMode::Fixed`] | clone of the value given to [`Stub::returns`] |
//! | [`ResolutionMode::Fake`] | result of the function given to [`Stub::calls_fake`] |
//!
//! The handler keeps the stub state alive, so a handler installed in a
//! [`MethodSlot`](crate::MethodSlot) keeps recording after every `Stub`
//! handle is gone.

use crate::call::{CallContext, CallRecord};
use crate::callable::Callable;
use crate::lock;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{trace, warn};

static NEXT_STUB_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique stub identifier, allocated in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubId(u64);

impl StubId {
    fn next() -> Self {
        Self(NEXT_STUB_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stub#{}", self.0)
    }
}

/// Which resolution policy a stub currently applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Calls produce no value.
    None,
    /// Calls produce a configured value.
    Fixed,
    /// Calls are forwarded to a fake function.
    Fake,
}

enum Resolution<A, R> {
    None,
    Fixed(R),
    Fake(Callable<A, R>),
}

type RestoreCallback = Box<dyn FnOnce() + Send>;

/// Type-erased view of a stub, used where stubs of different signatures are
/// held together (the patch registry).
pub(crate) trait StubHandle: Send + Sync {
    fn id(&self) -> StubId;
    fn name(&self) -> Option<&str>;
    fn restore(&self);
}

struct StubState<A, R> {
    id: StubId,
    name: Option<String>,
    calls: Mutex<Vec<CallRecord<A, R>>>,
    resolution: Mutex<Resolution<A, R>>,
    restore_callback: Mutex<Option<RestoreCallback>>,
}

impl<A, R> StubState<A, R>
where
    A: Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    fn invoke(&self, context: Option<CallContext>, args: A) -> Option<R> {
        // The resolution lock is released before a fake runs so the fake may
        // reconfigure or call back into this stub.
        let (fake, fixed) = match &*lock(&self.resolution) {
            Resolution::None => (None, None),
            Resolution::Fixed(value) => (None, Some(value.clone())),
            Resolution::Fake(fake) => (Some(fake.clone()), None),
        };
        let Some(fake) = fake else {
            self.record(args, fixed.clone(), context);
            return fixed;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            fake.call_with_context(context, args.clone())
        }));
        match outcome {
            Ok(value) => {
                self.record(args, value.clone(), context);
                value
            }
            Err(payload) => {
                warn!(stub = %self.id, "fake panicked; call recorded without a return value");
                self.record(args, None, context);
                panic::resume_unwind(payload)
            }
        }
    }

    fn record(&self, args: A, return_value: Option<R>, context: Option<CallContext>) {
        let mut calls = lock(&self.calls);
        trace!(stub = %self.id, index = calls.len(), method = context.is_some(), "call recorded");
        calls.push(CallRecord::new(args, return_value, context));
    }
}

impl<A, R> StubHandle for StubState<A, R>
where
    A: Send,
    R: Send,
{
    fn id(&self) -> StubId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn restore(&self) {
        self.run_restore();
    }
}

impl<A, R> StubState<A, R> {
    fn run_restore(&self) {
        let callback = lock(&self.restore_callback).take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// A recording proxy for a callable taking the argument tuple `A` and
/// returning `R`.
///
/// Cloning a `Stub` produces another handle to the same recorded calls and
/// configuration.
///
/// ```
/// let s = decoy::stub(|(x,): (i32,)| x + x);
/// assert_eq!(s.call((5,)), None);
///
/// s.pass_through();
/// assert_eq!(s.call((5,)), Some(10));
/// assert!(s.returned(&10));
/// assert_eq!(s.call_count(), 2);
/// ```
pub struct Stub<A, R> {
    state: Arc<StubState<A, R>>,
    original: Option<Callable<A, R>>,
    handler: Callable<A, R>,
}

impl<A, R> Stub<A, R>
where
    A: Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    /// Wrap `original`. Nothing is patched; [`restore`](Self::restore) is a
    /// no-op unless a callback is installed.
    pub fn new(original: Callable<A, R>) -> Self {
        Self::build(Some(original), None)
    }

    pub(crate) fn build(original: Option<Callable<A, R>>, name: Option<String>) -> Self {
        let state = Arc::new(StubState {
            id: StubId::next(),
            name,
            calls: Mutex::new(Vec::new()),
            resolution: Mutex::new(Resolution::None),
            restore_callback: Mutex::new(None),
        });
        let handler = {
            let state = Arc::clone(&state);
            Callable::handler_of(state.id, move |context, args| state.invoke(context, args))
        };
        Self {
            state,
            original,
            handler,
        }
    }

    /// Make every later call return a clone of `value`. Clears any fake.
    pub fn returns(&self, value: R) -> &Self {
        *lock(&self.state.resolution) = Resolution::Fixed(value);
        self
    }

    /// Compute every later call's return value with `fake`. Clears any fixed
    /// value.
    pub fn calls_fake<F>(&self, fake: F) -> &Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.set_fake(Callable::new(fake))
    }

    /// Like [`calls_fake`](Self::calls_fake), but the fake also receives the
    /// receiver of method-style calls.
    pub fn calls_fake_with_context<F>(&self, fake: F) -> &Self
    where
        F: Fn(Option<CallContext>, A) -> R + Send + Sync + 'static,
    {
        self.set_fake(Callable::with_context(fake))
    }

    /// Forward calls to the original callable while recording them.
    ///
    /// When there is no original (an empty slot was patched) calls produce no
    /// value.
    pub fn pass_through(&self) -> &Self {
        let resolution = match &self.original {
            Some(original) => Resolution::Fake(original.clone()),
            None => Resolution::None,
        };
        *lock(&self.state.resolution) = resolution;
        self
    }

    fn set_fake(&self, fake: Callable<A, R>) -> &Self {
        *lock(&self.state.resolution) = Resolution::Fake(fake);
        self
    }
}

impl<A, R> Stub<A, R> {
    /// Identifier of this stub.
    pub fn id(&self) -> StubId {
        self.state.id
    }

    /// Name of the slot this stub was patched into, if any.
    pub fn name(&self) -> Option<&str> {
        self.state.name.as_deref()
    }

    /// The callable exposed to callers.
    pub fn handler(&self) -> &Callable<A, R> {
        &self.handler
    }

    /// The wrapped callable; `None` when an empty slot was patched.
    pub fn original(&self) -> Option<&Callable<A, R>> {
        self.original.as_ref()
    }

    /// Invoke the handler as a free function.
    pub fn call(&self, args: A) -> Option<R> {
        self.handler.call(args)
    }

    /// Invoke the handler as a method bound to `receiver`.
    pub fn call_on<T: ?Sized>(&self, receiver: &T, args: A) -> Option<R> {
        self.handler.call_on(receiver, args)
    }

    /// Active resolution policy.
    pub fn mode(&self) -> ResolutionMode {
        match &*lock(&self.state.resolution) {
            Resolution::None => ResolutionMode::None,
            Resolution::Fixed(_) => ResolutionMode::Fixed,
            Resolution::Fake(_) => ResolutionMode::Fake,
        }
    }

    /// Forget every recorded call. The resolution mode is kept.
    pub fn reset(&self) {
        lock(&self.state.calls).clear();
    }

    /// Undo whatever created this stub, at most once.
    pub fn restore(&self) {
        self.state.run_restore();
    }

    /// Install the action [`restore`](Self::restore) runs. Replaces any
    /// pending callback.
    pub fn set_restore_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *lock(&self.state.restore_callback) = Some(Box::new(callback));
    }

    /// Whether a restore is still pending.
    pub fn has_restore_callback(&self) -> bool {
        lock(&self.state.restore_callback).is_some()
    }

    /// Whether the handler was invoked since creation or the last reset.
    pub fn called(&self) -> bool {
        self.call_count() > 0
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        lock(&self.state.calls).len()
    }

    /// Whether some recorded call received exactly `args`.
    pub fn called_with(&self, args: &A) -> bool
    where
        A: PartialEq,
    {
        lock(&self.state.calls).iter().any(|call| call.args() == args)
    }

    /// Whether some recorded call returned `value`.
    pub fn returned(&self, value: &R) -> bool
    where
        R: PartialEq,
    {
        lock(&self.state.calls)
            .iter()
            .any(|call| call.return_value() == Some(value))
    }

    pub(crate) fn handle(&self) -> Arc<dyn StubHandle>
    where
        A: Send + 'static,
        R: Send + 'static,
    {
        self.state.clone()
    }
}

impl<A: Clone, R: Clone> Stub<A, R> {
    /// Snapshot of all recorded calls in invocation order.
    pub fn calls(&self) -> Vec<CallRecord<A, R>> {
        lock(&self.state.calls).clone()
    }

    /// Record at `index` in invocation order, `None` when out of range.
    pub fn get_call(&self, index: usize) -> Option<CallRecord<A, R>> {
        lock(&self.state.calls).get(index).cloned()
    }

    /// Earliest recorded call.
    pub fn first_call(&self) -> Option<CallRecord<A, R>> {
        self.get_call(0)
    }

    /// Most recent recorded call.
    pub fn last_call(&self) -> Option<CallRecord<A, R>> {
        lock(&self.state.calls).last().cloned()
    }
}

impl<A, R> Clone for Stub<A, R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            original: self.original.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<A, R> fmt::Debug for Stub<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub")
            .field("id", &self.state.id)
            .field("name", &self.state.name)
            .field("mode", &self.mode())
            .field("call_count", &self.call_count())
            .finish_non_exhaustive()
    }
}
