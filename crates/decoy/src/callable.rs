// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shareable function handles with identity semantics.

use crate::call::CallContext;
use crate::stub::StubId;
use std::fmt;
use std::sync::Arc;

type Invoke<A, R> = dyn Fn(Option<CallContext>, A) -> Option<R> + Send + Sync;

/// A reference-counted callable taking an argument tuple `A`.
///
/// Every callable in the engine (originals, fakes, handlers) has this shape.
/// The result is an `Option<R>` because a stub with nothing configured
/// produces no value. Equality is pointer identity: two handles are equal iff
/// they are clones of the same callable, which is how a patched slot is
/// checked against a stub's handler.
pub struct Callable<A, R> {
    f: Arc<Invoke<A, R>>,
    stub: Option<StubId>,
}

impl<A: 'static, R: 'static> Callable<A, R> {
    /// Wrap a plain function. Its result is always `Some`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::from_raw(move |_, args| Some(f(args)))
    }

    /// Wrap a function that also wants the receiver of method-style calls.
    pub fn with_context<F>(f: F) -> Self
    where
        F: Fn(Option<CallContext>, A) -> R + Send + Sync + 'static,
    {
        Self::from_raw(move |ctx, args| Some(f(ctx, args)))
    }

    /// Wrap a function with the full engine signature.
    pub fn from_raw<F>(f: F) -> Self
    where
        F: Fn(Option<CallContext>, A) -> Option<R> + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            stub: None,
        }
    }

    pub(crate) fn handler_of<F>(stub: StubId, f: F) -> Self
    where
        F: Fn(Option<CallContext>, A) -> Option<R> + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            stub: Some(stub),
        }
    }

    /// A callable that accepts anything and produces no value.
    pub fn noop() -> Self {
        Self::from_raw(|_, _| None)
    }
}

impl<A, R> Callable<A, R> {
    /// Invoke as a free function.
    pub fn call(&self, args: A) -> Option<R> {
        (self.f)(None, args)
    }

    /// Invoke as a method bound to `receiver`.
    pub fn call_on<T: ?Sized>(&self, receiver: &T, args: A) -> Option<R> {
        (self.f)(Some(CallContext::of(receiver)), args)
    }

    /// Invoke with an explicit (possibly absent) context.
    pub fn call_with_context(&self, context: Option<CallContext>, args: A) -> Option<R> {
        (self.f)(context, args)
    }

    /// Id of the stub this callable is the handler of, `None` for plain
    /// callables.
    pub fn stub_id(&self) -> Option<StubId> {
        self.stub
    }

    /// Whether both handles point at the same callable.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl<A, R> Clone for Callable<A, R> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            stub: self.stub,
        }
    }
}

impl<A, R> PartialEq for Callable<A, R> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<A, R> Eq for Callable<A, R> {}

impl<A, R> fmt::Debug for Callable<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Arc::as_ptr(&self.f).cast::<()>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_identity() {
        let a = Callable::new(|(x,): (i32,)| x + 1);
        let b = Callable::new(|(x,): (i32,)| x + 1);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.stub_id(), None);
    }

    #[test]
    fn call_variants_forward_context() {
        let seen = Callable::with_context(|ctx: Option<CallContext>, (): ()| ctx.is_some());
        let receiver = 5_u32;
        assert_eq!(seen.call(()), Some(false));
        assert_eq!(seen.call_on(&receiver, ()), Some(true));
        assert_eq!(Callable::<(), u8>::noop().call(()), None);
    }
}
