// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording stubs and spies with restorable method patching.
#![forbid(unsafe_code)]
//!
//! A [`Stub`] stands in for a collaborator inside a unit test. It records
//! every call it receives ([`CallRecord`]) and answers with nothing, a fixed
//! value, a fake function, or the original implementation.
//!
//! Free functions are wrapped with [`stub`] and [`spy`]. Methods become
//! patchable by storing them in a [`MethodSlot`]; [`stub_method`] and
//! [`spy_method`] swap the slot's implementation for a stub's handler and
//! track the patch in the process-wide [`PatchRegistry`] until [`restore`]
//! (or the stub's own [`Stub::restore`]) puts the original back.
//!
//! ```
//! use decoy::MethodSlot;
//!
//! struct Mailer {
//!     send: MethodSlot<(String,), bool>,
//! }
//!
//! let mailer = Mailer { send: MethodSlot::named("send", |(_to,): (String,)| true) };
//! let send = decoy::stub_method(&mailer.send);
//! send.returns(false);
//!
//! assert_eq!(mailer.send.invoke(("ops@example.com".into(),)), Some(false));
//! assert!(send.called_with(&("ops@example.com".into(),)));
//!
//! decoy::restore();
//! assert_eq!(mailer.send.invoke(("ops@example.com".into(),)), Some(true));
//! ```
//!
//! # Modules
//!
//! - [`call`] - Call records and receiver identities
//! - [`callable`] - Shareable, identity-compared function handles
//! - [`config`] - Registry config and its storage port
//! - [`error`] - Config and verification errors
//! - [`ident`] - Identity-compared argument wrapper
//! - [`registry`] - Patch registry and restore guard
//! - [`slot`] - Patchable method cells
//! - [`stub`] - The recording stub

pub mod call;
pub mod callable;
pub mod config;
pub mod error;
pub mod ident;
pub mod registry;
pub mod slot;
pub mod stub;
mod verify;

pub use call::{CallContext, CallRecord};
pub use callable::Callable;
pub use config::{ConfigStore, RegistryConfig};
pub use error::{ConfigError, VerifyError};
pub use ident::Identity;
pub use registry::{PatchRegistry, RestoreGuard};
pub use slot::MethodSlot;
pub use stub::{ResolutionMode, Stub, StubId};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Wrap `f` in a stub. Nothing is patched and nothing is registered.
///
/// The stub starts with no resolution configured, so calls produce `None`
/// until [`Stub::returns`], [`Stub::calls_fake`] or [`Stub::pass_through`]
/// is used.
pub fn stub<A, R, F>(f: F) -> Stub<A, R>
where
    A: Clone + Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    Stub::new(Callable::new(f))
}

/// Stub of a function that accepts `A` and does nothing.
pub fn spy<A, R>() -> Stub<A, R>
where
    A: Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    Stub::new(Callable::noop())
}

/// Patch `slot` through the global registry. See [`PatchRegistry::stub_method`].
pub fn stub_method<A, R>(slot: &MethodSlot<A, R>) -> Stub<A, R>
where
    A: Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    PatchRegistry::global().stub_method(slot)
}

/// Patch `slot` through the global registry, passing calls through to the
/// original. See [`PatchRegistry::spy_method`].
pub fn spy_method<A, R>(slot: &MethodSlot<A, R>) -> Stub<A, R>
where
    A: Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    PatchRegistry::global().spy_method(slot)
}

/// Restore every slot patched through the global registry.
pub fn restore() {
    PatchRegistry::global().restore_all();
}

/// Lock `mutex`, recovering from poisoning. Every critical section in this
/// crate leaves its data consistent, so a poisoned lock is still usable.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
