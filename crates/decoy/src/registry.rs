// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Patch registry: bookkeeping of stubs that currently own a method slot.
//!
//! Every stub created by [`PatchRegistry::stub_method`] is tracked until it
//! is restored, either individually through [`Stub::restore`] or in bulk
//! through [`PatchRegistry::restore_all`]. Tests usually share the
//! process-wide [`PatchRegistry::global`] instance (which the crate-level
//! free functions use) or create their own with [`PatchRegistry::scoped`].

use crate::config::RegistryConfig;
use crate::lock;
use crate::slot::MethodSlot;
use crate::stub::{Stub, StubHandle, StubId};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use tracing::{debug, info, instrument, warn};

static GLOBAL: OnceLock<PatchRegistry> = OnceLock::new();

struct RegistryInner {
    config: RegistryConfig,
    // Keyed by id, so iteration follows creation order.
    entries: Mutex<BTreeMap<StubId, Arc<dyn StubHandle>>>,
}

impl RegistryInner {
    fn remove(&self, id: StubId) -> bool {
        lock(&self.entries).remove(&id).is_some()
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        let entries = std::mem::take(
            self.entries
                .get_mut()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        );
        if entries.is_empty() {
            return;
        }
        if self.config.restore_on_drop {
            debug!(count = entries.len(), "registry dropped; restoring live patches");
            for handle in entries.values().rev() {
                handle.restore();
            }
        } else if self.config.warn_on_leak {
            for handle in entries.values() {
                warn!(
                    stub = %handle.id(),
                    slot = handle.name().unwrap_or("<unnamed>"),
                    "registry dropped while slot is still patched"
                );
            }
        }
    }
}

/// Set of live method patches.
///
/// Cloning yields another handle to the same set.
#[derive(Clone)]
pub struct PatchRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for PatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchRegistry {
    /// Empty registry with the default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Empty registry with `config`.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                entries: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// The process-wide registry used by [`crate::stub_method`],
    /// [`crate::spy_method`] and [`crate::restore`].
    ///
    /// Created on first use from [`RegistryConfig::from_env`]; an invalid
    /// environment falls back to the default config. It lives until the
    /// process exits, so call [`restore_all`](Self::restore_all) between
    /// tests.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            let config = RegistryConfig::from_env().unwrap_or_else(|err| {
                warn!(%err, "invalid registry config in environment; using defaults");
                RegistryConfig::default()
            });
            Self::with_config(config)
        })
    }

    /// Fresh registry that restores everything it tracks when the returned
    /// guard is dropped.
    pub fn scoped() -> RestoreGuard {
        RestoreGuard::new(Self::new())
    }

    /// Guard that restores everything this registry tracks when dropped.
    pub fn guard(&self) -> RestoreGuard {
        RestoreGuard::new(self.clone())
    }

    /// Config this registry was built with.
    pub fn config(&self) -> RegistryConfig {
        self.inner.config
    }

    /// Replace the implementation in `slot` with a new stub's handler.
    ///
    /// The stub wraps whatever the slot held (possibly nothing). Restoring
    /// the stub writes that back and drops the stub from this registry.
    pub fn stub_method<A, R>(&self, slot: &MethodSlot<A, R>) -> Stub<A, R>
    where
        A: Clone + Send + 'static,
        R: Clone + Send + 'static,
    {
        let original = slot.current();
        let stub = Stub::build(original.clone(), Some(slot.name().to_string()));
        let id = stub.id();
        slot.replace(Some(stub.handler().clone()));

        // Both the registry and the slot are held weakly: the slot owns the
        // handler, which owns this callback.
        let registry = Arc::downgrade(&self.inner);
        let target = slot.downgrade();
        stub.set_restore_callback(move || {
            if let Some(target) = target.upgrade() {
                target.replace(original);
                debug!(stub = %id, slot = target.name(), "slot restored");
            } else {
                debug!(stub = %id, "slot dropped before restore");
            }
            if let Some(inner) = Weak::upgrade(&registry) {
                inner.remove(id);
            }
        });

        lock(&self.inner.entries).insert(id, stub.handle());
        debug!(stub = %id, slot = slot.name(), "slot patched");
        stub
    }

    /// [`stub_method`](Self::stub_method) configured to pass calls through
    /// to the original implementation.
    pub fn spy_method<A, R>(&self, slot: &MethodSlot<A, R>) -> Stub<A, R>
    where
        A: Clone + Send + 'static,
        R: Clone + Send + 'static,
    {
        let stub = self.stub_method(slot);
        stub.pass_through();
        stub
    }

    /// Restore every stub tracked at the time of the call, newest first, and
    /// drop them from the registry.
    ///
    /// Newest-first order unwinds repeated patches of one slot back to its
    /// true original. Patches added while this runs are left alone.
    #[instrument(skip(self))]
    pub fn restore_all(&self) {
        let snapshot: Vec<Arc<dyn StubHandle>> = lock(&self.inner.entries).values().cloned().collect();
        if snapshot.is_empty() {
            return;
        }
        info!(count = snapshot.len(), "restoring patched slots");
        for handle in snapshot.iter().rev() {
            handle.restore();
        }
        let mut entries = lock(&self.inner.entries);
        for handle in &snapshot {
            entries.remove(&handle.id());
        }
    }

    /// Number of live patches.
    pub fn len(&self) -> usize {
        lock(&self.inner.entries).len()
    }

    /// Whether no patch is live.
    pub fn is_empty(&self) -> bool {
        lock(&self.inner.entries).is_empty()
    }

    /// Whether `stub` is tracked by this registry.
    pub fn contains<A, R>(&self, stub: &Stub<A, R>) -> bool {
        lock(&self.inner.entries).contains_key(&stub.id())
    }
}

impl fmt::Debug for PatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<StubId> = lock(&self.inner.entries).keys().copied().collect();
        f.debug_struct("PatchRegistry")
            .field("config", &self.inner.config)
            .field("entries", &ids)
            .finish()
    }
}

/// Restores a registry when dropped.
///
/// Dereferences to the registry, so patches can be made through the guard.
#[must_use = "the registry is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RestoreGuard {
    registry: PatchRegistry,
}

impl RestoreGuard {
    /// Guard `registry`.
    pub fn new(registry: PatchRegistry) -> Self {
        Self { registry }
    }
}

impl Deref for RestoreGuard {
    type Target = PatchRegistry;

    fn deref(&self) -> &PatchRegistry {
        &self.registry
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        self.registry.restore_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn individual_restore_removes_entry() {
        let registry = PatchRegistry::new();
        let slot = MethodSlot::named("ping", |(): ()| "pong");
        let s = registry.stub_method(&slot);

        assert!(registry.contains(&s));
        assert_eq!(registry.len(), 1);

        s.restore();
        assert!(registry.is_empty());
        assert!(!registry.contains(&s));
        assert_eq!(slot.invoke(()), Some("pong"));
    }

    #[test]
    fn nested_patches_unwind_to_original() {
        let registry = PatchRegistry::new();
        let slot = MethodSlot::named("value", |(): ()| 1);
        let original = slot.current().unwrap();

        let outer = registry.stub_method(&slot);
        let inner = registry.stub_method(&slot);
        assert!(slot.holds(inner.handler()));
        assert_eq!(inner.original(), Some(outer.handler()));

        registry.restore_all();
        assert!(slot.holds(&original));
        assert!(registry.is_empty());
    }

    #[test]
    fn restore_on_drop_reverts_live_patches() {
        let slot = MethodSlot::named("value", |(): ()| 1);
        {
            let registry = PatchRegistry::with_config(RegistryConfig {
                restore_on_drop: true,
                warn_on_leak: true,
            });
            registry.stub_method(&slot).returns(2);
            assert_eq!(slot.invoke(()), Some(2));
        }
        assert_eq!(slot.invoke(()), Some(1));
    }

    #[test]
    fn dropped_registry_without_restore_leaves_patch() {
        let slot = MethodSlot::named("value", |(): ()| 1);
        let s = {
            let registry = PatchRegistry::new();
            let s = registry.stub_method(&slot);
            s.returns(2);
            s
        };
        assert_eq!(slot.invoke(()), Some(2));

        // The stub can still undo its own patch after the registry is gone.
        s.restore();
        assert_eq!(slot.invoke(()), Some(1));
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn unrestored_patch_is_freed_with_its_slot() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(Arc::clone(&dropped));
        let slot = MethodSlot::named("m", move |(): ()| {
            let _ = &flag;
        });

        let registry = PatchRegistry::with_config(RegistryConfig {
            restore_on_drop: false,
            warn_on_leak: false,
        });
        let s = registry.stub_method(&slot);
        s.call(());

        drop(s);
        drop(registry);
        assert!(!dropped.load(Ordering::SeqCst));
        drop(slot);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn restore_after_slot_dropped_still_unregisters() {
        let registry = PatchRegistry::new();
        let slot = MethodSlot::named("m", |(): ()| 1);
        let s = registry.stub_method(&slot);
        drop(slot);

        s.restore();
        assert!(registry.is_empty());
    }

    #[test]
    fn guard_restores_on_scope_exit() {
        let slot = MethodSlot::named("value", |(): ()| 1);
        {
            let registry = PatchRegistry::scoped();
            registry.stub_method(&slot).returns(5);
            assert_eq!(slot.invoke(()), Some(5));
        }
        assert_eq!(slot.invoke(()), Some(1));
    }
}
