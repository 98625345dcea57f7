//! Binding table: one shadow instance per real object
//!
//! The table maps a real object's identity to its unique shadow instance,
//! holding the real side weakly so a binding never extends the real object's
//! lifetime. Inserts are atomic per identity via the map's entry API: racing
//! binders agree on a single winner and losers discard their speculative
//! instance. Constructor hooks are never run by the table itself, so nested
//! binds from inside a hook cannot deadlock on a shard lock.
//!
//! Dead entries (real object collected) are treated as absent on lookup and
//! removed by an opportunistic sweep every `sweep_interval` table operations.
//! Identities are never reused, so sweeping cannot race a rebind of the same
//! identity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::object::{ObjectId, RealObject, RealRef, ShadowId, ShadowInstance};

/// One real object's association with its shadow
pub(crate) struct Binding {
    pub(crate) shadow: Arc<ShadowInstance>,
    pub(crate) real: Weak<RealObject>,
}

/// Process-wide table of live bindings
pub struct BindingTable {
    bindings: DashMap<ObjectId, Binding>,
    by_shadow: DashMap<ShadowId, ObjectId>,
    ops: AtomicU64,
    sweep_interval: u64,
}

impl BindingTable {
    /// Create an empty table sweeping every `sweep_interval` operations
    /// (0 disables opportunistic sweeps)
    pub fn new(sweep_interval: u64) -> Self {
        Self {
            bindings: DashMap::new(),
            by_shadow: DashMap::new(),
            ops: AtomicU64::new(0),
            sweep_interval,
        }
    }

    /// Obtain the shadow bound to `real`, creating it with `make_shadow` if
    /// absent. Idempotent: concurrent calls for the same identity all return
    /// the first writer's instance.
    pub fn bind(
        &self,
        real: &RealRef,
        make_shadow: impl FnOnce() -> Arc<ShadowInstance>,
    ) -> Arc<ShadowInstance> {
        self.tick();

        if let Some(existing) = self.bindings.get(&real.id()) {
            return existing.shadow.clone();
        }

        // Build the candidate outside any shard lock; state constructors are
        // user code and may themselves re-enter the table.
        let candidate = make_shadow();
        match self.bindings.entry(real.id()) {
            Entry::Occupied(entry) => {
                trace!(object = ?real.id(), "lost bind race, discarding speculative shadow");
                entry.get().shadow.clone()
            }
            Entry::Vacant(entry) => {
                entry.insert(Binding {
                    shadow: candidate.clone(),
                    real: Arc::downgrade(real),
                });
                self.by_shadow.insert(candidate.id(), real.id());
                trace!(object = ?real.id(), shadow = ?candidate.id(), "bound");
                candidate
            }
        }
    }

    /// Shadow bound to the given identity, or `None` if never bound or the
    /// real object is gone. A dead entry is removed on the way out.
    pub fn lookup_shadow(&self, id: ObjectId) -> Option<Arc<ShadowInstance>> {
        self.tick();

        let (dead_shadow, live) = {
            let entry = self.bindings.get(&id)?;
            if entry.real.strong_count() == 0 {
                (Some(entry.shadow.id()), None)
            } else {
                (None, Some(entry.shadow.clone()))
            }
        };
        if let Some(shadow_id) = dead_shadow {
            self.bindings
                .remove_if(&id, |_, b| b.real.strong_count() == 0);
            self.by_shadow.remove(&shadow_id);
            return None;
        }
        live
    }

    /// Real object a shadow instance is bound to, or `None` once collected
    pub fn lookup_real(&self, shadow: ShadowId) -> Option<RealRef> {
        self.tick();
        let id = *self.by_shadow.get(&shadow)?;
        self.bindings.get(&id)?.real.upgrade()
    }

    /// Remove a binding. Used only to roll back a failed construction;
    /// application code never unbinds a live object.
    pub(crate) fn remove(&self, id: ObjectId) {
        if let Some((_, binding)) = self.bindings.remove(&id) {
            self.by_shadow.remove(&binding.shadow.id());
        }
    }

    /// Number of bindings currently stored (live and not-yet-swept dead)
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drop every binding whose real object is gone; returns how many were
    /// removed. Never removes a binding with a live real object.
    pub fn sweep(&self) -> usize {
        let dead: Vec<(ObjectId, ShadowId)> = self
            .bindings
            .iter()
            .filter(|entry| entry.real.strong_count() == 0)
            .map(|entry| (*entry.key(), entry.shadow.id()))
            .collect();

        let mut removed = 0;
        for (id, shadow_id) in dead {
            if self
                .bindings
                .remove_if(&id, |_, b| b.real.strong_count() == 0)
                .is_some()
            {
                self.by_shadow.remove(&shadow_id);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "swept dead bindings");
        }
        removed
    }

    /// Count one table operation, sweeping when the interval elapses
    pub(crate) fn tick(&self) {
        if self.sweep_interval == 0 {
            return;
        }
        let n = self.ops.fetch_add(1, Ordering::Relaxed);
        if n % self.sweep_interval == self.sweep_interval - 1 {
            self.sweep();
        }
    }
}

impl std::fmt::Debug for BindingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingTable")
            .field("bindings", &self.bindings.len())
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}
