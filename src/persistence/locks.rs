//! Per-identifier locking
//!
//! Mutations of one identifier are mutually exclusive; mutations of
//! different identifiers never contend. Reads of an identifier share its lock,
//! so they see a history before or after a write, never during one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Lock table keyed by identifier.
///
/// An entry lives only while some caller holds or waits for it, so the
/// table never outgrows the set of identifiers in use.
///
/// The guarded value is `()`: a poisoned lock protects no state of its own
/// and is recovered rather than propagated.
#[derive(Debug)]
pub struct IdLocks<Id> {
    table: Mutex<HashMap<Id, Arc<RwLock<()>>>>,
}

/// A caller's claim on one table entry; dropping it evicts the entry if
/// nobody else holds a claim.
struct Lease<'a, Id: Clone + Eq + Hash> {
    locks: &'a IdLocks<Id>,
    id: &'a Id,
    lock: Arc<RwLock<()>>,
}

impl<Id: Clone + Eq + Hash> Drop for Lease<'_, Id> {
    fn drop(&mut self) {
        let mut table = self
            .locks
            .table
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Claims are only cloned under the table mutex: the table's own
        // reference plus ours means nobody else is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(self.id);
        }
    }
}

impl<Id: Clone + Eq + Hash> IdLocks<Id> {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    fn lease<'a>(&'a self, id: &'a Id) -> Lease<'a, Id> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(table.entry(id.clone()).or_default());
        Lease {
            locks: self,
            id,
            lock,
        }
    }

    /// Runs `f` holding the exclusive lock of `id`.
    pub fn with_write<T>(&self, id: &Id, f: impl FnOnce() -> T) -> T {
        let lease = self.lease(id);
        let _guard = lease.lock.write().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Runs `f` holding the shared lock of `id`.
    pub fn with_read<T>(&self, id: &Id, f: impl FnOnce() -> T) -> T {
        let lease = self.lease(id);
        let _guard = lease.lock.read().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of identifiers currently locked or awaited.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<Id: Clone + Eq + Hash> Default for IdLocks<Id> {
    fn default() -> Self {
        Self::new()
    }
}
