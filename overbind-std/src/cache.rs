//! # Dispatch Caches
//!
//! Memoization of compiled thunks by [`Signature`]. Entries are only ever
//! added; nothing is evicted or invalidated.
//!
//! Two modes are provided:
//!
//! - [`LocalCache`]: no locking. It is `!Sync`, so the compiler rejects any
//!   attempt to share it between threads.
//! - [`SharedCache`]: one mutex per cache, held only for map reads and
//!   writes. Compilation runs outside the lock, so two threads missing the
//!   same signature may both compile it; the last insert wins.

use overbind_core::Signature;
use rustc_hash::FxHashMap;
use std::{
    cell::RefCell,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// A signature-keyed store of compiled values.
pub trait DispatchCache<V: Clone>: Default {
    /// Whether the cache may be shared between threads.
    const SYNCHRONIZED: bool;

    /// Look up a cached value.
    fn lookup(&self, signature: Signature) -> Option<V>;

    /// Store a value, replacing any previous entry.
    fn insert(&self, signature: Signature, value: V);

    /// Get the number of cached entries.
    fn len(&self) -> usize;

    /// Check if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value, or compute and store it.
    ///
    /// `compile` runs without any lock held. A failed compile stores nothing.
    fn get_or_compile<E>(
        &self,
        signature: Signature,
        compile: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.lookup(signature) {
            return Ok(value);
        }
        let value = compile()?;
        self.insert(signature, value.clone());
        Ok(value)
    }
}

/// Unsynchronized cache for single-threaded resolvers.
pub struct LocalCache<V> {
    entries: RefCell<FxHashMap<Signature, V>>,
}

impl<V> Default for LocalCache<V> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(FxHashMap::default()),
        }
    }
}

impl<V: Clone> DispatchCache<V> for LocalCache<V> {
    const SYNCHRONIZED: bool = false;

    fn lookup(&self, signature: Signature) -> Option<V> {
        self.entries.borrow().get(&signature).cloned()
    }

    fn insert(&self, signature: Signature, value: V) {
        self.entries.borrow_mut().insert(signature, value);
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl<V> fmt::Debug for LocalCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCache")
            .field("entries", &self.entries.borrow().len())
            .finish()
    }
}

/// Mutex-protected cache for resolvers shared between threads.
pub struct SharedCache<V> {
    entries: Mutex<FxHashMap<Signature, V>>,
}

impl<V> SharedCache<V> {
    // Every write is a single `insert`, so a poisoned map is still consistent.
    fn entries(&self) -> MutexGuard<'_, FxHashMap<Signature, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Default for SharedCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<V: Clone> DispatchCache<V> for SharedCache<V> {
    const SYNCHRONIZED: bool = true;

    fn lookup(&self, signature: Signature) -> Option<V> {
        self.entries().get(&signature).cloned()
    }

    fn insert(&self, signature: Signature, value: V) {
        self.entries().insert(signature, value);
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

impl<V> fmt::Debug for SharedCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCache")
            .field("entries", &self.entries().len())
            .finish()
    }
}
