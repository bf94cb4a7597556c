//! Ordered callback registries with handle-based removal.
//!
//! # Responsibilities
//! - Keep callbacks in registration order
//! - Hand out a `Registration` that removes exactly one entry
//! - Provide snapshots so callbacks run without any lock held
//!
//! # Design Decisions
//! - Closures have no identity, so entries are keyed by a monotonic id
//! - Removal is idempotent: a second `remove()` is a no-op
//! - Handles hold the registry weakly and never keep it alive

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Ordered sequence of callbacks of type `T`.
pub struct Registry<T: ?Sized> {
    inner: Arc<RegistryInner<T>>,
}

struct RegistryInner<T: ?Sized> {
    label: &'static str,
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Arc<T>)>>,
}

trait Deregister: Send + Sync {
    fn deregister(&self, id: u64) -> bool;
}

impl<T: ?Sized + Send + Sync> Deregister for RegistryInner<T> {
    fn deregister(&self, id: u64) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => {
                entries.remove(index);
                tracing::trace!(registry = self.label, id, "callback removed");
                true
            }
            None => false,
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Registry<T> {
    /// Create an empty registry. `label` only shows up in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                label,
                next_id: AtomicU64::new(1),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Append a callback and return its removal handle.
    pub fn register(&self, callback: Arc<T>) -> Registration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, callback));
        tracing::trace!(registry = self.inner.label, id, "callback registered");

        let erased: Arc<dyn Deregister> = self.inner.clone();
        Registration {
            id,
            registry: Arc::downgrade(&erased),
        }
    }

    /// Callbacks in registration order, cloned out of the lock.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every callback.
    pub fn clear(&self) {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .inner
            .entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or_default();
        f.debug_struct("Registry")
            .field("label", &self.inner.label)
            .field("len", &len)
            .finish()
    }
}

/// Handle returned by every `register`-style call.
///
/// Dropping the handle keeps the callback registered; call [`Registration::remove`].
#[derive(Clone)]
pub struct Registration {
    id: u64,
    registry: Weak<dyn Deregister>,
}

impl Registration {
    /// Remove the callback. Returns `false` if it was already gone.
    pub fn remove(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.deregister(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}
