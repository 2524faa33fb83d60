//! Generic hot-swappable config store.
//!
//! `ConfigStore<T>` wraps `Arc<RwLock<T>>` with a version counter so that a
//! SIGHUP reload can swap a section while readers keep working.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard};

/// A shared, versioned configuration store.
pub struct ConfigStore<T> {
    inner: Arc<ConfigStoreInner<T>>,
}

struct ConfigStoreInner<T> {
    data: RwLock<T>,
    version: AtomicU64,
}

impl<T> ConfigStore<T> {
    /// Create a new `ConfigStore` with the given initial value.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(ConfigStoreInner {
                data: RwLock::new(initial),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the stored value. Returns the new version.
    pub async fn update(&self, value: T) -> u64 {
        let mut guard = self.inner.data.write().await;
        *guard = value;
        self.inner.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Read the current value.
    ///
    /// Hold the guard only for as long as it takes to copy out what you
    /// need; a reload waits for every outstanding guard.
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.data.read().await
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_is_visible_to_clones() {
        let store = ConfigStore::new(1u32);
        let clone = store.clone();
        assert_eq!(*store.read().await, 1);

        assert_eq!(clone.update(2).await, 1);
        assert_eq!(*store.read().await, 2);
        assert_eq!(store.update(3).await, 2);
        assert_eq!(*clone.read().await, 3);
    }
}
