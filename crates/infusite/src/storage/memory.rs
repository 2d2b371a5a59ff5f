//! Volatile blob store.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::Result;

use super::BlobStore;

/// A [`BlobStore`] kept in a `HashMap`. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.borrow().is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let store = MemoryStore::new();
        store.set("k", "a").unwrap();
        store.set("k", "b").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("b"));
        assert_eq!(store.len(), 1);
    }
}
