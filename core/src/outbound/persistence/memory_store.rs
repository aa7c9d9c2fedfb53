//! In-process document store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::domain::ports::{CollectionKey, PersistenceError, PersistenceGateway};

/// Keeps collection documents in memory.
///
/// Saves can be made to fail on demand to exercise the in-memory-wins rule.
#[derive(Debug, Default)]
pub struct InMemoryCollectionStore {
    documents: Mutex<HashMap<CollectionKey, String>>,
    fail_saves: AtomicBool,
}

impl InMemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document as if it had been saved earlier.
    pub fn with_document(self, key: CollectionKey, document: impl Into<String>) -> Self {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(key, document.into());
        }
        self
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Release);
    }

    /// Current document for `key`, if any.
    pub fn document(&self, key: CollectionKey) -> Option<String> {
        self.documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(&key).cloned())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryCollectionStore {
    async fn save(&self, key: CollectionKey, document: &str) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::Acquire) {
            return Err(PersistenceError::io(format!("save of {key} refused")));
        }
        let mut documents = self
            .documents
            .lock()
            .map_err(|err| PersistenceError::io(err.to_string()))?;
        documents.insert(key, document.to_owned());
        Ok(())
    }

    async fn load(&self, key: CollectionKey) -> Result<Option<String>, PersistenceError> {
        let documents = self
            .documents
            .lock()
            .map_err(|err| PersistenceError::io(err.to_string()))?;
        Ok(documents.get(&key).cloned())
    }
}
