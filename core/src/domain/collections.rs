//! JSON encoding of whole collections over the persistence port.
//!
//! Both helpers absorb failures: a collection that cannot be loaded starts
//! empty, and a collection that cannot be saved stays authoritative in memory.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::ports::{CollectionKey, PersistenceError, PersistenceGateway};

/// Encode `value` and replace the stored document for `key`.
///
/// Returns whether the save succeeded; failures are logged, never retried.
pub(crate) async fn save_collection<T>(
    persistence: &dyn PersistenceGateway,
    key: CollectionKey,
    value: &T,
) -> bool
where
    T: Serialize + ?Sized,
{
    let result = match serde_json::to_string(value) {
        Ok(document) => persistence.save(key, &document).await,
        Err(err) => Err(PersistenceError::serialization(err.to_string())),
    };

    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(collection = %key, error = %err, "failed to save collection");
            false
        }
    }
}

/// Load and decode the document for `key`, defaulting to empty on any failure.
pub(crate) async fn load_collection<T>(persistence: &dyn PersistenceGateway, key: CollectionKey) -> T
where
    T: DeserializeOwned + Default,
{
    let document = match persistence.load(key).await {
        Ok(Some(document)) => document,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!(collection = %key, error = %err, "failed to load collection; starting empty");
            return T::default();
        }
    };

    serde_json::from_str(&document).unwrap_or_else(|err| {
        warn!(collection = %key, error = %err, "stored collection is malformed; starting empty");
        T::default()
    })
}
