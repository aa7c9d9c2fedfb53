//! JSON document files in a single data directory.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;

use super::atomic_write::replace_file;
use crate::domain::ports::{CollectionKey, PersistenceError, PersistenceGateway};

/// Stores each collection as `<key>.json` inside one directory.
///
/// All file access goes through a capability handle opened once at
/// construction. Writes replace the whole file atomically.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: Arc<Dir>,
}

impl JsonFileStore {
    /// Open `path`, creating it when missing.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { dir: Arc::new(dir) })
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || work(&dir))
            .await
            .map_err(|err| PersistenceError::io(err.to_string()))?
            .map_err(|err| PersistenceError::io(err.to_string()))
    }
}

#[async_trait]
impl PersistenceGateway for JsonFileStore {
    async fn save(&self, key: CollectionKey, document: &str) -> Result<(), PersistenceError> {
        let file_name = key.file_name();
        let contents = document.as_bytes().to_vec();
        self.blocking(move |dir| replace_file(dir, &file_name, &contents))
            .await
    }

    async fn load(&self, key: CollectionKey) -> Result<Option<String>, PersistenceError> {
        let file_name = key.file_name();
        self.blocking(move |dir| match dir.read_to_string(&file_name) {
            Ok(document) => Ok(Some(document)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        })
        .await
    }
}
