//! Port for whole-document collection storage.

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by persistence adapters.
    pub enum PersistenceError {
        /// The storage medium failed.
        Io { message: String } => "collection storage failed: {message}",
        /// A document could not be encoded or decoded.
        Serialization { message: String } => "collection serialisation failed: {message}",
    }
}

/// Fixed logical names of the persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Alarms,
    Tags,
    SleepLogs,
}

impl CollectionKey {
    pub const ALL: [Self; 3] = [Self::Alarms, Self::Tags, Self::SleepLogs];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alarms => "alarms",
            Self::Tags => "tags",
            Self::SleepLogs => "sleepLogs",
        }
    }

    /// File name used by file-backed adapters.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic whole-collection replace and load. No partial updates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Replace the stored document for `key`.
    async fn save(&self, key: CollectionKey, document: &str) -> Result<(), PersistenceError>;

    /// Load the stored document for `key`; `None` when nothing was saved yet.
    async fn load(&self, key: CollectionKey) -> Result<Option<String>, PersistenceError>;
}
