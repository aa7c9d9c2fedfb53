//! Persistence adapters for whole-collection documents.

mod atomic_write;
mod json_file_store;
mod memory_store;

pub use json_file_store::JsonFileStore;
pub use memory_store::InMemoryCollectionStore;
