//! Tag reader for hosts without tag hardware.

use async_trait::async_trait;

use crate::domain::TagScan;
use crate::domain::ports::{TagReader, TagReaderError};

/// Reports every scan as unavailable, leaving the credential fallback as the
/// only dismissal path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableTagReader;

#[async_trait]
impl TagReader for UnavailableTagReader {
    async fn begin_scan(&self) -> Result<TagScan, TagReaderError> {
        Err(TagReaderError::unavailable("no tag reader on this host"))
    }
}
