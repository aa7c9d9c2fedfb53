//! Port for single-shot physical tag reads.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::TagScan;

define_port_error! {
    /// Reasons a scan session ended without a read.
    pub enum TagReaderError {
        /// The user aborted the scan.
        Cancelled => "tag scan cancelled",
        /// No tag was presented before the session expired.
        TimedOut => "tag scan timed out",
        /// The reader hardware is missing or busy.
        Unavailable { message: String } => "tag reader unavailable: {message}",
    }
}

/// A reader that performs one scan per call and invalidates itself after the
/// first read or a timeout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagReader: Send + Sync {
    async fn begin_scan(&self) -> Result<TagScan, TagReaderError>;
}
