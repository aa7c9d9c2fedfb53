//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: JSON documents in a capability-scoped directory, plus an
//!   in-memory store for tests and dry runs.
//! - **notifications**: Tokio-timer scheduler.
//! - **credentials**: PIN fallback verifier.
//! - **tag_reader**: reader used on hosts without tag hardware.
//!
//! Adapters translate between domain types and host mechanics only.

pub mod credentials;
pub mod notifications;
pub mod persistence;
pub mod tag_reader;
