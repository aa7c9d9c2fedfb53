//! Alarm-clock core: trigger expansion, tag-gated dismissal, and sleep
//! session recording.
//!
//! The crate is laid out as a small hexagon. [`domain`] owns the data model,
//! the pure decision functions, the ring state machine, and the port traits
//! the host must implement. [`outbound`] carries the adapters that ship with
//! the crate (JSON-file persistence, a Tokio timer scheduler, a PIN-backed
//! credential verifier). [`config`] loads layered settings for the
//! `sleepyctl` binary.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
