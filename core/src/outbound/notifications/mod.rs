//! Notification gateway adapters.

mod tokio_scheduler;

pub use tokio_scheduler::TokioTriggerScheduler;
