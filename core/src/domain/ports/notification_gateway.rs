//! Port for the host notification scheduler.
//!
//! Installation follows a full-replace policy: callers clear every trigger
//! previously installed for the app before installing a fresh set. Fired
//! triggers travel back to the state owner over a single-consumer channel
//! rather than a broadcast.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::define_port_error;
use crate::domain::{AlarmId, Trigger};

define_port_error! {
    /// Errors raised while talking to the host scheduler.
    pub enum NotificationGatewayError {
        /// The scheduler could not be reached.
        Unavailable { message: String } => "notification scheduler unavailable: {message}",
        /// The scheduler refused a trigger.
        Rejected { trigger_id: String, message: String } =>
            "notification scheduler rejected {trigger_id}: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Ask the host for permission to deliver alarms. `false` means alarms
    /// will not fire.
    async fn request_authorization(&self) -> bool;

    /// Remove every trigger previously installed for this app.
    async fn clear_all(&self) -> Result<(), NotificationGatewayError>;

    /// Install `triggers`. Identifiers already present are superseded.
    async fn install(&self, triggers: &[Trigger]) -> Result<(), NotificationGatewayError>;
}

/// A trigger fired on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireEvent {
    pub alarm_id: AlarmId,
    pub fired_at: DateTime<Utc>,
}

/// Producer half of the fire-event channel, held by gateway adapters.
#[derive(Debug, Clone)]
pub struct FireEventSender(mpsc::UnboundedSender<FireEvent>);

impl FireEventSender {
    /// Deliver an event. Returns `false` once the consumer has gone away.
    pub fn send(&self, event: FireEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

/// Consumer half of the fire-event channel, owned by the state owner.
#[derive(Debug)]
pub struct FireEventReceiver(mpsc::UnboundedReceiver<FireEvent>);

impl FireEventReceiver {
    /// Wait for the next event; `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<FireEvent> {
        self.0.recv().await
    }
}

/// Create a single-consumer fire-event channel.
pub fn fire_channel() -> (FireEventSender, FireEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FireEventSender(tx), FireEventReceiver(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_order() {
        let (tx, mut rx) = fire_channel();
        let first = FireEvent {
            alarm_id: AlarmId::random(),
            fired_at: Utc::now(),
        };
        let second = FireEvent {
            alarm_id: AlarmId::random(),
            fired_at: Utc::now(),
        };

        assert!(tx.send(first));
        assert!(tx.clone().send(second));
        drop(tx);

        assert_eq!(rx.recv().await, Some(first));
        assert_eq!(rx.recv().await, Some(second));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn send_fails_after_consumer_dropped() {
        let (tx, rx) = fire_channel();
        drop(rx);
        assert!(!tx.send(FireEvent {
            alarm_id: AlarmId::random(),
            fired_at: Utc::now(),
        }));
    }
}
