//! In-process trigger scheduling on Tokio timers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::ports::{
    FireEvent, FireEventSender, NotificationGateway, NotificationGatewayError,
};
use crate::domain::{Trigger, TriggerId};

/// Runs one timer task per installed trigger.
///
/// Each task waits for the trigger's next local occurrence, reports a
/// [`FireEvent`], and repeats while the trigger repeats. Installing a trigger
/// whose identifier is already scheduled replaces the old timer.
pub struct TokioTriggerScheduler {
    clock: Arc<dyn Clock>,
    events: FireEventSender,
    timers: Mutex<HashMap<TriggerId, JoinHandle<()>>>,
}

impl TokioTriggerScheduler {
    pub fn new(clock: Arc<dyn Clock>, events: FireEventSender) -> Self {
        Self {
            clock,
            events,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Identifiers of the timers still running.
    pub fn scheduled_ids(&self) -> Result<Vec<TriggerId>, NotificationGatewayError> {
        let timers = self.lock_timers()?;
        let mut ids: Vec<TriggerId> = timers
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn lock_timers(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<TriggerId, JoinHandle<()>>>, NotificationGatewayError> {
        self.timers
            .lock()
            .map_err(|err| NotificationGatewayError::unavailable(err.to_string()))
    }
}

async fn run_timer(trigger: Trigger, clock: Arc<dyn Clock>, events: FireEventSender) {
    loop {
        let now = clock.local();
        let Some(next) = trigger.next_occurrence(&now) else {
            warn!(trigger_id = %trigger.id(), "trigger has no next occurrence");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        debug!(trigger_id = %trigger.id(), wait_seconds = wait.as_secs(), "timer armed");
        tokio::time::sleep(wait).await;

        let event = FireEvent {
            alarm_id: trigger.alarm_id(),
            fired_at: clock.utc(),
        };
        if !events.send(event) {
            debug!(trigger_id = %trigger.id(), "fire event consumer gone");
            return;
        }
        if !trigger.repeats() {
            return;
        }
    }
}

#[async_trait]
impl NotificationGateway for TokioTriggerScheduler {
    async fn request_authorization(&self) -> bool {
        true
    }

    async fn clear_all(&self) -> Result<(), NotificationGatewayError> {
        let mut timers = self.lock_timers()?;
        for (_, handle) in timers.drain() {
            handle.abort();
        }
        Ok(())
    }

    async fn install(&self, triggers: &[Trigger]) -> Result<(), NotificationGatewayError> {
        let mut timers = self.lock_timers()?;
        for trigger in triggers {
            let handle = tokio::spawn(run_timer(
                trigger.clone(),
                Arc::clone(&self.clock),
                self.events.clone(),
            ));
            if let Some(previous) = timers.insert(trigger.id().clone(), handle) {
                previous.abort();
            }
        }
        Ok(())
    }
}
