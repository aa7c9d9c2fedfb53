//! Idle/ringing state machine for a single active alarm.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{AlarmId, Decision, DenyReason, DismissalAuthority, Evidence};

/// The alarm currently ringing and when it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RingContext {
    alarm_id: AlarmId,
    fired_at: DateTime<Utc>,
}

impl RingContext {
    pub fn new(alarm_id: AlarmId, fired_at: DateTime<Utc>) -> Self {
        Self { alarm_id, fired_at }
    }

    pub fn alarm_id(&self) -> AlarmId {
        self.alarm_id
    }

    pub fn fired_at(&self) -> DateTime<Utc> {
        self.fired_at
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RingState {
    #[default]
    Idle,
    Ringing(RingContext),
}

/// Result of reporting a fired trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The controller moved from idle to ringing.
    Started,
    /// Another alarm was already ringing; its context was kept.
    AlreadyRinging,
}

/// A ring cycle that ended with an allowed dismissal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedRing {
    pub alarm_id: AlarmId,
    pub fired_at: DateTime<Utc>,
    pub dismissed_at: DateTime<Utc>,
}

/// Result of a dismissal attempt against the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissAttempt {
    Dismissed(CompletedRing),
    /// Evidence was rejected; the ring context is unchanged.
    Denied(DenyReason),
    /// The controller was idle.
    NothingRinging,
}

/// Tracks at most one ring context.
///
/// Overlapping fire reports are ignored rather than queued. Only an
/// [`Decision::Allow`] from the [`DismissalAuthority`] returns the controller
/// to idle; denial and cancelled evidence gathering leave it ringing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingLifecycleController {
    state: RingState,
}

impl RingLifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RingState {
        self.state
    }

    pub fn context(&self) -> Option<&RingContext> {
        match &self.state {
            RingState::Idle => None,
            RingState::Ringing(context) => Some(context),
        }
    }

    pub fn is_ringing(&self) -> bool {
        matches!(self.state, RingState::Ringing(_))
    }

    pub fn on_trigger_fired(&mut self, alarm_id: AlarmId, fired_at: DateTime<Utc>) -> FireOutcome {
        if let RingState::Ringing(current) = &self.state {
            debug!(
                alarm_id = %alarm_id,
                ringing_alarm_id = %current.alarm_id(),
                "ignoring fire event while already ringing"
            );
            return FireOutcome::AlreadyRinging;
        }

        info!(alarm_id = %alarm_id, fired_at = %fired_at, "alarm ringing");
        self.state = RingState::Ringing(RingContext::new(alarm_id, fired_at));
        FireOutcome::Started
    }

    /// Ask `authority` whether `evidence` silences the active alarm.
    pub fn attempt_dismiss(
        &mut self,
        authority: &DismissalAuthority<'_>,
        evidence: &Evidence,
        now: DateTime<Utc>,
    ) -> DismissAttempt {
        let Some(context) = self.context().copied() else {
            debug!("dismissal attempted while idle");
            return DismissAttempt::NothingRinging;
        };

        match authority.decide(Some(&context), evidence) {
            Decision::Allow => {
                self.state = RingState::Idle;
                info!(alarm_id = %context.alarm_id(), "alarm dismissed");
                DismissAttempt::Dismissed(CompletedRing {
                    alarm_id: context.alarm_id(),
                    fired_at: context.fired_at(),
                    dismissed_at: now,
                })
            }
            Decision::Deny(reason) => {
                info!(alarm_id = %context.alarm_id(), ?reason, "dismissal denied");
                DismissAttempt::Denied(reason)
            }
        }
    }
}
