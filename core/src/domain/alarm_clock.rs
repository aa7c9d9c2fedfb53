//! The single state owner.
//!
//! `AlarmClock` serialises every mutation of the alarm store, tag collection,
//! session log, and ring controller behind one async mutex. Each mutation
//! persists the affected collections and publishes a fresh [`StateSnapshot`]
//! to subscribers. Rescheduling is an explicit caller step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use super::collections::{load_collection, save_collection};
use super::ports::{
    CollectionKey, CredentialVerifier, FireEventReceiver, NotificationGateway,
    NotificationGatewayError, PersistenceGateway, TagReader, TagReaderError,
};
use super::{
    AlarmDefinition, AlarmDraft, AlarmId, AlarmStore, AlarmValidationError, DenyReason,
    DismissAttempt, DismissalAuthority, Evidence, FireOutcome, RingContext,
    RingLifecycleController, RingState,
    ScanSlot, SleepLog, SleepSession, SleepSessionRecorder, SleepStats, StoreError, TagId,
    TagRecord, TagUid, TagValidationError, expand_triggers,
};

const DEFAULT_DISMISS_REASON: &str = "Dismiss alarm";

/// Errors raised by [`AlarmClock`] data mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlarmClockError {
    #[error(transparent)]
    Validation(#[from] AlarmValidationError),
    #[error(transparent)]
    Tag(#[from] TagValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a dismissal request made through the state owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissOutcome {
    /// The alarm stopped and this session was recorded.
    Dismissed(SleepSession),
    /// Evidence was rejected; the alarm keeps ringing.
    Denied(DenyReason),
    NothingRinging,
    /// The ring the evidence was gathered for ended before it was presented.
    RingEnded,
    /// The tag scan ended without a read; the alarm keeps ringing.
    ScanAborted(TagReaderError),
    /// Another tag scan is already in flight.
    ScanInProgress,
}

/// Immutable view published after every mutation or transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub alarms: Vec<AlarmDefinition>,
    pub tags: Vec<TagRecord>,
    pub sessions: Vec<SleepSession>,
    pub ring: RingState,
}

/// Host collaborators required by [`AlarmClock`].
#[derive(Clone)]
pub struct AlarmClockPorts {
    pub notifications: Arc<dyn NotificationGateway>,
    pub tag_reader: Arc<dyn TagReader>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub persistence: Arc<dyn PersistenceGateway>,
}

#[derive(Debug, Default)]
struct CoreState {
    store: AlarmStore,
    log: SleepLog,
    ring: RingLifecycleController,
}

impl CoreState {
    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            alarms: self.store.alarms().to_vec(),
            tags: self.store.tags().to_vec(),
            sessions: self.log.sessions().to_vec(),
            ring: self.ring.state(),
        }
    }
}

/// Owns alarm, tag, session, and ring state and mediates all access to it.
pub struct AlarmClock {
    ports: AlarmClockPorts,
    clock: Arc<dyn Clock>,
    recorder: SleepSessionRecorder,
    state: Mutex<CoreState>,
    snapshots: watch::Sender<StateSnapshot>,
    scan_slot: ScanSlot,
    dismiss_reason: String,
}

impl AlarmClock {
    /// Create a clock with empty collections.
    pub fn new(ports: AlarmClockPorts, clock: Arc<dyn Clock>) -> Self {
        Self::with_state(ports, clock, AlarmStore::new(), SleepLog::new())
    }

    /// Create a clock over previously loaded collections.
    pub fn with_state(
        ports: AlarmClockPorts,
        clock: Arc<dyn Clock>,
        store: AlarmStore,
        log: SleepLog,
    ) -> Self {
        let state = CoreState {
            store,
            log,
            ring: RingLifecycleController::new(),
        };
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            recorder: SleepSessionRecorder::new(Arc::clone(&ports.persistence)),
            ports,
            clock,
            state: Mutex::new(state),
            snapshots,
            scan_slot: ScanSlot::new(),
            dismiss_reason: DEFAULT_DISMISS_REASON.to_owned(),
        }
    }

    /// Load every collection, then ask the host for notification permission.
    ///
    /// Each collection falls back to empty independently when it cannot be
    /// loaded. A permission denial is logged and otherwise ignored.
    pub async fn bootstrap(ports: AlarmClockPorts, clock: Arc<dyn Clock>) -> Self {
        let persistence = ports.persistence.as_ref();
        let alarms: Vec<AlarmDefinition> =
            load_collection(persistence, CollectionKey::Alarms).await;
        let tags: Vec<TagRecord> = load_collection(persistence, CollectionKey::Tags).await;
        let log: SleepLog = load_collection(persistence, CollectionKey::SleepLogs).await;

        let store = AlarmStore::restore(alarms, tags);
        info!(
            alarm_count = store.alarms().len(),
            tag_count = store.tags().len(),
            session_count = log.len(),
            "alarm clock state loaded"
        );

        let authorized = ports.notifications.request_authorization().await;
        if !authorized {
            warn!("notification authorisation denied; alarms will not fire");
        }

        Self::with_state(ports, clock, store, log)
    }

    /// Override the reason shown by the credential prompt.
    pub fn with_dismiss_reason(mut self, reason: impl Into<String>) -> Self {
        self.dismiss_reason = reason.into();
        self
    }

    /// Receive a snapshot after every mutation or ring transition.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.snapshots.borrow().clone()
    }

    pub async fn ring_state(&self) -> RingState {
        self.state.lock().await.ring.state()
    }

    pub async fn sleep_stats(&self) -> SleepStats {
        SleepStats::from_log(&self.state.lock().await.log)
    }

    pub async fn add_alarm(&self, draft: AlarmDraft) -> Result<AlarmId, AlarmClockError> {
        let alarm = AlarmDefinition::new(draft)?;
        let id = alarm.id();
        let mut state = self.state.lock().await;
        state.store.add_alarm(alarm)?;
        info!(alarm_id = %id, "alarm added");
        self.persist_alarms(&state).await;
        self.publish(&state);
        Ok(id)
    }

    pub async fn update_alarm(&self, draft: AlarmDraft) -> Result<(), AlarmClockError> {
        let alarm = AlarmDefinition::new(draft)?;
        let mut state = self.state.lock().await;
        state.store.update_alarm(alarm)?;
        self.persist_alarms(&state).await;
        self.publish(&state);
        Ok(())
    }

    pub async fn remove_alarm(&self, id: AlarmId) -> Result<AlarmDefinition, AlarmClockError> {
        let mut state = self.state.lock().await;
        let removed = state.store.remove_alarm(id)?;
        info!(alarm_id = %id, "alarm removed");
        self.persist_alarms(&state).await;
        self.publish(&state);
        Ok(removed)
    }

    pub async fn set_alarm_enabled(&self, id: AlarmId, enabled: bool) -> Result<(), AlarmClockError> {
        let mut state = self.state.lock().await;
        state.store.set_alarm_enabled(id, enabled)?;
        self.persist_alarms(&state).await;
        self.publish(&state);
        Ok(())
    }

    /// Flip an alarm's enabled flag, returning the new value.
    pub async fn toggle_alarm(&self, id: AlarmId) -> Result<bool, AlarmClockError> {
        let mut state = self.state.lock().await;
        let enabled = state.store.toggle_alarm(id)?;
        self.persist_alarms(&state).await;
        self.publish(&state);
        Ok(enabled)
    }

    /// Register a tag by nickname and raw uid.
    pub async fn add_tag(
        &self,
        nickname: impl Into<String>,
        uid: &str,
    ) -> Result<TagId, AlarmClockError> {
        let record = TagRecord::new(nickname, TagUid::new(uid)?);
        let id = record.id();
        let mut state = self.state.lock().await;
        state.store.add_tag(record)?;
        info!(tag_id = %id, "tag registered");
        save_collection(
            self.ports.persistence.as_ref(),
            CollectionKey::Tags,
            state.store.tags(),
        )
        .await;
        self.publish(&state);
        Ok(id)
    }

    pub async fn remove_tag(&self, id: TagId) -> Result<TagRecord, AlarmClockError> {
        let mut state = self.state.lock().await;
        let removed = state.store.remove_tag(id)?;
        info!(tag_id = %id, "tag removed");
        save_collection(
            self.ports.persistence.as_ref(),
            CollectionKey::Tags,
            state.store.tags(),
        )
        .await;
        self.publish(&state);
        Ok(removed)
    }

    /// Expand the current alarms and install them with a full replace.
    ///
    /// Returns the number of installed triggers.
    pub async fn reschedule(&self) -> Result<usize, NotificationGatewayError> {
        let triggers = {
            let state = self.state.lock().await;
            expand_triggers(state.store.alarms())
        };

        self.ports.notifications.clear_all().await?;
        self.ports.notifications.install(&triggers).await?;
        info!(trigger_count = triggers.len(), "triggers rescheduled");
        Ok(triggers.len())
    }

    pub async fn on_trigger_fired(&self, alarm_id: AlarmId, fired_at: DateTime<Utc>) -> FireOutcome {
        let mut state = self.state.lock().await;
        let outcome = state.ring.on_trigger_fired(alarm_id, fired_at);
        if outcome == FireOutcome::Started {
            self.publish(&state);
        }
        outcome
    }

    /// Consume fire events until every sender is dropped.
    pub async fn run_fire_events(&self, mut events: FireEventReceiver) {
        while let Some(event) = events.recv().await {
            self.on_trigger_fired(event.alarm_id, event.fired_at).await;
        }
    }

    /// Present `evidence` to silence the ringing alarm.
    ///
    /// On an allowed dismissal the ring interval is recorded as a
    /// [`SleepSession`] stamped with the current clock time.
    pub async fn attempt_dismiss(&self, evidence: Evidence) -> DismissOutcome {
        let mut state = self.state.lock().await;
        self.dismiss_locked(&mut state, &evidence).await
    }

    /// Present `evidence` gathered while `context` was ringing.
    ///
    /// Returns [`DismissOutcome::RingEnded`] without consulting the authority
    /// when that ring is no longer the current one.
    pub async fn attempt_dismiss_for(
        &self,
        context: RingContext,
        evidence: Evidence,
    ) -> DismissOutcome {
        let mut state = self.state.lock().await;
        if state.ring.context() != Some(&context) {
            info!(
                alarm_id = %context.alarm_id(),
                "ring ended before dismissal evidence arrived"
            );
            return DismissOutcome::RingEnded;
        }
        self.dismiss_locked(&mut state, &evidence).await
    }

    async fn dismiss_locked(&self, state: &mut CoreState, evidence: &Evidence) -> DismissOutcome {
        let CoreState { store, log, ring } = &mut *state;
        let authority = DismissalAuthority::new(store);

        match ring.attempt_dismiss(&authority, evidence, self.clock.utc()) {
            DismissAttempt::NothingRinging => DismissOutcome::NothingRinging,
            DismissAttempt::Denied(reason) => DismissOutcome::Denied(reason),
            DismissAttempt::Dismissed(completed) => {
                let session = self
                    .recorder
                    .record(log, completed.fired_at, completed.dismissed_at, None)
                    .await;
                self.publish(state);
                DismissOutcome::Dismissed(session)
            }
        }
    }

    /// Run one tag-scan session and present its result.
    ///
    /// Only one scan may be in flight; a concurrent request returns
    /// [`DismissOutcome::ScanInProgress`] without touching the reader. A
    /// cancelled or failed scan leaves the alarm ringing. The scan only
    /// counts against the ring that was current when it started.
    pub async fn dismiss_with_tag_scan(&self) -> DismissOutcome {
        let Some(context) = self.ringing_context().await else {
            return DismissOutcome::NothingRinging;
        };
        let Some(_permit) = self.scan_slot.try_acquire() else {
            info!("tag scan already in progress");
            return DismissOutcome::ScanInProgress;
        };

        match self.ports.tag_reader.begin_scan().await {
            Ok(scan) => {
                self.attempt_dismiss_for(context, Evidence::TagScan(scan))
                    .await
            }
            Err(err) => {
                info!(error = %err, "tag scan ended without a read");
                DismissOutcome::ScanAborted(err)
            }
        }
    }

    /// Prompt for the fallback credential and present its result.
    pub async fn dismiss_with_credential(&self) -> DismissOutcome {
        let Some(context) = self.ringing_context().await else {
            return DismissOutcome::NothingRinging;
        };
        let success = self
            .ports
            .credentials
            .authenticate(&self.dismiss_reason)
            .await;
        self.attempt_dismiss_for(context, Evidence::Credential(success.into()))
            .await
    }

    async fn ringing_context(&self) -> Option<RingContext> {
        self.state.lock().await.ring.context().copied()
    }

    async fn persist_alarms(&self, state: &CoreState) {
        save_collection(
            self.ports.persistence.as_ref(),
            CollectionKey::Alarms,
            state.store.alarms(),
        )
        .await;
    }

    fn publish(&self, state: &CoreState) {
        self.snapshots.send_replace(state.snapshot());
    }
}

#[cfg(test)]
#[path = "alarm_clock_tests.rs"]
mod tests;
