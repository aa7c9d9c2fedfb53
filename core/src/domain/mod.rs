//! Domain primitives, decision functions, and the single state owner.
//!
//! Purpose: keep every rule about alarms, triggers, dismissal, and sleep
//! sessions free of host mechanics. Host services (notification scheduling,
//! tag reading, credential prompts, document storage) are reached only
//! through the traits in [`ports`].
//!
//! Public surface:
//! - [`AlarmDefinition`] / [`AlarmDraft`] : validated recurring alarm.
//! - [`TagRecord`] / [`TagUid`] : registered physical tags.
//! - [`AlarmStore`] : alarm and tag collections with integrity rules.
//! - [`expand_triggers`] : alarm definitions to host-schedulable triggers.
//! - [`DismissalAuthority`] : ring context plus evidence to allow/deny.
//! - [`RingLifecycleController`] : idle/ringing state machine.
//! - [`SleepSessionRecorder`] : derives and persists sleep sessions.
//! - [`AlarmClock`] : the state owner wiring all of the above to the ports.

mod alarm;
mod alarm_clock;
mod collections;
mod dismissal;
pub mod ports;
mod recorder;
mod ring;
mod scan_guard;
mod sleep;
mod store;
mod tag;
mod trigger;

pub use self::alarm::{AlarmDefinition, AlarmDraft, AlarmId, AlarmValidationError, RepeatRule};
pub use self::alarm_clock::{
    AlarmClock, AlarmClockError, AlarmClockPorts, DismissOutcome, StateSnapshot,
};
pub use self::dismissal::{
    CredentialResult, Decision, DenyReason, DismissalAuthority, Evidence, TagScan,
};
pub use self::recorder::SleepSessionRecorder;
pub use self::ring::{
    CompletedRing, DismissAttempt, FireOutcome, RingContext, RingLifecycleController, RingState,
};
pub use self::scan_guard::{ScanPermit, ScanSlot};
pub use self::sleep::{SleepLog, SleepSession, SleepSessionId, SleepStats};
pub use self::store::{AlarmStore, StoreError};
pub use self::tag::{TagId, TagRecord, TagUid, TagValidationError};
pub use self::trigger::{Trigger, TriggerId, Weekday, expand_triggers};
