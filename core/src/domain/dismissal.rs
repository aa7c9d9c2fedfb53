//! Decision function gating alarm dismissal.

use super::{AlarmStore, RingContext, TagUid};

/// Raw result of a single tag scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagScan {
    uid: String,
}

impl TagScan {
    /// Wrap the uid string reported by the tag reader.
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }

    pub fn uid(&self) -> &str {
        self.uid.as_str()
    }
}

/// Outcome of a fallback credential check (biometric or PIN).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialResult {
    success: bool,
}

impl CredentialResult {
    pub const fn succeeded() -> Self {
        Self { success: true }
    }

    pub const fn failed() -> Self {
        Self { success: false }
    }

    pub const fn is_success(self) -> bool {
        self.success
    }
}

impl From<bool> for CredentialResult {
    fn from(success: bool) -> Self {
        Self { success }
    }
}

/// Evidence presented to silence a ringing alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    TagScan(TagScan),
    Credential(CredentialResult),
}

/// Why a dismissal attempt was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No ring context is active.
    NothingRinging,
    /// The ringing alarm is no longer in the store.
    UnknownAlarm,
    /// Tag scans never silence an alarm without a bound tag.
    AlarmNotBound,
    /// The alarm's bound tag record has been removed.
    BoundTagMissing,
    /// The scanned uid is not a valid hex uid.
    MalformedScan,
    /// The scanned uid differs from the bound tag's uid.
    TagMismatch,
    /// The credential check reported failure.
    CredentialRejected,
}

/// Allow/deny verdict. Carries the reason on denial for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Converts a ring context and presented evidence into a [`Decision`].
///
/// Pure: it reads the store and never mutates ring state; the controller
/// applies whatever transition follows.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use sleepy_core::domain::{
///     AlarmId, AlarmStore, CredentialResult, Decision, DismissalAuthority, Evidence, RingContext,
/// };
///
/// let store = AlarmStore::new();
/// let context = RingContext::new(AlarmId::random(), Utc::now());
/// let authority = DismissalAuthority::new(&store);
/// let decision = authority.decide(
///     Some(&context),
///     &Evidence::Credential(CredentialResult::succeeded()),
/// );
/// assert_eq!(decision, Decision::Allow);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DismissalAuthority<'a> {
    store: &'a AlarmStore,
}

impl<'a> DismissalAuthority<'a> {
    pub fn new(store: &'a AlarmStore) -> Self {
        Self { store }
    }

    /// Decide whether `evidence` silences the alarm in `context`.
    ///
    /// - Tag scan: allowed iff the ringing alarm is bound to a registered tag
    ///   whose uid equals the scanned uid.
    /// - Credential: allowed iff the check succeeded, regardless of binding.
    /// - Missing context: always denied.
    pub fn decide(&self, context: Option<&RingContext>, evidence: &Evidence) -> Decision {
        let Some(context) = context else {
            return Decision::Deny(DenyReason::NothingRinging);
        };

        match evidence {
            Evidence::Credential(result) if result.is_success() => Decision::Allow,
            Evidence::Credential(_) => Decision::Deny(DenyReason::CredentialRejected),
            Evidence::TagScan(scan) => self.decide_scan(context, scan),
        }
    }

    fn decide_scan(&self, context: &RingContext, scan: &TagScan) -> Decision {
        let Some(alarm) = self.store.alarm(context.alarm_id()) else {
            return Decision::Deny(DenyReason::UnknownAlarm);
        };
        let Some(tag_id) = alarm.tag_id() else {
            return Decision::Deny(DenyReason::AlarmNotBound);
        };
        let Some(tag) = self.store.tag(tag_id) else {
            return Decision::Deny(DenyReason::BoundTagMissing);
        };
        let Ok(scanned) = TagUid::new(scan.uid()) else {
            return Decision::Deny(DenyReason::MalformedScan);
        };

        if *tag.uid() == scanned {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::TagMismatch)
        }
    }
}
