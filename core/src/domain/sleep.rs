//! Sleep session records and summary statistics.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable sleep session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SleepSessionId(Uuid);

impl SleepSessionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SleepSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One completed ring-to-dismiss cycle.
///
/// Sessions are created once and never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSession {
    id: SleepSessionId,
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bedtime: Option<DateTime<Utc>>,
    wake_time: DateTime<Utc>,
    dismissal_latency_seconds: u64,
}

impl SleepSession {
    /// Derive a session from a completed ring interval.
    ///
    /// Latency is the whole number of seconds between fire and dismissal,
    /// clamped to zero when the clock moved backwards.
    pub fn from_ring(
        fired_at: DateTime<Utc>,
        dismissed_at: DateTime<Utc>,
        bedtime: Option<DateTime<Utc>>,
    ) -> Self {
        let latency = (dismissed_at - fired_at).num_seconds();
        Self {
            id: SleepSessionId::random(),
            date: dismissed_at.date_naive(),
            bedtime,
            wake_time: dismissed_at,
            dismissal_latency_seconds: u64::try_from(latency).unwrap_or(0),
        }
    }

    pub fn id(&self) -> SleepSessionId {
        self.id
    }

    /// Calendar date (UTC) on which the alarm was dismissed.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn bedtime(&self) -> Option<DateTime<Utc>> {
        self.bedtime
    }

    pub fn wake_time(&self) -> DateTime<Utc> {
        self.wake_time
    }

    pub fn dismissal_latency_seconds(&self) -> u64 {
        self.dismissal_latency_seconds
    }

    /// `max(0, wake_time - bedtime)` in seconds, or 0 without a bedtime.
    pub fn duration_seconds(&self) -> u64 {
        self.bedtime
            .map(|bedtime| (self.wake_time - bedtime).num_seconds())
            .and_then(|seconds| u64::try_from(seconds).ok())
            .unwrap_or(0)
    }
}

/// Append-only session log ordered most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SleepLog(Vec<SleepSession>);

impl SleepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session at the head of the log.
    pub fn prepend(&mut self, session: SleepSession) {
        self.0.insert(0, session);
    }

    pub fn sessions(&self) -> &[SleepSession] {
        self.0.as_slice()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<SleepSession>> for SleepLog {
    fn from(value: Vec<SleepSession>) -> Self {
        Self(value)
    }
}

/// Summary figures derived from a [`SleepLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepStats {
    pub session_count: usize,
    /// Mean duration over sessions with a positive duration.
    pub average_duration_seconds: Option<u64>,
    pub average_dismissal_latency_seconds: Option<u64>,
}

impl SleepStats {
    pub fn from_log(log: &SleepLog) -> Self {
        let durations: Vec<u64> = log
            .sessions()
            .iter()
            .map(SleepSession::duration_seconds)
            .filter(|seconds| *seconds > 0)
            .collect();
        let latencies: Vec<u64> = log
            .sessions()
            .iter()
            .map(SleepSession::dismissal_latency_seconds)
            .collect();

        Self {
            session_count: log.len(),
            average_duration_seconds: mean(&durations),
            average_dismissal_latency_seconds: mean(&latencies),
        }
    }
}

fn mean(values: &[u64]) -> Option<u64> {
    let count = u64::try_from(values.len()).ok().filter(|count| *count > 0)?;
    let total = values.iter().fold(0_u64, |acc, value| acc.saturating_add(*value));
    Some(total / count)
}
