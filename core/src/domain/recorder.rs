//! Derivation and persistence of sleep sessions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::collections::save_collection;
use super::ports::{CollectionKey, PersistenceGateway};
use super::{SleepLog, SleepSession};

/// Turns completed ring cycles into [`SleepSession`] records.
#[derive(Clone)]
pub struct SleepSessionRecorder {
    persistence: Arc<dyn PersistenceGateway>,
}

impl SleepSessionRecorder {
    pub fn new(persistence: Arc<dyn PersistenceGateway>) -> Self {
        Self { persistence }
    }

    /// Derive a session, insert it at the head of `log`, then save the whole
    /// log.
    ///
    /// A failed save leaves the in-memory append in place.
    pub async fn record(
        &self,
        log: &mut SleepLog,
        fired_at: DateTime<Utc>,
        dismissed_at: DateTime<Utc>,
        bedtime: Option<DateTime<Utc>>,
    ) -> SleepSession {
        let session = SleepSession::from_ring(fired_at, dismissed_at, bedtime);
        log.prepend(session.clone());
        info!(
            session_id = %session.id(),
            latency_seconds = session.dismissal_latency_seconds(),
            "sleep session recorded"
        );

        save_collection(self.persistence.as_ref(), CollectionKey::SleepLogs, &*log).await;
        session
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for session recording.

    use chrono::{TimeDelta, TimeZone};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::{MockPersistenceGateway, PersistenceError};

    #[fixture]
    fn fired_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    #[tokio::test]
    async fn record_prepends_and_saves(fired_at: DateTime<Utc>) {
        let mut persistence = MockPersistenceGateway::new();
        persistence
            .expect_save()
            .withf(|key, document| {
                *key == CollectionKey::SleepLogs && document.contains("\"dismissalLatencySeconds\":45")
            })
            .times(1)
            .return_once(|_, _| Ok(()));
        let recorder = SleepSessionRecorder::new(Arc::new(persistence));
        let mut log = SleepLog::new();
        log.prepend(SleepSession::from_ring(fired_at, fired_at, None));

        let session = recorder
            .record(&mut log, fired_at, fired_at + TimeDelta::seconds(45), None)
            .await;

        assert_eq!(session.dismissal_latency_seconds(), 45);
        assert_eq!(session.duration_seconds(), 0);
        assert_eq!(log.len(), 2);
        assert_eq!(log.sessions()[0], session);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_save_keeps_in_memory_append(fired_at: DateTime<Utc>) {
        let mut persistence = MockPersistenceGateway::new();
        persistence
            .expect_save()
            .times(1)
            .return_once(|_, _| Err(PersistenceError::io("read-only volume")));
        let recorder = SleepSessionRecorder::new(Arc::new(persistence));
        let mut log = SleepLog::new();

        let session = recorder
            .record(&mut log, fired_at, fired_at + TimeDelta::seconds(10), None)
            .await;

        assert_eq!(log.sessions(), &[session]);
    }
}
