//! End-to-end ring cycles through the state owner and shipped adapters.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use chrono::{DateTime, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use sleepy_core::domain::ports::{
    CollectionKey, CredentialVerifier, NotificationGateway, NotificationGatewayError,
    PersistenceGateway, TagReader, TagReaderError, fire_channel,
};
use sleepy_core::domain::{
    AlarmClock, AlarmClockPorts, AlarmDraft, DismissOutcome, RepeatRule, RingState, TagScan,
    Trigger, expand_triggers,
};
use sleepy_core::outbound::notifications::TokioTriggerScheduler;
use sleepy_core::outbound::persistence::{InMemoryCollectionStore, JsonFileStore};
use sleepy_core::test_support::MutableClock;

fn seven_am() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Gateway that remembers the last installed trigger set.
#[derive(Default)]
struct RecordingGateway {
    installed: Mutex<Vec<Trigger>>,
}

impl RecordingGateway {
    fn installed(&self) -> Vec<Trigger> {
        self.installed.lock().expect("gateway lock").clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn request_authorization(&self) -> bool {
        true
    }

    async fn clear_all(&self) -> Result<(), NotificationGatewayError> {
        self.installed.lock().expect("gateway lock").clear();
        Ok(())
    }

    async fn install(&self, triggers: &[Trigger]) -> Result<(), NotificationGatewayError> {
        self.installed
            .lock()
            .expect("gateway lock")
            .extend_from_slice(triggers);
        Ok(())
    }
}

struct FixedCredential(bool);

#[async_trait]
impl CredentialVerifier for FixedCredential {
    async fn authenticate(&self, _reason: &str) -> bool {
        self.0
    }
}

struct FixedTagReader(&'static str);

#[async_trait]
impl TagReader for FixedTagReader {
    async fn begin_scan(&self) -> Result<TagScan, TagReaderError> {
        Ok(TagScan::new(self.0))
    }
}

struct World {
    clock: Arc<MutableClock>,
    gateway: Arc<RecordingGateway>,
    persistence: Arc<InMemoryCollectionStore>,
}

impl World {
    fn ports(&self, credential_ok: bool, scanned_uid: &'static str) -> AlarmClockPorts {
        AlarmClockPorts {
            notifications: self.gateway.clone(),
            tag_reader: Arc::new(FixedTagReader(scanned_uid)),
            credentials: Arc::new(FixedCredential(credential_ok)),
            persistence: self.persistence.clone(),
        }
    }

    fn alarm_clock(&self, credential_ok: bool) -> AlarmClock {
        AlarmClock::new(self.ports(credential_ok, "00000000"), self.clock.clone())
    }
}

#[fixture]
fn world() -> World {
    World {
        clock: Arc::new(MutableClock::new(seven_am())),
        gateway: Arc::new(RecordingGateway::default()),
        persistence: Arc::new(InMemoryCollectionStore::new()),
    }
}

#[rstest]
#[tokio::test]
async fn weekday_alarm_schedules_five_triggers_until_disabled(world: World) {
    let alarm_clock = world.alarm_clock(true);
    let id = alarm_clock
        .add_alarm(AlarmDraft {
            hour: 6,
            minute: 30,
            enabled: true,
            repeat_rule: RepeatRule::Weekdays,
            ..AlarmDraft::default()
        })
        .await
        .expect("alarm added");

    assert_eq!(alarm_clock.reschedule().await, Ok(5));
    let installed = world.gateway.installed();
    let weekdays: Vec<u8> = installed
        .iter()
        .filter_map(|trigger| trigger.weekday().map(|day| day.number()))
        .collect();
    assert_eq!(weekdays, vec![2, 3, 4, 5, 6]);
    assert!(
        installed
            .iter()
            .all(|t| t.hour() == 6 && t.minute() == 30 && t.repeats())
    );

    alarm_clock
        .set_alarm_enabled(id, false)
        .await
        .expect("alarm disabled");
    alarm_clock.reschedule().await.expect("reschedule");

    assert!(
        world
            .gateway
            .installed()
            .iter()
            .all(|trigger| trigger.alarm_id() != id)
    );
    assert!(expand_triggers(&alarm_clock.snapshot().alarms).is_empty());
}

#[rstest]
#[tokio::test]
async fn credential_dismissal_forty_seconds_after_fire(world: World) {
    let alarm_clock = world.alarm_clock(true);
    let id = alarm_clock
        .add_alarm(AlarmDraft::default())
        .await
        .expect("alarm added");
    alarm_clock.on_trigger_fired(id, seven_am()).await;
    world.clock.advance_seconds(40);

    let outcome = alarm_clock.dismiss_with_credential().await;

    let DismissOutcome::Dismissed(session) = outcome else {
        panic!("expected dismissal, got {outcome:?}");
    };
    assert_eq!(session.dismissal_latency_seconds(), 40);
    assert_eq!(session.wake_time(), world.clock.utc());
    assert_eq!(alarm_clock.ring_state().await, RingState::Idle);

    let stored = world
        .persistence
        .document(CollectionKey::SleepLogs)
        .expect("sleep log saved");
    assert!(stored.contains("\"dismissalLatencySeconds\":40"));
}

#[rstest]
#[tokio::test]
async fn denied_attempts_can_be_retried(world: World) {
    let alarm_clock = AlarmClock::new(world.ports(false, "00000000"), world.clock.clone());
    let tag_id = alarm_clock
        .add_tag("Bathroom", "AB12CD34")
        .await
        .expect("tag added");
    let alarm_id = alarm_clock
        .add_alarm(AlarmDraft {
            tag_id: Some(tag_id),
            ..AlarmDraft::default()
        })
        .await
        .expect("alarm added");
    alarm_clock.on_trigger_fired(alarm_id, seven_am()).await;

    for _ in 0..3 {
        assert!(matches!(
            alarm_clock.dismiss_with_tag_scan().await,
            DismissOutcome::Denied(_)
        ));
        assert!(matches!(
            alarm_clock.dismiss_with_credential().await,
            DismissOutcome::Denied(_)
        ));
    }
    assert!(matches!(alarm_clock.ring_state().await, RingState::Ringing(_)));
    assert!(alarm_clock.snapshot().sessions.is_empty());
}

#[rstest]
#[tokio::test]
async fn bound_tag_scan_dismisses(world: World) {
    let alarm_clock = AlarmClock::new(world.ports(false, "ab12cd34"), world.clock.clone());
    let tag_id = alarm_clock
        .add_tag("Bathroom", "AB12CD34")
        .await
        .expect("tag added");
    let alarm_id = alarm_clock
        .add_alarm(AlarmDraft {
            tag_id: Some(tag_id),
            ..AlarmDraft::default()
        })
        .await
        .expect("alarm added");
    alarm_clock.on_trigger_fired(alarm_id, seven_am()).await;
    world.clock.advance_seconds(5);

    assert!(matches!(
        alarm_clock.dismiss_with_tag_scan().await,
        DismissOutcome::Dismissed(session) if session.dismissal_latency_seconds() == 5
    ));
}

#[rstest]
#[tokio::test]
async fn state_survives_restart_through_json_files(world: World) {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data_dir = Utf8PathBuf::from_path_buf(temp.path().join("sleepy")).expect("utf-8 path");
    let persistence: Arc<dyn PersistenceGateway> =
        Arc::new(JsonFileStore::open(&data_dir).expect("open store"));
    let ports = |credential_ok| AlarmClockPorts {
        notifications: world.gateway.clone(),
        tag_reader: Arc::new(FixedTagReader("00000000")),
        credentials: Arc::new(FixedCredential(credential_ok)),
        persistence: Arc::clone(&persistence),
    };

    let first = AlarmClock::bootstrap(ports(true), world.clock.clone()).await;
    let tag_id = first.add_tag("", "0a0b").await.expect("tag added");
    let alarm_id = first
        .add_alarm(AlarmDraft {
            tag_id: Some(tag_id),
            repeat_rule: RepeatRule::Weekends,
            ..AlarmDraft::default()
        })
        .await
        .expect("alarm added");
    first.on_trigger_fired(alarm_id, seven_am()).await;
    world.clock.advance_seconds(90);
    first.dismiss_with_credential().await;
    drop(first);

    let second = AlarmClock::bootstrap(ports(true), world.clock.clone()).await;
    let snapshot = second.snapshot();

    assert_eq!(snapshot.alarms.len(), 1);
    assert_eq!(snapshot.alarms[0].id(), alarm_id);
    assert_eq!(snapshot.alarms[0].repeat_rule(), RepeatRule::Weekends);
    assert_eq!(snapshot.tags[0].nickname(), "Tag");
    assert_eq!(snapshot.tags[0].uid().as_str(), "0A0B");
    assert_eq!(snapshot.sessions.len(), 1);
    assert_eq!(snapshot.sessions[0].dismissal_latency_seconds(), 90);
    assert_eq!(snapshot.ring, RingState::Idle);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn scheduler_fire_rings_the_alarm(world: World) {
    let (events, receiver) = fire_channel();
    let scheduler = Arc::new(TokioTriggerScheduler::new(world.clock.clone(), events));
    let ports = AlarmClockPorts {
        notifications: scheduler,
        tag_reader: Arc::new(FixedTagReader("00000000")),
        credentials: Arc::new(FixedCredential(true)),
        persistence: world.persistence.clone(),
    };
    let alarm_clock = Arc::new(AlarmClock::new(ports, world.clock.clone()));
    let alarm_id = alarm_clock
        .add_alarm(AlarmDraft {
            repeat_rule: RepeatRule::Once,
            ..AlarmDraft::default()
        })
        .await
        .expect("alarm added");
    let mut snapshots = alarm_clock.subscribe();
    alarm_clock.reschedule().await.expect("reschedule");

    let consumer = tokio::spawn({
        let alarm_clock = Arc::clone(&alarm_clock);
        async move { alarm_clock.run_fire_events(receiver).await }
    });
    let ringing = snapshots
        .wait_for(|snapshot| matches!(snapshot.ring, RingState::Ringing(_)))
        .await
        .expect("snapshot sender alive")
        .ring;

    assert!(matches!(
        ringing,
        RingState::Ringing(context) if context.alarm_id() == alarm_id
    ));
    consumer.abort();
}
