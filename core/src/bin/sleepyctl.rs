//! Operate the alarm clock from a terminal.
//!
//! Every subcommand loads settings from `SLEEPY_*` variables, opens the JSON
//! collections under the data directory, and applies one operation. `run`
//! keeps the process alive, schedules the enabled alarms on Tokio timers, and
//! asks for the fallback PIN on stdin whenever an alarm rings.
//!
//! # Examples
//! ```sh
//! SLEEPY_DATA_DIR=/tmp/sleepy sleepyctl add-alarm --hour 7 --minute 15 --repeat daily
//! SLEEPY_DATA_DIR=/tmp/sleepy sleepyctl plan
//! SLEEPY_FALLBACK_PIN=2468 sleepyctl run
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{ArgAction, Parser, Subcommand};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use sleepy_core::config::SleepySettings;
use sleepy_core::domain::ports::{FireEventReceiver, fire_channel};
use sleepy_core::domain::{
    AlarmClock, AlarmClockPorts, AlarmDraft, AlarmId, DismissOutcome, RepeatRule, RingState,
    TagId, expand_triggers,
};
use sleepy_core::outbound::credentials::{PinCredentialVerifier, PinPrompt};
use sleepy_core::outbound::notifications::TokioTriggerScheduler;
use sleepy_core::outbound::persistence::JsonFileStore;
use sleepy_core::outbound::tag_reader::UnavailableTagReader;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

/// `sleepyctl` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sleepyctl",
    about = "Manage alarms and tags, inspect sleep statistics, and run the alarm clock",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Print the trigger set for the stored alarms as JSON.
    Plan,
    /// Add an alarm.
    AddAlarm {
        #[arg(long, default_value_t = 6)]
        hour: u8,
        #[arg(long, default_value_t = 30)]
        minute: u8,
        /// One of `once`, `daily`, `weekdays`, `weekends`.
        #[arg(long, default_value = "weekdays")]
        repeat: RepeatRule,
        #[arg(long, default_value = "default")]
        sound: String,
        /// Tag that must be scanned to silence the alarm.
        #[arg(long, value_name = "tag-id")]
        tag: Option<TagId>,
        /// Store the alarm disabled.
        #[arg(long)]
        disabled: bool,
    },
    /// Enable or disable an alarm.
    SetEnabled {
        id: AlarmId,
        #[arg(action = ArgAction::Set, value_name = "true|false")]
        enabled: bool,
    },
    /// Delete an alarm.
    RemoveAlarm { id: AlarmId },
    /// Register a tag by its hex uid.
    AddTag {
        uid: String,
        #[arg(long, default_value = "")]
        nickname: String,
    },
    /// Delete a tag. Alarms bound to it can then only be dismissed by PIN.
    RemoveTag { id: TagId },
    /// Print sleep statistics as JSON.
    Stats,
    /// Schedule the enabled alarms and wait for them to ring.
    Run,
}

/// Reads the fallback PIN from standard input.
struct StdinPinPrompt;

#[async_trait]
impl PinPrompt for StdinPinPrompt {
    async fn read_pin(&self, reason: &str) -> Option<Zeroizing<String>> {
        println!("{reason}: enter PIN");
        let mut line = Zeroizing::new(String::new());
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }
}

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = SleepySettings::load_from_iter([OsString::from("sleepyctl")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    init_tracing(settings.log_json);

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main(args.command, settings))
}

fn init_tracing(json: bool) {
    let builder = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

async fn open_clock(settings: &SleepySettings) -> io::Result<(Arc<AlarmClock>, FireEventReceiver)> {
    let data_dir = settings.data_dir();
    let persistence = JsonFileStore::open(&data_dir)
        .map_err(|error| io::Error::other(format!("open data directory {data_dir}: {error}")))?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let (events, receiver) = fire_channel();
    let prompt: Arc<dyn PinPrompt> = Arc::new(StdinPinPrompt);

    let ports = AlarmClockPorts {
        notifications: Arc::new(TokioTriggerScheduler::new(Arc::clone(&clock), events)),
        tag_reader: Arc::new(UnavailableTagReader),
        credentials: Arc::new(PinCredentialVerifier::new(
            settings.fallback_pin.clone(),
            prompt,
        )),
        persistence: Arc::new(persistence),
    };
    let alarm_clock = AlarmClock::bootstrap(ports, clock)
        .await
        .with_dismiss_reason(settings.dismiss_reason());
    Ok((Arc::new(alarm_clock), receiver))
}

fn to_json<T: serde::Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|error| io::Error::other(format!("encode output: {error}")))
}

async fn async_main(command: Command, settings: SleepySettings) -> io::Result<()> {
    let (alarm_clock, receiver) = open_clock(&settings).await?;

    match command {
        Command::Plan => {
            let triggers = expand_triggers(&alarm_clock.snapshot().alarms);
            println!("{}", to_json(&triggers)?);
        }
        Command::AddAlarm {
            hour,
            minute,
            repeat,
            sound,
            tag,
            disabled,
        } => {
            let draft = AlarmDraft {
                hour,
                minute,
                enabled: !disabled,
                repeat_rule: repeat,
                sound,
                tag_id: tag,
                ..AlarmDraft::default()
            };
            let id = alarm_clock.add_alarm(draft).await.map_err(io::Error::other)?;
            println!("Added alarm {id}");
        }
        Command::SetEnabled { id, enabled } => {
            alarm_clock
                .set_alarm_enabled(id, enabled)
                .await
                .map_err(io::Error::other)?;
            println!("Alarm {id} enabled: {enabled}");
        }
        Command::RemoveAlarm { id } => {
            alarm_clock.remove_alarm(id).await.map_err(io::Error::other)?;
            println!("Removed alarm {id}");
        }
        Command::AddTag { uid, nickname } => {
            let id = alarm_clock
                .add_tag(nickname, &uid)
                .await
                .map_err(io::Error::other)?;
            println!("Registered tag {id}");
        }
        Command::RemoveTag { id } => {
            alarm_clock.remove_tag(id).await.map_err(io::Error::other)?;
            println!("Removed tag {id}");
        }
        Command::Stats => {
            println!("{}", to_json(&alarm_clock.sleep_stats().await)?);
        }
        Command::Run => run(&settings, alarm_clock, receiver).await?,
    }

    Ok(())
}

async fn run(
    settings: &SleepySettings,
    alarm_clock: Arc<AlarmClock>,
    receiver: FireEventReceiver,
) -> io::Result<()> {
    if settings.fallback_pin.is_none() {
        return Err(io::Error::other(
            "run requires SLEEPY_FALLBACK_PIN to dismiss alarms",
        ));
    }

    let installed = alarm_clock
        .reschedule()
        .await
        .map_err(|error| io::Error::other(format!("schedule alarms: {error}")))?;
    println!("Scheduled {installed} triggers; press Ctrl-C to stop");

    let consumer = tokio::spawn({
        let alarm_clock = Arc::clone(&alarm_clock);
        async move { alarm_clock.run_fire_events(receiver).await }
    });
    let mut snapshots = alarm_clock.subscribe();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let ring = snapshots.borrow_and_update().ring;
                if let RingState::Ringing(context) = ring {
                    println!("Alarm {} is ringing", context.alarm_id());
                    dismiss_until_silent(&alarm_clock).await;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    consumer.abort();
    Ok(())
}

async fn dismiss_until_silent(alarm_clock: &AlarmClock) {
    loop {
        match alarm_clock.dismiss_with_credential().await {
            DismissOutcome::Dismissed(session) => {
                println!(
                    "Dismissed after {} seconds",
                    session.dismissal_latency_seconds()
                );
                return;
            }
            DismissOutcome::Denied(reason) => println!("Not dismissed: {reason:?}"),
            DismissOutcome::NothingRinging | DismissOutcome::RingEnded => return,
            other => {
                warn!(outcome = ?other, "unexpected dismissal outcome");
                return;
            }
        }
    }
}
