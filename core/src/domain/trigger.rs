//! Expansion of alarm definitions into host-schedulable triggers.
//!
//! Triggers are derived values: they are recomputed from the full alarm
//! collection after every mutation and installed with a clear-then-install
//! ("full replace") policy. They are never persisted.

use std::fmt;

use chrono::{DateTime, Datelike, Days, TimeZone};
use serde::Serialize;

use super::{AlarmDefinition, AlarmId, RepeatRule};

/// Day of week under the fixed `1 = Sunday ... 7 = Saturday` convention.
///
/// The numbering never follows the host locale's first weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub struct Weekday(u8);

impl Weekday {
    pub const SUNDAY: Self = Self(1);
    pub const MONDAY: Self = Self(2);
    pub const TUESDAY: Self = Self(3);
    pub const WEDNESDAY: Self = Self(4);
    pub const THURSDAY: Self = Self(5);
    pub const FRIDAY: Self = Self(6);
    pub const SATURDAY: Self = Self(7);

    /// Monday to Friday.
    pub const WORKING_DAYS: [Self; 5] = [
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
    ];
    /// Sunday and Saturday.
    pub const WEEKEND_DAYS: [Self; 2] = [Self::SUNDAY, Self::SATURDAY];

    /// Build a weekday from its number, `None` outside `1..=7`.
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number <= 7 {
            Some(Self(number))
        } else {
            None
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// Map a calendar weekday onto the fixed numbering.
    pub fn from_calendar(day: chrono::Weekday) -> Self {
        // number_from_sunday is 1..=7 by construction.
        Self(u8::try_from(day.number_from_sunday()).unwrap_or(1))
    }
}

impl From<Weekday> for u8 {
    fn from(value: Weekday) -> Self {
        value.0
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trigger identifier, unique per `(alarm id, weekday)` pair.
///
/// Format: `alarm-<uuid>` for weekday-less triggers and
/// `alarm-<uuid>-<weekday>` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TriggerId(String);

impl TriggerId {
    fn for_alarm(alarm_id: AlarmId, weekday: Option<Weekday>) -> Self {
        match weekday {
            Some(day) => Self(format!("alarm-{alarm_id}-{day}")),
            None => Self(format!("alarm-{alarm_id}")),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete instruction for the host scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    id: TriggerId,
    hour: u8,
    minute: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    weekday: Option<Weekday>,
    repeats: bool,
    alarm_id: AlarmId,
}

impl Trigger {
    fn for_alarm(alarm: &AlarmDefinition, weekday: Option<Weekday>, repeats: bool) -> Self {
        Self {
            id: TriggerId::for_alarm(alarm.id(), weekday),
            hour: alarm.hour(),
            minute: alarm.minute(),
            weekday,
            repeats,
            alarm_id: alarm.id(),
        }
    }

    pub fn id(&self) -> &TriggerId {
        &self.id
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.weekday
    }

    pub fn repeats(&self) -> bool {
        self.repeats
    }

    pub fn alarm_id(&self) -> AlarmId {
        self.alarm_id
    }

    /// Next wall-clock instant strictly after `after` matching this trigger.
    ///
    /// Days whose local time does not exist (a DST gap) are skipped. Returns
    /// `None` only if no match exists within the following eight days, which
    /// cannot happen for a well-formed trigger outside pathological zones.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use sleepy_core::domain::{AlarmDefinition, AlarmDraft, RepeatRule, expand_triggers};
    ///
    /// let alarm = AlarmDefinition::new(AlarmDraft {
    ///     hour: 7,
    ///     minute: 0,
    ///     repeat_rule: RepeatRule::Daily,
    ///     ..AlarmDraft::default()
    /// })?;
    /// let triggers = expand_triggers([&alarm]);
    /// let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).single().expect("valid");
    /// let next = triggers[0].next_occurrence(&now).expect("daily trigger recurs");
    /// assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 3, 7, 0, 0).single().expect("valid"));
    /// # Ok::<(), sleepy_core::domain::AlarmValidationError>(())
    /// ```
    pub fn next_occurrence<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let zone = after.timezone();
        let start = after.date_naive();
        (0..=7_u64).find_map(|offset| {
            let date = start.checked_add_days(Days::new(offset))?;
            if self
                .weekday
                .is_some_and(|day| Weekday::from_calendar(date.weekday()) != day)
            {
                return None;
            }
            let naive = date.and_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)?;
            let candidate = zone.from_local_datetime(&naive).earliest()?;
            (candidate > *after).then_some(candidate)
        })
    }
}

/// Expand alarm definitions into the complete trigger set.
///
/// Disabled alarms contribute nothing. The output is deterministic: the same
/// input slice yields identical triggers (identifiers included) in the same
/// order, so the result can be installed with a full replace at any time.
///
/// - `Once` → one non-repeating trigger without weekday.
/// - `Daily` → one repeating trigger without weekday.
/// - `Weekdays` → five repeating triggers, weekdays `2..=6`.
/// - `Weekends` → two repeating triggers, weekdays `1` and `7`.
pub fn expand_triggers<'a>(alarms: impl IntoIterator<Item = &'a AlarmDefinition>) -> Vec<Trigger> {
    let mut triggers = Vec::new();
    for alarm in alarms.into_iter().filter(|alarm| alarm.is_enabled()) {
        match alarm.repeat_rule() {
            RepeatRule::Once => triggers.push(Trigger::for_alarm(alarm, None, false)),
            RepeatRule::Daily => triggers.push(Trigger::for_alarm(alarm, None, true)),
            RepeatRule::Weekdays => triggers.extend(
                Weekday::WORKING_DAYS
                    .iter()
                    .map(|day| Trigger::for_alarm(alarm, Some(*day), true)),
            ),
            RepeatRule::Weekends => triggers.extend(
                Weekday::WEEKEND_DAYS
                    .iter()
                    .map(|day| Trigger::for_alarm(alarm, Some(*day), true)),
            ),
        }
    }
    triggers
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
