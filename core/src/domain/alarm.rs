//! Alarm definitions and their repeat rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TagId;

/// Latest valid hour of day.
pub const MAX_HOUR: u8 = 23;
/// Latest valid minute of hour.
pub const MAX_MINUTE: u8 = 59;

const DEFAULT_SOUND: &str = "default";

/// Stable alarm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(Uuid);

impl AlarmId {
    /// Generate a new random [`AlarmId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AlarmId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// How an alarm repeats. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatRule {
    /// Fires at the next matching time, then never again.
    Once,
    /// Fires every day.
    Daily,
    /// Fires Monday to Friday.
    Weekdays,
    /// Fires Saturday and Sunday.
    Weekends,
}

/// Error returned when parsing a [`RepeatRule`] from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseRepeatRuleError;

impl fmt::Display for RepeatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => f.write_str("once"),
            Self::Daily => f.write_str("daily"),
            Self::Weekdays => f.write_str("weekdays"),
            Self::Weekends => f.write_str("weekends"),
        }
    }
}

impl fmt::Display for ParseRepeatRuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("repeat rule must be one of once, daily, weekdays, weekends")
    }
}

impl std::error::Error for ParseRepeatRuleError {}

impl FromStr for RepeatRule {
    type Err = ParseRepeatRuleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekdays" => Ok(Self::Weekdays),
            "weekends" => Ok(Self::Weekends),
            _ => Err(ParseRepeatRuleError),
        }
    }
}

/// Validation errors raised by [`AlarmDefinition::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmValidationError {
    HourOutOfRange { hour: u8 },
    MinuteOutOfRange { minute: u8 },
}

impl fmt::Display for AlarmValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HourOutOfRange { hour } => {
                write!(f, "alarm hour must be within 0..={MAX_HOUR} (got {hour})")
            }
            Self::MinuteOutOfRange { minute } => {
                write!(f, "alarm minute must be within 0..={MAX_MINUTE} (got {minute})")
            }
        }
    }
}

impl std::error::Error for AlarmValidationError {}

/// Input payload for [`AlarmDefinition::new`].
///
/// The default draft is a 06:30 weekday alarm with the default sound and no
/// bound tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDraft {
    pub id: AlarmId,
    pub hour: u8,
    pub minute: u8,
    pub enabled: bool,
    pub repeat_rule: RepeatRule,
    pub sound: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<TagId>,
}

impl Default for AlarmDraft {
    fn default() -> Self {
        Self {
            id: AlarmId::random(),
            hour: 6,
            minute: 30,
            enabled: true,
            repeat_rule: RepeatRule::Weekdays,
            sound: DEFAULT_SOUND.to_owned(),
            tag_id: None,
        }
    }
}

/// A user's recurring alarm.
///
/// ## Invariants
/// - `hour` is within `0..=23` and `minute` within `0..=59`; both are
///   enforced here, never at scheduling time.
///
/// # Examples
///
/// ```
/// use sleepy_core::domain::{AlarmDefinition, AlarmDraft, RepeatRule};
///
/// let alarm = AlarmDefinition::new(AlarmDraft {
///     hour: 7,
///     minute: 15,
///     repeat_rule: RepeatRule::Daily,
///     ..AlarmDraft::default()
/// })?;
/// assert_eq!((alarm.hour(), alarm.minute()), (7, 15));
/// # Ok::<(), sleepy_core::domain::AlarmValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AlarmDraft", into = "AlarmDraft")]
pub struct AlarmDefinition {
    id: AlarmId,
    hour: u8,
    minute: u8,
    enabled: bool,
    repeat_rule: RepeatRule,
    sound: String,
    tag_id: Option<TagId>,
}

impl AlarmDefinition {
    /// Creates a validated alarm definition.
    pub fn new(draft: AlarmDraft) -> Result<Self, AlarmValidationError> {
        Self::try_from(draft)
    }

    pub fn id(&self) -> AlarmId {
        self.id
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn repeat_rule(&self) -> RepeatRule {
        self.repeat_rule
    }

    /// Opaque sound reference handed to the host.
    pub fn sound(&self) -> &str {
        self.sound.as_str()
    }

    /// Tag that must be scanned to silence this alarm, if any.
    pub fn tag_id(&self) -> Option<TagId> {
        self.tag_id
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns an editable copy of this definition.
    pub fn to_draft(&self) -> AlarmDraft {
        AlarmDraft::from(self.clone())
    }
}

impl TryFrom<AlarmDraft> for AlarmDefinition {
    type Error = AlarmValidationError;

    fn try_from(value: AlarmDraft) -> Result<Self, Self::Error> {
        if value.hour > MAX_HOUR {
            return Err(AlarmValidationError::HourOutOfRange { hour: value.hour });
        }
        if value.minute > MAX_MINUTE {
            return Err(AlarmValidationError::MinuteOutOfRange {
                minute: value.minute,
            });
        }

        Ok(Self {
            id: value.id,
            hour: value.hour,
            minute: value.minute,
            enabled: value.enabled,
            repeat_rule: value.repeat_rule,
            sound: value.sound,
            tag_id: value.tag_id,
        })
    }
}

impl From<AlarmDefinition> for AlarmDraft {
    fn from(value: AlarmDefinition) -> Self {
        Self {
            id: value.id,
            hour: value.hour,
            minute: value.minute,
            enabled: value.enabled,
            repeat_rule: value.repeat_rule,
            sound: value.sound,
            tag_id: value.tag_id,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for alarm construction.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn default_draft_is_weekday_half_six() {
        let draft = AlarmDraft::default();
        assert_eq!((draft.hour, draft.minute), (6, 30));
        assert!(draft.enabled);
        assert_eq!(draft.repeat_rule, RepeatRule::Weekdays);
        assert_eq!(draft.sound, "default");
        assert!(draft.tag_id.is_none());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(23, 59)]
    #[case(12, 30)]
    fn accepts_boundary_times(#[case] hour: u8, #[case] minute: u8) {
        let alarm = AlarmDefinition::new(AlarmDraft {
            hour,
            minute,
            ..AlarmDraft::default()
        })
        .expect("valid alarm");
        assert_eq!((alarm.hour(), alarm.minute()), (hour, minute));
    }

    #[rstest]
    #[case(24)]
    #[case(99)]
    fn rejects_out_of_range_hour(#[case] hour: u8) {
        let result = AlarmDefinition::new(AlarmDraft {
            hour,
            ..AlarmDraft::default()
        });
        assert_eq!(result, Err(AlarmValidationError::HourOutOfRange { hour }));
    }

    #[rstest]
    fn rejects_out_of_range_minute() {
        let result = AlarmDefinition::new(AlarmDraft {
            minute: 60,
            ..AlarmDraft::default()
        });
        assert_eq!(
            result,
            Err(AlarmValidationError::MinuteOutOfRange { minute: 60 })
        );
    }

    #[rstest]
    fn deserialisation_enforces_ranges() {
        let draft = AlarmDraft::default();
        let mut json = serde_json::to_value(&draft).expect("serialise draft");
        json["hour"] = serde_json::json!(25);

        let result = serde_json::from_value::<AlarmDefinition>(json);
        assert!(result.is_err());
    }

    #[rstest]
    #[case("once", RepeatRule::Once)]
    #[case("daily", RepeatRule::Daily)]
    #[case(" weekdays ", RepeatRule::Weekdays)]
    #[case("weekends", RepeatRule::Weekends)]
    fn repeat_rule_parses(#[case] raw: &str, #[case] expected: RepeatRule) {
        assert_eq!(raw.parse::<RepeatRule>(), Ok(expected));
    }

    #[rstest]
    fn repeat_rule_rejects_unknown_value() {
        assert_eq!("fortnightly".parse::<RepeatRule>(), Err(ParseRepeatRuleError));
    }
}
