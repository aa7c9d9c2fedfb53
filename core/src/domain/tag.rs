//! Registered physical tags used to silence alarms.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_NICKNAME: &str = "Tag";

/// Stable tag record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(Uuid);

impl TagId {
    /// Generate a new random [`TagId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TagId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Validation errors returned by [`TagUid::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    EmptyUid,
    NonHexUid { uid: String },
}

impl fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUid => write!(f, "tag uid must not be empty"),
            Self::NonHexUid { uid } => {
                write!(f, "tag uid must contain only hexadecimal digits (got {uid:?})")
            }
        }
    }
}

impl std::error::Error for TagValidationError {}

/// Hardware identifier read from a tag, as an upper-case hex string.
///
/// Input is trimmed and upper-cased, so `"ab12cd34"` and `"AB12CD34"` are the
/// same uid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagUid(String);

impl TagUid {
    /// Validate and normalise a uid.
    pub fn new(uid: impl AsRef<str>) -> Result<Self, TagValidationError> {
        let trimmed = uid.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TagValidationError::EmptyUid);
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TagValidationError::NonHexUid {
                uid: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for TagUid {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TagUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TagUid> for String {
    fn from(value: TagUid) -> Self {
        value.0
    }
}

impl TryFrom<String> for TagUid {
    type Error = TagValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A registered tag. The nickname is display-only; `uid` is what a scan is
/// matched against and must be unique across the tag collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    id: TagId,
    nickname: String,
    uid: TagUid,
}

impl TagRecord {
    /// Create a new record with a fresh id. A blank nickname becomes `"Tag"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sleepy_core::domain::{TagRecord, TagUid};
    ///
    /// let tag = TagRecord::new("  ", TagUid::new("ab12cd34")?);
    /// assert_eq!(tag.nickname(), "Tag");
    /// assert_eq!(tag.uid().as_str(), "AB12CD34");
    /// # Ok::<(), sleepy_core::domain::TagValidationError>(())
    /// ```
    pub fn new(nickname: impl Into<String>, uid: TagUid) -> Self {
        Self::with_id(TagId::random(), nickname, uid)
    }

    /// Create a record with a caller-chosen id.
    pub fn with_id(id: TagId, nickname: impl Into<String>, uid: TagUid) -> Self {
        let nickname = nickname.into();
        let nickname = if nickname.trim().is_empty() {
            DEFAULT_NICKNAME.to_owned()
        } else {
            nickname.trim().to_owned()
        };
        Self { id, nickname, uid }
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn nickname(&self) -> &str {
        self.nickname.as_str()
    }

    pub fn uid(&self) -> &TagUid {
        &self.uid
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for tag uid normalisation.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("AB12CD34", "AB12CD34")]
    #[case("ab12cd34", "AB12CD34")]
    #[case("  0a0b  ", "0A0B")]
    fn uid_is_normalised(#[case] raw: &str, #[case] expected: &str) {
        let uid = TagUid::new(raw).expect("valid uid");
        assert_eq!(uid.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn uid_rejects_blank(#[case] raw: &str) {
        assert_eq!(TagUid::new(raw), Err(TagValidationError::EmptyUid));
    }

    #[rstest]
    fn uid_rejects_non_hex() {
        let err = TagUid::new("XYZ-12").expect_err("non-hex uid rejected");
        assert!(matches!(err, TagValidationError::NonHexUid { .. }));
    }

    #[rstest]
    fn nickname_is_trimmed() {
        let tag = TagRecord::new(" Kitchen ", TagUid::new("01").expect("valid uid"));
        assert_eq!(tag.nickname(), "Kitchen");
    }
}
