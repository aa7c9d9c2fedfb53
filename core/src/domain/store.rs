//! In-memory alarm and tag collections.

use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use super::{AlarmDefinition, AlarmId, TagId, TagRecord, TagUid};

/// Integrity violations raised by [`AlarmStore`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An alarm with the same id already exists.
    #[error("alarm {id} already exists")]
    DuplicateAlarmId { id: AlarmId },
    /// No alarm has the requested id.
    #[error("alarm {id} not found")]
    AlarmNotFound { id: AlarmId },
    /// A tag with the same id already exists.
    #[error("tag {id} already exists")]
    DuplicateTagId { id: TagId },
    /// Another tag already carries this uid.
    #[error("tag uid {uid} is already registered")]
    DuplicateTagUid { uid: TagUid },
    /// No tag has the requested id.
    #[error("tag {id} not found")]
    TagNotFound { id: TagId },
    /// An alarm references a tag that is not registered.
    #[error("alarm references unknown tag {id}")]
    UnknownTag { id: TagId },
}

/// Alarm definitions plus the tag records they may be bound to.
///
/// ## Invariants
/// - Alarm ids are unique.
/// - Tag ids and tag uids are unique.
/// - Newly added or updated alarms only bind registered tags. Removing a tag
///   does not rewrite existing bindings; a dangling binding simply never
///   matches a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmStore {
    alarms: Vec<AlarmDefinition>,
    tags: Vec<TagRecord>,
}

impl AlarmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously saved collections.
    ///
    /// Identity and uid uniqueness are checked; bindings are not, since a
    /// tag may have been removed after an alarm was bound to it.
    pub fn from_parts(
        alarms: Vec<AlarmDefinition>,
        tags: Vec<TagRecord>,
    ) -> Result<Self, StoreError> {
        let mut alarm_ids = HashSet::new();
        for alarm in &alarms {
            if !alarm_ids.insert(alarm.id()) {
                return Err(StoreError::DuplicateAlarmId { id: alarm.id() });
            }
        }

        let mut store = Self {
            alarms,
            tags: Vec::with_capacity(tags.len()),
        };
        for tag in tags {
            store.add_tag(tag)?;
        }
        Ok(store)
    }

    /// Rebuild a store, dropping only the collection that fails its checks.
    ///
    /// Duplicate alarm ids empty the alarm collection; duplicate tag ids or
    /// uids empty the tag collection. The other collection is kept as loaded.
    pub fn restore(alarms: Vec<AlarmDefinition>, tags: Vec<TagRecord>) -> Self {
        let alarms = match Self::from_parts(alarms, Vec::new()) {
            Ok(store) => store.alarms,
            Err(err) => {
                warn!(error = %err, "stored alarms violate integrity rules; dropping alarms");
                Vec::new()
            }
        };
        let tags = match Self::from_parts(Vec::new(), tags) {
            Ok(store) => store.tags,
            Err(err) => {
                warn!(error = %err, "stored tags violate integrity rules; dropping tags");
                Vec::new()
            }
        };
        Self { alarms, tags }
    }

    pub fn alarms(&self) -> &[AlarmDefinition] {
        self.alarms.as_slice()
    }

    pub fn tags(&self) -> &[TagRecord] {
        self.tags.as_slice()
    }

    pub fn alarm(&self, id: AlarmId) -> Option<&AlarmDefinition> {
        self.alarms.iter().find(|alarm| alarm.id() == id)
    }

    pub fn tag(&self, id: TagId) -> Option<&TagRecord> {
        self.tags.iter().find(|tag| tag.id() == id)
    }

    /// Tag record bound to the alarm, if the binding resolves.
    pub fn bound_tag(&self, alarm_id: AlarmId) -> Option<&TagRecord> {
        self.alarm(alarm_id)
            .and_then(AlarmDefinition::tag_id)
            .and_then(|tag_id| self.tag(tag_id))
    }

    pub fn add_alarm(&mut self, alarm: AlarmDefinition) -> Result<(), StoreError> {
        if self.alarm(alarm.id()).is_some() {
            return Err(StoreError::DuplicateAlarmId { id: alarm.id() });
        }
        self.check_binding(&alarm)?;
        self.alarms.push(alarm);
        Ok(())
    }

    /// Replace the alarm with the same id.
    pub fn update_alarm(&mut self, alarm: AlarmDefinition) -> Result<(), StoreError> {
        self.check_binding(&alarm)?;
        let slot = self.alarm_mut(alarm.id())?;
        *slot = alarm;
        Ok(())
    }

    pub fn remove_alarm(&mut self, id: AlarmId) -> Result<AlarmDefinition, StoreError> {
        let index = self
            .alarms
            .iter()
            .position(|alarm| alarm.id() == id)
            .ok_or(StoreError::AlarmNotFound { id })?;
        Ok(self.alarms.remove(index))
    }

    pub fn set_alarm_enabled(&mut self, id: AlarmId, enabled: bool) -> Result<(), StoreError> {
        self.alarm_mut(id)?.set_enabled(enabled);
        Ok(())
    }

    /// Flip the enabled flag and return the new value.
    pub fn toggle_alarm(&mut self, id: AlarmId) -> Result<bool, StoreError> {
        let alarm = self.alarm_mut(id)?;
        let enabled = !alarm.is_enabled();
        alarm.set_enabled(enabled);
        Ok(enabled)
    }

    pub fn add_tag(&mut self, tag: TagRecord) -> Result<(), StoreError> {
        if self.tag(tag.id()).is_some() {
            return Err(StoreError::DuplicateTagId { id: tag.id() });
        }
        if self.tags.iter().any(|existing| existing.uid() == tag.uid()) {
            return Err(StoreError::DuplicateTagUid {
                uid: tag.uid().clone(),
            });
        }
        self.tags.push(tag);
        Ok(())
    }

    pub fn remove_tag(&mut self, id: TagId) -> Result<TagRecord, StoreError> {
        let index = self
            .tags
            .iter()
            .position(|tag| tag.id() == id)
            .ok_or(StoreError::TagNotFound { id })?;
        Ok(self.tags.remove(index))
    }

    fn alarm_mut(&mut self, id: AlarmId) -> Result<&mut AlarmDefinition, StoreError> {
        self.alarms
            .iter_mut()
            .find(|alarm| alarm.id() == id)
            .ok_or(StoreError::AlarmNotFound { id })
    }

    fn check_binding(&self, alarm: &AlarmDefinition) -> Result<(), StoreError> {
        match alarm.tag_id() {
            Some(tag_id) if self.tag(tag_id).is_none() => {
                Err(StoreError::UnknownTag { id: tag_id })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for store integrity rules.

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::AlarmDraft;

    fn tag(uid: &str) -> TagRecord {
        TagRecord::new("Bedside", TagUid::new(uid).expect("valid uid"))
    }

    fn alarm_bound_to(tag_id: Option<TagId>) -> AlarmDefinition {
        AlarmDefinition::new(AlarmDraft {
            tag_id,
            ..AlarmDraft::default()
        })
        .expect("valid alarm")
    }

    #[fixture]
    fn store() -> AlarmStore {
        AlarmStore::new()
    }

    #[rstest]
    fn duplicate_uid_is_rejected(mut store: AlarmStore) {
        store.add_tag(tag("AB12CD34")).expect("first tag");

        let err = store.add_tag(tag("ab12cd34")).expect_err("duplicate uid");
        assert!(matches!(err, StoreError::DuplicateTagUid { .. }));
        assert_eq!(store.tags().len(), 1);
    }

    #[rstest]
    fn binding_requires_registered_tag(mut store: AlarmStore) {
        let missing = TagId::random();
        let err = store
            .add_alarm(alarm_bound_to(Some(missing)))
            .expect_err("unknown tag rejected");
        assert_eq!(err, StoreError::UnknownTag { id: missing });
    }

    #[rstest]
    fn bound_tag_resolves_through_alarm(mut store: AlarmStore) {
        let record = tag("0A0B");
        let tag_id = record.id();
        store.add_tag(record).expect("tag added");
        let alarm = alarm_bound_to(Some(tag_id));
        let alarm_id = alarm.id();
        store.add_alarm(alarm).expect("alarm added");

        assert_eq!(store.bound_tag(alarm_id).map(TagRecord::id), Some(tag_id));
    }

    #[rstest]
    fn removing_tag_leaves_binding_dangling(mut store: AlarmStore) {
        let record = tag("0A0B");
        let tag_id = record.id();
        store.add_tag(record).expect("tag added");
        let alarm = alarm_bound_to(Some(tag_id));
        let alarm_id = alarm.id();
        store.add_alarm(alarm).expect("alarm added");

        store.remove_tag(tag_id).expect("tag removed");

        assert_eq!(
            store.alarm(alarm_id).and_then(AlarmDefinition::tag_id),
            Some(tag_id)
        );
        assert!(store.bound_tag(alarm_id).is_none());
    }

    #[rstest]
    fn toggle_flips_enabled_flag(mut store: AlarmStore) {
        let alarm = alarm_bound_to(None);
        let id = alarm.id();
        store.add_alarm(alarm).expect("alarm added");

        assert_eq!(store.toggle_alarm(id), Ok(false));
        assert_eq!(store.toggle_alarm(id), Ok(true));
    }

    #[rstest]
    fn update_replaces_in_place(mut store: AlarmStore) {
        let alarm = alarm_bound_to(None);
        let mut draft = alarm.to_draft();
        store.add_alarm(alarm).expect("alarm added");
        draft.hour = 9;

        store
            .update_alarm(AlarmDefinition::new(draft.clone()).expect("valid alarm"))
            .expect("update succeeds");

        assert_eq!(store.alarm(draft.id).map(AlarmDefinition::hour), Some(9));
        assert_eq!(store.alarms().len(), 1);
    }

    #[rstest]
    fn missing_alarm_operations_fail(mut store: AlarmStore) {
        let id = AlarmId::random();
        assert_eq!(
            store.remove_alarm(id),
            Err(StoreError::AlarmNotFound { id })
        );
        assert_eq!(
            store.set_alarm_enabled(id, true),
            Err(StoreError::AlarmNotFound { id })
        );
    }

    #[rstest]
    fn from_parts_rejects_duplicate_uids() {
        let result = AlarmStore::from_parts(Vec::new(), vec![tag("01"), tag("01")]);
        assert!(matches!(result, Err(StoreError::DuplicateTagUid { .. })));
    }

    #[rstest]
    fn from_parts_tolerates_dangling_bindings() {
        let alarm = alarm_bound_to(Some(TagId::random()));
        let store = AlarmStore::from_parts(vec![alarm], Vec::new()).expect("restores");
        assert_eq!(store.alarms().len(), 1);
    }

    #[rstest]
    fn restore_drops_only_conflicting_tags() {
        let alarm = alarm_bound_to(None);
        let store = AlarmStore::restore(vec![alarm.clone()], vec![tag("AB"), tag("ab")]);

        assert_eq!(store.alarms(), &[alarm]);
        assert!(store.tags().is_empty());
    }

    #[rstest]
    fn restore_drops_only_duplicate_alarms() {
        let alarm = alarm_bound_to(None);
        let record = tag("0A0B");
        let store = AlarmStore::restore(vec![alarm.clone(), alarm], vec![record.clone()]);

        assert!(store.alarms().is_empty());
        assert_eq!(store.tags(), &[record]);
    }
}
