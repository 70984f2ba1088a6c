use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::{NotificationLead, Slot, SlotEdit, SlotRecord, SlotsFile};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaySlots {
    records: BTreeMap<(NaiveDate, Slot), SlotRecord>,
}

impl DaySlots {
    pub fn get(&self, date: NaiveDate, slot: Slot) -> SlotRecord {
        self.records
            .get(&(date, slot))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_completed(&self, date: NaiveDate, slot: Slot) -> bool {
        self.records
            .get(&(date, slot))
            .is_some_and(|record| record.completed)
    }

    pub fn apply_edit(&mut self, date: NaiveDate, slot: Slot, edit: &SlotEdit) -> SlotRecord {
        let record = self.records.entry((date, slot)).or_default();
        record.title = Some(edit.title.trim().to_string()).filter(|title| !title.is_empty());
        record.has_time = edit.has_time;
        record.time = Some(edit.time);
        record.notification = edit.notification;
        record.clone()
    }

    pub fn toggle_completed(&mut self, date: NaiveDate, slot: Slot) -> bool {
        let record = self.records.entry((date, slot)).or_default();
        record.completed = !record.completed;
        record.completed
    }

    pub fn insert(&mut self, date: NaiveDate, slot: Slot, record: SlotRecord) {
        self.records.insert((date, slot), record);
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Slot, &SlotRecord)> {
        self.records
            .iter()
            .map(|((date, slot), record)| (*date, *slot, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn merge(&mut self, other: DaySlots) {
        self.records.extend(other.records);
    }

    pub fn to_map(&self) -> BTreeMap<String, SlotRecord> {
        self.records
            .iter()
            .map(|((date, slot), record)| (slot_key(*date, *slot), record.clone()))
            .collect()
    }

    pub fn to_file(&self, schema_version: u32) -> SlotsFile {
        SlotsFile {
            schema_version,
            slots: self.to_map(),
        }
    }

    pub fn from_file(file: SlotsFile) -> Self {
        let mut slots = DaySlots::default();
        for (key, record) in file.slots {
            match parse_slot_key(&key) {
                Some((date, slot)) => slots.insert(date, slot, record),
                None => log::warn!("ignoring slot entry with malformed key={key}"),
            }
        }
        slots
    }

    /// Converts the flat `"<date>_<slot>_<field>"` dictionary older builds stored.
    ///
    /// The bare `"<date>_<slot>"` key holds the completion flag. Keys written by those builds
    /// sometimes carry stray spaces, so all whitespace is stripped before parsing.
    pub fn from_legacy(map: &serde_json::Map<String, Value>) -> Self {
        let mut slots = DaySlots::default();
        for (raw_key, value) in map {
            let key: String = raw_key.split_whitespace().collect();
            let mut parts = key.splitn(3, '_');
            let (Some(date), Some(slot)) = (parts.next(), parts.next()) else {
                log::warn!("ignoring legacy meta key={raw_key}");
                continue;
            };
            let (Ok(date), Some(slot)) = (
                NaiveDate::parse_from_str(date, "%Y-%m-%d"),
                Slot::parse(slot),
            ) else {
                log::warn!("ignoring legacy meta key={raw_key}");
                continue;
            };
            let record = slots.records.entry((date, slot)).or_default();
            match parts.next() {
                None => record.completed = value.as_bool().unwrap_or(false),
                Some("title") => record.title = value.as_str().map(str::to_string),
                Some("hasTime") => record.has_time = value.as_bool().unwrap_or(false),
                Some("time") => record.time = value.as_str().and_then(parse_legacy_time),
                Some("notification") => {
                    record.notification = value
                        .as_str()
                        .and_then(NotificationLead::parse)
                        .unwrap_or_default()
                }
                Some(field) => log::warn!("ignoring legacy meta field={field} key={raw_key}"),
            }
        }
        slots
    }
}

pub fn slot_key(date: NaiveDate, slot: Slot) -> String {
    format!("{}_{}", date.format("%Y-%m-%d"), slot.id())
}

pub fn slot_notification_id(date: NaiveDate, slot: Slot) -> String {
    slot_key(date, slot)
}

fn parse_slot_key(key: &str) -> Option<(NaiveDate, Slot)> {
    let (date, slot) = key.trim().rsplit_once('_')?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((date, Slot::parse(slot)?))
}

// Legacy times are UTC ISO strings; shift them into local wall-clock time.
fn parse_legacy_time(value: &str) -> Option<NaiveDateTime> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(instant.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S").ok()
}
