use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Settings, SlotRecord, Task};
use crate::notify::PendingNotification;
use crate::theme::ResolvedTheme;

pub const EVENT_STATE_UPDATED: &str = "state_updated";
pub const EVENT_NOTIFICATION_FIRED: &str = "notification_fired";

#[derive(Debug, Clone, Serialize)]
pub struct StatePayload {
    pub tasks: Vec<Task>,
    pub slots: BTreeMap<String, SlotRecord>,
    pub settings: Settings,
    pub theme: ResolvedTheme,
}

pub type NotificationFiredPayload = Vec<PendingNotification>;
