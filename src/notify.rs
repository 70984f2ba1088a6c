use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Local, NaiveDateTime, TimeZone};
use serde::Serialize;
use thiserror::Error;

use crate::models::{Locale, NotificationLead, Task, Timestamp};
use crate::slots::{slot_notification_id, DaySlots};

/// Platforms cap how many local notifications may be pending at once.
pub const NOTIFICATION_BATCH_LIMIT: usize = 60;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification permission not granted")]
    PermissionDenied,
    #[error("notification backend error: {0}")]
    Backend(String),
}

pub trait Notifier: Send + Sync {
    /// Schedules a notification, replacing any pending one with the same `id`.
    fn schedule(&self, id: &str, fire_at: Timestamp, title: &str, body: &str)
        -> Result<(), NotifyError>;
    fn cancel(&self, id: &str) -> Result<(), NotifyError>;
    fn cancel_all(&self) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy)]
pub struct Reminder<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub has_time: bool,
    pub time: NaiveDateTime,
    pub lead: NotificationLead,
}

impl<'a> From<&'a Task> for Reminder<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: &task.id,
            title: &task.title,
            has_time: task.has_time,
            time: task.time,
            lead: task.notification,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled { fire_at: Timestamp },
    Disabled,
    NoReminder,
    InPast,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchReport {
    pub scheduled: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

pub fn fire_time(time: NaiveDateTime, lead: NotificationLead) -> Option<NaiveDateTime> {
    lead.offset_minutes()
        .map(|minutes| time - Duration::minutes(minutes))
}

pub fn local_epoch(time: NaiveDateTime) -> Option<Timestamp> {
    Local
        .from_local_datetime(&time)
        .earliest()
        .map(|dt| dt.timestamp())
}

pub fn notification_title(locale: Locale) -> &'static str {
    match locale {
        Locale::Ko => "할일 알림",
        Locale::En => "Task reminder",
    }
}

pub fn notification_body(title: &str, lead: NotificationLead, locale: Locale) -> String {
    match (lead, locale) {
        (NotificationLead::AtStart, Locale::Ko) => format!("{title} 시작 시간입니다."),
        (NotificationLead::AtStart, Locale::En) => format!("{title} starts now."),
        (lead, Locale::Ko) => format!("{title} 시작 {} 입니다.", lead.label(Locale::Ko)),
        (lead, Locale::En) => format!("{title} starts in {}.", lead.label(Locale::En)),
    }
}

/// Replaces whatever was pending for `reminder.id` with a fresh notification, if one applies.
///
/// The previous notification is always cancelled first, so turning a reminder off or moving a
/// task into the past clears it.
pub fn schedule_reminder(
    notifier: &dyn Notifier,
    reminder: &Reminder<'_>,
    enabled: bool,
    now: Timestamp,
    locale: Locale,
) -> Result<ScheduleOutcome, NotifyError> {
    notifier.cancel(reminder.id)?;
    if !enabled {
        return Ok(ScheduleOutcome::Disabled);
    }
    if !reminder.has_time {
        return Ok(ScheduleOutcome::NoReminder);
    }
    let Some(fire_at) = fire_time(reminder.time, reminder.lead) else {
        return Ok(ScheduleOutcome::NoReminder);
    };
    let Some(fire_at) = local_epoch(fire_at) else {
        log::warn!("reminder time does not exist locally id={} time={}", reminder.id, reminder.time);
        return Ok(ScheduleOutcome::NoReminder);
    };
    if fire_at <= now {
        log::debug!("reminder already past id={} fire_at={fire_at}", reminder.id);
        return Ok(ScheduleOutcome::InPast);
    }

    let body = notification_body(reminder.title, reminder.lead, locale);
    notifier.schedule(reminder.id, fire_at, notification_title(locale), &body)?;
    log::info!("scheduled reminder id={} fire_at={fire_at}", reminder.id);
    Ok(ScheduleOutcome::Scheduled { fire_at })
}

pub fn schedule_batch(
    notifier: &dyn Notifier,
    tasks: &[Task],
    enabled: bool,
    now: Timestamp,
    locale: Locale,
) -> BatchReport {
    let mut report = BatchReport::default();
    if tasks.len() > NOTIFICATION_BATCH_LIMIT {
        log::info!(
            "reminder batch capped total={} limit={NOTIFICATION_BATCH_LIMIT}",
            tasks.len()
        );
    }
    for task in tasks.iter().take(NOTIFICATION_BATCH_LIMIT) {
        match schedule_reminder(notifier, &Reminder::from(task), enabled, now, locale) {
            Ok(ScheduleOutcome::Scheduled { .. }) => report.scheduled += 1,
            Ok(_) => report.skipped += 1,
            Err(err) => {
                log::error!("failed to schedule reminder id={} err={err}", task.id);
                report.errors.push(format!("{}: {err}", task.id));
            }
        }
    }
    report
}

/// Rebuilds reminders from persisted tasks and slots after a restart. Only reminders that
/// still lie ahead count against the batch limit.
pub fn rearm(
    notifier: &dyn Notifier,
    tasks: &[Task],
    slots: &DaySlots,
    enabled: bool,
    now: Timestamp,
    locale: Locale,
) -> BatchReport {
    if !enabled {
        return BatchReport::default();
    }
    let upcoming: Vec<Task> = tasks
        .iter()
        .filter(|task| is_upcoming(task.has_time, task.time, task.notification, now))
        .cloned()
        .collect();
    let mut report = schedule_batch(notifier, &upcoming, enabled, now, locale);

    for (date, slot, record) in slots.iter() {
        let Some(time) = record.time else {
            continue;
        };
        if !is_upcoming(record.has_time, time, record.notification, now) {
            continue;
        }
        let id = slot_notification_id(date, slot);
        let title = record.title_or_default(slot, locale);
        let reminder = Reminder {
            id: &id,
            title: &title,
            has_time: true,
            time,
            lead: record.notification,
        };
        match schedule_reminder(notifier, &reminder, enabled, now, locale) {
            Ok(ScheduleOutcome::Scheduled { .. }) => report.scheduled += 1,
            Ok(_) => report.skipped += 1,
            Err(err) => {
                log::error!("failed to schedule slot reminder id={id} err={err}");
                report.errors.push(format!("{id}: {err}"));
            }
        }
    }
    report
}

fn is_upcoming(
    has_time: bool,
    time: NaiveDateTime,
    lead: NotificationLead,
    now: Timestamp,
) -> bool {
    has_time
        && fire_time(time, lead)
            .and_then(local_epoch)
            .is_some_and(|fire_at| fire_at > now)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PendingNotification {
    pub id: String,
    pub fire_at: Timestamp,
    pub title: String,
    pub body: String,
}

/// In-process notification queue. The app shell drains it on a timer and hands due entries
/// to the OS notification plugin.
#[derive(Clone, Default)]
pub struct LocalScheduler {
    pending: Arc<Mutex<HashMap<String, PendingNotification>>>,
}

impl LocalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Vec<PendingNotification> {
        let guard = self.pending.lock().expect("scheduler poisoned");
        let mut out: Vec<PendingNotification> = guard.values().cloned().collect();
        out.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn take_due(&self, now: Timestamp) -> Vec<PendingNotification> {
        let mut guard = self.pending.lock().expect("scheduler poisoned");
        let due_ids: Vec<String> = guard
            .values()
            .filter(|n| n.fire_at <= now)
            .map(|n| n.id.clone())
            .collect();
        let mut due: Vec<PendingNotification> =
            due_ids.iter().filter_map(|id| guard.remove(id)).collect();
        due.sort_by_key(|n| n.fire_at);
        due
    }
}

impl Notifier for LocalScheduler {
    fn schedule(
        &self,
        id: &str,
        fire_at: Timestamp,
        title: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|_| NotifyError::Backend("scheduler poisoned".to_string()))?;
        guard.insert(
            id.to_string(),
            PendingNotification {
                id: id.to_string(),
                fire_at,
                title: title.to_string(),
                body: body.to_string(),
            },
        );
        Ok(())
    }

    fn cancel(&self, id: &str) -> Result<(), NotifyError> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|_| NotifyError::Backend("scheduler poisoned".to_string()))?;
        guard.remove(id);
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), NotifyError> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|_| NotifyError::Backend("scheduler poisoned".to_string()))?;
        guard.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DurationOption, Repeat, Tab};

    fn task_at(id: &str, time: NaiveDateTime, lead: NotificationLead) -> Task {
        Task {
            id: id.to_string(),
            title: "standup".to_string(),
            has_time: true,
            time,
            has_duration: false,
            duration: DurationOption::Hour1,
            tab: Tab::Flow,
            created_at: 0.0,
            date: time.date(),
            is_completed: false,
            repeat: Repeat::Daily,
            group_id: Some("g".to_string()),
            notification: lead,
        }
    }

    fn now_local() -> (NaiveDateTime, Timestamp) {
        let now = Local::now();
        (now.naive_local(), now.timestamp())
    }

    #[test]
    fn fire_time_subtracts_lead() {
        let t = NaiveDateTime::parse_from_str("2025-01-01T09:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(
            fire_time(t, NotificationLead::Min30),
            NaiveDateTime::parse_from_str("2025-01-01T08:30:00", "%Y-%m-%dT%H:%M:%S").ok()
        );
        assert_eq!(fire_time(t, NotificationLead::AtStart), Some(t));
        assert_eq!(fire_time(t, NotificationLead::None), None);
    }

    #[test]
    fn schedules_future_reminder_and_replaces_same_id() {
        let scheduler = LocalScheduler::new();
        let (now_naive, now) = now_local();
        let task = task_at("a", now_naive + Duration::hours(2), NotificationLead::Hour1);

        let outcome =
            schedule_reminder(&scheduler, &Reminder::from(&task), true, now, Locale::En).unwrap();
        let ScheduleOutcome::Scheduled { fire_at } = outcome else {
            panic!("expected scheduled, got {outcome:?}");
        };
        assert!((fire_at - (now + 3600)).abs() <= 1);

        schedule_reminder(&scheduler, &Reminder::from(&task), true, now, Locale::En).unwrap();
        let pending = scheduler.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Task reminder");
        assert_eq!(pending[0].body, "standup starts in 1 hour.");
    }

    #[test]
    fn skips_past_disabled_and_untimed_but_still_cancels() {
        let scheduler = LocalScheduler::new();
        let (now_naive, now) = now_local();
        let future = task_at("a", now_naive + Duration::hours(3), NotificationLead::AtStart);
        schedule_reminder(&scheduler, &Reminder::from(&future), true, now, Locale::Ko).unwrap();
        assert_eq!(scheduler.pending().len(), 1);

        let outcome =
            schedule_reminder(&scheduler, &Reminder::from(&future), false, now, Locale::Ko).unwrap();
        assert_eq!(outcome, ScheduleOutcome::Disabled);
        assert!(scheduler.pending().is_empty());

        let past = task_at("b", now_naive - Duration::minutes(1), NotificationLead::AtStart);
        let outcome =
            schedule_reminder(&scheduler, &Reminder::from(&past), true, now, Locale::Ko).unwrap();
        assert_eq!(outcome, ScheduleOutcome::InPast);

        let mut untimed = future.clone();
        untimed.has_time = false;
        let outcome =
            schedule_reminder(&scheduler, &Reminder::from(&untimed), true, now, Locale::Ko).unwrap();
        assert_eq!(outcome, ScheduleOutcome::NoReminder);

        let mut silent = future;
        silent.notification = NotificationLead::None;
        let outcome =
            schedule_reminder(&scheduler, &Reminder::from(&silent), true, now, Locale::Ko).unwrap();
        assert_eq!(outcome, ScheduleOutcome::NoReminder);
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn batch_is_capped_at_sixty() {
        let scheduler = LocalScheduler::new();
        let (now_naive, now) = now_local();
        let tasks: Vec<Task> = (0..90)
            .map(|i| {
                task_at(
                    &format!("t{i}"),
                    now_naive + Duration::days(i + 1),
                    NotificationLead::Min10,
                )
            })
            .collect();
        let report = schedule_batch(&scheduler, &tasks, true, now, Locale::En);
        assert_eq!(report.scheduled, NOTIFICATION_BATCH_LIMIT);
        assert!(report.errors.is_empty());
        assert_eq!(scheduler.pending().len(), NOTIFICATION_BATCH_LIMIT);
        assert!(scheduler.pending().iter().all(|n| n.id != "t60"));
    }

    #[test]
    fn rearm_skips_past_reminders_and_includes_slots() {
        let scheduler = LocalScheduler::new();
        let (now_naive, now) = now_local();
        let mut tasks: Vec<Task> = (0..5)
            .map(|i| {
                task_at(
                    &format!("old{i}"),
                    now_naive - Duration::days(i + 1),
                    NotificationLead::Min5,
                )
            })
            .collect();
        tasks.extend((0..70).map(|i| {
            task_at(
                &format!("t{i}"),
                now_naive + Duration::days(i + 1),
                NotificationLead::Min5,
            )
        }));

        let tomorrow = (now_naive + Duration::days(1)).date();
        let mut slots = DaySlots::default();
        slots.insert(
            tomorrow,
            crate::models::Slot::Wake,
            crate::models::SlotRecord {
                has_time: true,
                time: tomorrow.and_hms_opt(7, 0, 0),
                notification: NotificationLead::AtStart,
                ..Default::default()
            },
        );

        let report = rearm(&scheduler, &tasks, &slots, true, now, Locale::En);
        assert_eq!(report.scheduled, NOTIFICATION_BATCH_LIMIT + 1);
        let pending = scheduler.pending();
        assert!(pending.iter().any(|n| n.id == "t59"));
        assert!(pending.iter().all(|n| !n.id.starts_with("old")));
        assert!(pending
            .iter()
            .any(|n| n.id == slot_notification_id(tomorrow, crate::models::Slot::Wake)));

        let quiet = LocalScheduler::new();
        let report = rearm(&quiet, &tasks, &slots, false, now, Locale::En);
        assert_eq!(report, BatchReport::default());
        assert!(quiet.pending().is_empty());
    }

    #[test]
    fn take_due_drains_only_due_entries_in_order() {
        let scheduler = LocalScheduler::new();
        scheduler.schedule("late", 300, "t", "b").unwrap();
        scheduler.schedule("early", 100, "t", "b").unwrap();
        scheduler.schedule("mid", 200, "t", "b").unwrap();
        let due = scheduler.take_due(200);
        let ids: Vec<&str> = due.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid"]);
        assert_eq!(scheduler.pending().len(), 1);
        assert!(scheduler.take_due(200).is_empty());

        scheduler.cancel_all().unwrap();
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn localized_bodies() {
        assert_eq!(
            notification_body("운동", NotificationLead::AtStart, Locale::Ko),
            "운동 시작 시간입니다."
        );
        assert_eq!(
            notification_body("운동", NotificationLead::Min5, Locale::Ko),
            "운동 시작 5분 전 입니다."
        );
    }
}
