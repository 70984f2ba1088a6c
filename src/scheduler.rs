use std::time::Duration;

use chrono::Utc;
use tauri::{AppHandle, Emitter, Runtime};
use tauri_plugin_notification::NotificationExt;

use crate::events::{NotificationFiredPayload, EVENT_NOTIFICATION_FIRED};
use crate::notify::{LocalScheduler, PendingNotification};

pub fn start_scheduler<R: Runtime>(app: AppHandle<R>, scheduler: LocalScheduler) {
    tauri::async_runtime::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let due = scheduler.take_due(Utc::now().timestamp());
            if due.is_empty() {
                continue;
            }
            for notification in &due {
                show(&app, notification);
            }
            let payload: NotificationFiredPayload = due;
            let _ = app.emit(EVENT_NOTIFICATION_FIRED, payload);
        }
    });
}

fn show<R: Runtime>(app: &AppHandle<R>, notification: &PendingNotification) {
    match app
        .notification()
        .builder()
        .title(&notification.title)
        .body(&notification.body)
        .show()
    {
        Ok(()) => log::info!("notification shown id={}", notification.id),
        Err(err) => log::error!("failed to show notification id={} err={err}", notification.id),
    }
}
