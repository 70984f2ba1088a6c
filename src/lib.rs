mod agenda;
mod ai;
mod commands;
mod events;
mod logging;
mod modal;
mod models;
mod notify;
mod reorder;
mod repeat;
#[cfg(all(feature = "app", not(test)))]
mod scheduler;
mod slots;
mod state;
mod storage;
mod theme;

pub use agenda::{DayFlow, DayProgress, INBOX_PAGE_SIZE};
pub use ai::{AiSuggestions, AiTask};
pub use commands::{CommandResult, EditOutcome, ModalView, WeekView};
pub use modal::{EditorCommit, ModalAction, ModalState};
pub use models::{Locale, Repeat, Scope, Slot, Task, TaskDraft};
pub use notify::{LocalScheduler, Notifier};
pub use state::AppState;
pub use storage::{Storage, StorageError};

#[cfg(all(feature = "app", not(test)))]
use tauri::Manager;

#[cfg(all(feature = "app", not(test)))]
use crate::commands::*;
#[cfg(all(feature = "app", not(test)))]
use crate::models::Settings;
#[cfg(all(feature = "app", not(test)))]
use crate::scheduler::start_scheduler;
#[cfg(all(feature = "app", not(test)))]
use crate::slots::DaySlots;

#[cfg(all(feature = "app", not(test)))]
fn load_initial_state(storage: &Storage) -> AppState {
    let tasks = storage
        .load_tasks()
        .map(|data| data.tasks)
        .unwrap_or_else(|err| {
            log::error!("failed to load tasks err={err}");
            Vec::new()
        });
    let slots = storage
        .load_slots()
        .map(DaySlots::from_file)
        .unwrap_or_else(|err| {
            log::error!("failed to load slots err={err}");
            DaySlots::default()
        });
    let notifications = storage.load_notifications().unwrap_or_else(|err| {
        log::error!("failed to load notification setting err={err}");
        Default::default()
    });
    let theme = storage.load_theme().unwrap_or_else(|err| {
        log::error!("failed to load theme err={err}");
        Default::default()
    });
    log::info!("startup state tasks={} slots={}", tasks.len(), slots.len());
    AppState::new(tasks, slots, Settings::new(notifications.enabled, theme))
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
#[cfg(all(feature = "app", not(test)))]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_notification::init())
        .setup(|app| {
            let storage = Storage::new(app.path().app_data_dir()?);
            storage.ensure_dirs()?;
            if let Err(err) = logging::init_logging(storage.root()) {
                eprintln!("failed to initialize logger: {err}");
            }

            let state = load_initial_state(&storage);
            let scheduler = LocalScheduler::new();
            let report = notify::rearm(
                &scheduler,
                &state.tasks(),
                &state.slots(),
                state.settings().notifications_enabled,
                chrono::Local::now().timestamp(),
                state.locale(),
            );
            log::info!(
                "startup reminders scheduled={} skipped={} errors={}",
                report.scheduled,
                report.skipped,
                report.errors.len()
            );
            app.manage(state);
            app.manage(scheduler.clone());
            start_scheduler(app.handle().clone(), scheduler);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_state,
            week_view,
            inbox_page,
            create_task,
            edit_task,
            delete_task,
            toggle_task,
            promote_inbox_task,
            reorder_day,
            edit_slot,
            toggle_slot,
            set_notifications_enabled,
            send_test_notification,
            set_theme,
            reset_data,
            suggest_tasks,
            add_ai_suggestion,
            import_legacy_meta,
            apply_editor_commit,
            modal_action,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
