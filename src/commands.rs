use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

use crate::agenda::{self, DayProgress};
use crate::ai::{AiError, AiSuggestions, AiTask};
use crate::events::StatePayload;
#[cfg(all(feature = "app", not(test)))]
use crate::events::EVENT_STATE_UPDATED;
use crate::modal::{EditorCommit, ModalAction, ModalState};
use crate::models::{
    Locale, Scope, Settings, Slot, SlotEdit, SlotRecord, SortKey, Task, TaskDraft,
    ThemeSelection,
};
use crate::notify::{
    notification_title, rearm, schedule_batch, schedule_reminder, Notifier, NotifyError, Reminder,
};
use crate::slots::{slot_notification_id, DaySlots};
use crate::state::AppState;
use crate::storage::{Storage, StorageError};
use crate::theme::{self, ResolvedTheme};

#[cfg(all(feature = "app", not(test)))]
use crate::notify::LocalScheduler;
#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter, Manager, Runtime, State};

const TEST_NOTIFICATION_ID: &str = "test";

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EditOutcome {
    NeedsScope,
    Applied { tasks: Vec<Task> },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModalView {
    pub modal: ModalState,
    pub applied: Option<EditOutcome>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekView {
    pub days: Vec<(NaiveDate, DayProgress)>,
    pub flow: Vec<Task>,
    pub inbox_count: usize,
    pub prompt_hint: String,
}

trait CommandCtx {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError>;
    fn emit_state_updated(&self, payload: StatePayload);
    fn notifier(&self) -> &dyn Notifier;
    fn request_notification_permission(&self) -> Result<bool, NotifyError>;
    fn now(&self) -> DateTime<Local>;
}

fn ok<T>(data: T) -> CommandResult<T> {
    ok_with(data, Vec::new())
}

fn ok_with<T>(data: T, warnings: Vec<String>) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
        warnings,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
        warnings: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dirty {
    Tasks,
    Slots,
    Settings,
}

fn now_ms(ctx: &impl CommandCtx) -> SortKey {
    ctx.now().timestamp_millis() as SortKey
}

fn open_storage(ctx: &impl CommandCtx) -> Result<Storage, StorageError> {
    let storage = Storage::new(ctx.app_data_dir()?);
    storage.ensure_dirs()?;
    Ok(storage)
}

pub fn state_payload(state: &AppState) -> StatePayload {
    let settings = state.settings();
    StatePayload {
        tasks: state.tasks(),
        slots: state.slots().to_map(),
        theme: theme::resolve(&settings.theme),
        settings,
    }
}

/// Writes the changed files and broadcasts the new state. In-memory state is never rolled
/// back; failures come back as warnings.
fn persist(ctx: &impl CommandCtx, state: &AppState, dirty: &[Dirty]) -> Vec<String> {
    let mut warnings = Vec::new();
    match open_storage(ctx) {
        Ok(storage) => {
            for part in dirty {
                let result = match part {
                    Dirty::Tasks => storage.save_tasks(&state.tasks_file()),
                    Dirty::Slots => storage.save_slots(&state.slots_file()),
                    Dirty::Settings => storage
                        .save_notifications(&state.notifications_file())
                        .and_then(|_| storage.save_theme(&state.settings().theme)),
                };
                if let Err(error) = result {
                    log::error!("failed to persist part={part:?} err={error}");
                    warnings.push(format!("storage error: {error}"));
                }
            }
        }
        Err(error) => {
            log::error!("storage unavailable err={error}");
            warnings.push(format!("storage error: {error}"));
        }
    }
    ctx.emit_state_updated(state_payload(state));
    warnings
}

fn reschedule(ctx: &impl CommandCtx, state: &AppState, task: &Task, warnings: &mut Vec<String>) {
    let enabled = state.settings().notifications_enabled;
    if let Err(error) = schedule_reminder(
        ctx.notifier(),
        &Reminder::from(task),
        enabled,
        ctx.now().timestamp(),
        state.locale(),
    ) {
        log::error!("failed to schedule reminder id={} err={error}", task.id);
        warnings.push(format!("notification error: {error}"));
    }
}

fn schedule_first_batch(
    ctx: &impl CommandCtx,
    state: &AppState,
    tasks: &[Task],
    warnings: &mut Vec<String>,
) {
    let report = schedule_batch(
        ctx.notifier(),
        tasks,
        state.settings().notifications_enabled,
        ctx.now().timestamp(),
        state.locale(),
    );
    log::debug!(
        "reminder batch scheduled={} skipped={} errors={}",
        report.scheduled,
        report.skipped,
        report.errors.len()
    );
    warnings.extend(
        report
            .errors
            .into_iter()
            .map(|error| format!("notification error: {error}")),
    );
}

fn rearm_reminders(ctx: &impl CommandCtx, state: &AppState, warnings: &mut Vec<String>) {
    let report = rearm(
        ctx.notifier(),
        &state.tasks(),
        &state.slots(),
        state.settings().notifications_enabled,
        ctx.now().timestamp(),
        state.locale(),
    );
    log::info!(
        "reminders re-armed scheduled={} skipped={} errors={}",
        report.scheduled,
        report.skipped,
        report.errors.len()
    );
    warnings.extend(
        report
            .errors
            .into_iter()
            .map(|error| format!("notification error: {error}")),
    );
}

fn cancel_reminders(ctx: &impl CommandCtx, tasks: &[Task], warnings: &mut Vec<String>) {
    for task in tasks {
        if let Err(error) = ctx.notifier().cancel(&task.id) {
            log::error!("failed to cancel reminder id={} err={error}", task.id);
            warnings.push(format!("notification error: {error}"));
        }
    }
}

fn load_state_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<StatePayload> {
    let storage = match open_storage(ctx) {
        Ok(storage) => storage,
        Err(e) => return err(&format!("storage error: {e}")),
    };
    let mut warnings = Vec::new();
    let mut note = |what: &str, error: StorageError| {
        log::error!("failed to load {what} err={error}");
        warnings.push(format!("failed to load {what}: {error}"));
    };

    let tasks = storage
        .load_tasks()
        .map(|file| file.tasks)
        .unwrap_or_else(|error| {
            note("tasks", error);
            Vec::new()
        });
    let slots = storage
        .load_slots()
        .map(DaySlots::from_file)
        .unwrap_or_else(|error| {
            note("slots", error);
            DaySlots::default()
        });
    let notifications = storage.load_notifications().unwrap_or_else(|error| {
        note("notification setting", error);
        Default::default()
    });
    let theme = storage.load_theme().unwrap_or_else(|error| {
        note("theme", error);
        ThemeSelection::default()
    });

    log::info!("state loaded tasks={} slots={}", tasks.len(), slots.len());
    state.replace_all(tasks, slots, Settings::new(notifications.enabled, theme));

    if let Err(error) = ctx.notifier().cancel_all() {
        log::error!("failed to clear reminders err={error}");
        warnings.push(format!("notification error: {error}"));
    }
    rearm_reminders(ctx, state, &mut warnings);
    ok_with(state_payload(state), warnings)
}

fn week_view_impl(state: &AppState, anchor: NaiveDate, today: NaiveDate) -> CommandResult<WeekView> {
    let tasks = state.tasks();
    let slots = state.slots();
    ok(WeekView {
        days: agenda::week_progress(&tasks, &slots, anchor),
        flow: agenda::day_flow(&tasks, anchor).rendered(),
        inbox_count: agenda::inbox_count(&tasks),
        prompt_hint: agenda::prompt_hint(today, anchor, state.locale()),
    })
}

fn inbox_page_impl(state: &AppState, page: usize) -> CommandResult<Vec<Task>> {
    ok(agenda::inbox_page(&state.tasks(), page))
}

fn create_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    draft: TaskDraft,
    date: NaiveDate,
) -> CommandResult<Vec<Task>> {
    let created = state.expand_and_commit(&draft, date, now_ms(ctx));
    log::info!(
        "tasks created count={} repeat={}",
        created.len(),
        draft.repeat.id()
    );
    let mut warnings = Vec::new();
    schedule_first_batch(ctx, state, &created, &mut warnings);
    warnings.extend(persist(ctx, state, &[Dirty::Tasks]));
    ok_with(created, warnings)
}

fn edit_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
    draft: TaskDraft,
    date: NaiveDate,
    scope: Option<Scope>,
) -> CommandResult<EditOutcome> {
    let scope = match scope {
        Some(scope) => scope,
        None if state.needs_scope_choice(&task_id, &draft) => return ok(EditOutcome::NeedsScope),
        None => Scope::Single,
    };

    let mut warnings = Vec::new();
    let tasks = match scope {
        Scope::Single => match state.update_single(&task_id, &draft, date) {
            Some(task) => {
                reschedule(ctx, state, &task, &mut warnings);
                vec![task]
            }
            None => Vec::new(),
        },
        Scope::All => match state.replace_group(&task_id, &draft, date, now_ms(ctx)) {
            Some(replacement) => {
                log::info!(
                    "group replaced removed={} created={}",
                    replacement.removed.len(),
                    replacement.created.len()
                );
                cancel_reminders(ctx, &replacement.removed, &mut warnings);
                schedule_first_batch(ctx, state, &replacement.created, &mut warnings);
                replacement.created
            }
            None => Vec::new(),
        },
    };
    if tasks.is_empty() {
        log::debug!("edit ignored, task not found id={task_id}");
        return ok(EditOutcome::Applied { tasks });
    }
    warnings.extend(persist(ctx, state, &[Dirty::Tasks]));
    ok_with(EditOutcome::Applied { tasks }, warnings)
}

fn delete_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
    scope: Option<Scope>,
) -> CommandResult<EditOutcome> {
    let scope = match scope {
        Some(scope) => scope,
        None if state.needs_delete_scope(&task_id) => return ok(EditOutcome::NeedsScope),
        None => Scope::Single,
    };
    let removed = match scope {
        Scope::Single => state.remove_task(&task_id).into_iter().collect(),
        Scope::All => state.remove_group(&task_id),
    };
    if removed.is_empty() {
        return ok(EditOutcome::Applied { tasks: removed });
    }
    log::info!("tasks deleted count={} scope={scope:?}", removed.len());
    let mut warnings = Vec::new();
    cancel_reminders(ctx, &removed, &mut warnings);
    warnings.extend(persist(ctx, state, &[Dirty::Tasks]));
    ok_with(EditOutcome::Applied { tasks: removed }, warnings)
}

fn toggle_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
) -> CommandResult<Option<Task>> {
    let Some(task) = state.toggle_complete(&task_id) else {
        return ok(None);
    };
    let warnings = persist(ctx, state, &[Dirty::Tasks]);
    ok_with(Some(task), warnings)
}

fn promote_inbox_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
    date: NaiveDate,
) -> CommandResult<Option<Task>> {
    let Some(task) = state.promote_inbox(&task_id, date, now_ms(ctx)) else {
        return ok(None);
    };
    let mut warnings = Vec::new();
    reschedule(ctx, state, &task, &mut warnings);
    warnings.extend(persist(ctx, state, &[Dirty::Tasks]));
    ok_with(Some(task), warnings)
}

fn reorder_day_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    date: NaiveDate,
    task_id: String,
    from_index: usize,
    to_index: usize,
) -> CommandResult<Option<Task>> {
    let Some(task) = state.reorder_day(date, &task_id, from_index, to_index, now_ms(ctx)) else {
        return ok(None);
    };
    let mut warnings = Vec::new();
    // The moved item lost its time, so its reminder goes too.
    reschedule(ctx, state, &task, &mut warnings);
    warnings.extend(persist(ctx, state, &[Dirty::Tasks]));
    ok_with(Some(task), warnings)
}

fn edit_slot_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    date: NaiveDate,
    slot: Slot,
    edit: SlotEdit,
) -> CommandResult<SlotRecord> {
    let record = state.edit_slot(date, slot, &edit);
    let id = slot_notification_id(date, slot);
    let title = record.title_or_default(slot, state.locale());
    let reminder = Reminder {
        id: &id,
        title: &title,
        has_time: record.has_time,
        time: edit.time,
        lead: record.notification,
    };
    let mut warnings = Vec::new();
    if let Err(error) = schedule_reminder(
        ctx.notifier(),
        &reminder,
        state.settings().notifications_enabled,
        ctx.now().timestamp(),
        state.locale(),
    ) {
        log::error!("failed to schedule slot reminder id={id} err={error}");
        warnings.push(format!("notification error: {error}"));
    }
    warnings.extend(persist(ctx, state, &[Dirty::Slots]));
    ok_with(record, warnings)
}

fn toggle_slot_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    date: NaiveDate,
    slot: Slot,
) -> CommandResult<bool> {
    let completed = state.toggle_slot(date, slot);
    let warnings = persist(ctx, state, &[Dirty::Slots]);
    ok_with(completed, warnings)
}

fn set_notifications_enabled_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    enabled: bool,
) -> CommandResult<Settings> {
    let mut warnings = Vec::new();
    if enabled {
        match ctx.request_notification_permission() {
            Ok(true) => {}
            Ok(false) => {
                log::warn!("notification permission denied");
                return err(&NotifyError::PermissionDenied.to_string());
            }
            Err(error) => return err(&format!("notification error: {error}")),
        }
        state.set_notifications_enabled(true);
        rearm_reminders(ctx, state, &mut warnings);
    } else {
        state.set_notifications_enabled(false);
        if let Err(error) = ctx.notifier().cancel_all() {
            log::error!("failed to cancel reminders err={error}");
            warnings.push(format!("notification error: {error}"));
        }
    }
    log::info!("notifications enabled={enabled}");
    warnings.extend(persist(ctx, state, &[Dirty::Settings]));
    ok_with(state.settings(), warnings)
}

fn send_test_notification_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<bool> {
    if !state.settings().notifications_enabled {
        return err("notifications are disabled");
    }
    let body = match state.locale() {
        Locale::Ko => "알림이 정상적으로 작동합니다!",
        Locale::En => "Notifications are working!",
    };
    match ctx.notifier().schedule(
        TEST_NOTIFICATION_ID,
        ctx.now().timestamp(),
        notification_title(state.locale()),
        body,
    ) {
        Ok(()) => ok(true),
        Err(error) => err(&format!("notification error: {error}")),
    }
}

fn set_theme_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    selection: ThemeSelection,
) -> CommandResult<ResolvedTheme> {
    let resolved = theme::resolve(&selection);
    state.set_theme(selection);
    let warnings = persist(ctx, state, &[Dirty::Settings]);
    ok_with(resolved, warnings)
}

fn reset_data_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<bool> {
    state.reset_data();
    let mut warnings = Vec::new();
    if let Err(error) = ctx.notifier().cancel_all() {
        log::error!("failed to cancel reminders err={error}");
        warnings.push(format!("notification error: {error}"));
    }
    if let Err(error) = open_storage(ctx).and_then(|storage| storage.clear_data()) {
        log::error!("failed to clear data err={error}");
        warnings.push(format!("storage error: {error}"));
    }
    log::warn!("all tasks and slots cleared");
    state.set_modal(ModalState::Closed);
    ctx.emit_state_updated(state_payload(state));
    ok_with(true, warnings)
}

fn add_ai_suggestion_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    suggestion: AiTask,
    date: NaiveDate,
) -> CommandResult<Vec<Task>> {
    if suggestion.title.trim().is_empty() {
        return err("suggestion has no title");
    }
    let now = ctx.now();
    let created = state.add_suggestion(
        &suggestion,
        date,
        now.time(),
        now.timestamp_millis() as SortKey,
    );
    let warnings = persist(ctx, state, &[Dirty::Tasks]);
    ok_with(created, warnings)
}

fn import_legacy_meta_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    path: &Path,
) -> CommandResult<usize> {
    let storage = match open_storage(ctx) {
        Ok(storage) => storage,
        Err(e) => return err(&format!("storage error: {e}")),
    };
    let imported = match storage.import_legacy_meta(path) {
        Ok(slots) => slots,
        Err(e) => return err(&format!("import error: {e}")),
    };
    let count = imported.len();
    state.merge_slots(imported);
    log::info!("legacy meta imported records={count}");
    let warnings = persist(ctx, state, &[Dirty::Slots]);
    ok_with(count, warnings)
}

fn apply_editor_commit_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    commit: EditorCommit,
) -> CommandResult<EditOutcome> {
    match commit {
        EditorCommit::Create { draft, date } => {
            let result = create_task_impl(ctx, state, draft, date);
            CommandResult {
                ok: result.ok,
                data: result.data.map(|tasks| EditOutcome::Applied { tasks }),
                error: result.error,
                warnings: result.warnings,
            }
        }
        EditorCommit::Edit {
            task_id,
            draft,
            date,
            scope,
        } => edit_task_impl(ctx, state, task_id, draft, date, Some(scope)),
        EditorCommit::Slot { date, slot, edit } => {
            let result = edit_slot_impl(ctx, state, date, slot, edit);
            CommandResult {
                ok: result.ok,
                data: result.data.map(|_| EditOutcome::Applied { tasks: Vec::new() }),
                error: result.error,
                warnings: result.warnings,
            }
        }
    }
}

fn modal_action_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    action: ModalAction,
) -> CommandResult<ModalView> {
    let current = state.modal();
    let now = ctx.now().time();
    let mut warnings = Vec::new();
    let mut applied = None;

    let (next, commit) = match action {
        ModalAction::OpenNewTask { tab, date } => (ModalState::new_task(tab, date, now), None),
        ModalAction::OpenTask { task_id } => match state.task(&task_id) {
            Some(task) => (ModalState::edit_task(&task), None),
            None => (current, None),
        },
        ModalAction::OpenSlot { date, slot } => {
            let record = state.slot(date, slot);
            let modal = ModalState::edit_slot(date, slot, &record, now, state.locale());
            (modal, None)
        }
        ModalAction::OpenShortcutMenu { task_id } => (ModalState::shortcut_menu(&task_id), None),
        ModalAction::OpenInbox => (ModalState::inbox(), None),
        ModalAction::OpenSettings => (ModalState::settings(), None),
        ModalAction::OpenAiPrompt => (ModalState::ai_prompt(), None),
        ModalAction::LoadMore => (current.load_more(), None),
        ModalAction::TogglePicker { picker } => (current.toggle_picker(picker), None),
        ModalAction::UpdateDraft { draft } => (current.update_draft(|d| *d = draft), None),
        ModalAction::ToggleAccent => (current.toggle_accent(), None),
        ModalAction::AskReset => (current.confirm_reset(), None),
        ModalAction::ConfirmReset => match current {
            ModalState::ResetConfirm => {
                warnings.extend(reset_data_impl(ctx, state).warnings);
                (ModalState::Closed, None)
            }
            other => (other, None),
        },
        ModalAction::SetPromptText { text } => (current.set_prompt_text(&text), None),
        ModalAction::SubmitPrompt => (current.submit_prompt(), None),
        ModalAction::EditSuggestion { index, date } => {
            (current.edit_suggestion(index, date, now), None)
        }
        ModalAction::AcceptSuggestion { index, date } => {
            let picked = match &current {
                ModalState::AiResult(suggestions) => suggestions.tasks.get(index).cloned(),
                _ => None,
            };
            match picked {
                Some(suggestion) => {
                    let result = add_ai_suggestion_impl(ctx, state, suggestion, date);
                    let Some(tasks) = result.data else {
                        return err(result.error.as_deref().unwrap_or("suggestion rejected"));
                    };
                    warnings.extend(result.warnings);
                    applied = Some(EditOutcome::Applied { tasks });
                    (current.remove_suggestion(index), None)
                }
                None => (current, None),
            }
        }
        ModalAction::Save => current.save(),
        ModalAction::ChooseScope { scope } => (current.choose_scope(scope), None),
        ModalAction::ConfirmScope => current.confirm_scope(),
        ModalAction::Cancel => (current.cancel(), None),
    };

    if let Some(commit) = commit {
        let result = apply_editor_commit_impl(ctx, state, commit);
        if !result.ok {
            return err(result.error.as_deref().unwrap_or("editor commit failed"));
        }
        warnings.extend(result.warnings);
        applied = result.data;
    }

    state.set_modal(next.clone());
    ok_with(
        ModalView {
            modal: next,
            applied,
        },
        warnings,
    )
}

/// Hands a finished AI request to the prompt modal. A failure keeps the prompt open with
/// its text so the user can retry.
fn finish_prompt_impl(
    state: &AppState,
    result: Result<AiSuggestions, AiError>,
) -> CommandResult<AiSuggestions> {
    match result {
        Ok(suggestions) => {
            log::info!("ai suggestions received count={}", suggestions.tasks.len());
            state.set_modal(state.modal().prompt_finished(Some(suggestions.clone())));
            ok(suggestions)
        }
        Err(error) => {
            log::error!("ai suggestion failed err={error}");
            state.set_modal(state.modal().prompt_finished(None));
            err(&error.to_string())
        }
    }
}

#[cfg(all(feature = "app", not(test)))]
struct TauriCommandCtx<'a, R: Runtime> {
    app: &'a AppHandle<R>,
    scheduler: &'a LocalScheduler,
}

#[cfg(all(feature = "app", not(test)))]
impl<R: Runtime> CommandCtx for TauriCommandCtx<'_, R> {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError> {
        self.app
            .path()
            .app_data_dir()
            .map_err(|err| StorageError::Io(std::io::Error::other(err.to_string())))
    }

    fn emit_state_updated(&self, payload: StatePayload) {
        let _ = self.app.emit(EVENT_STATE_UPDATED, payload);
    }

    fn notifier(&self) -> &dyn Notifier {
        self.scheduler
    }

    fn request_notification_permission(&self) -> Result<bool, NotifyError> {
        use tauri::plugin::PermissionState;
        use tauri_plugin_notification::NotificationExt;

        let notification = self.app.notification();
        let current = notification
            .permission_state()
            .map_err(|e| NotifyError::Backend(e.to_string()))?;
        if current == PermissionState::Granted {
            return Ok(true);
        }
        let requested = notification
            .request_permission()
            .map_err(|e| NotifyError::Backend(e.to_string()))?;
        Ok(requested == PermissionState::Granted)
    }

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn load_state(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
) -> CommandResult<StatePayload> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    load_state_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn week_view(state: State<AppState>, anchor: NaiveDate) -> CommandResult<WeekView> {
    week_view_impl(state.inner(), anchor, Local::now().date_naive())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn inbox_page(state: State<AppState>, page: usize) -> CommandResult<Vec<Task>> {
    inbox_page_impl(state.inner(), page)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn create_task(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    draft: TaskDraft,
    date: NaiveDate,
) -> CommandResult<Vec<Task>> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    create_task_impl(&ctx, state.inner(), draft, date)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn edit_task(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    task_id: String,
    draft: TaskDraft,
    date: NaiveDate,
    scope: Option<Scope>,
) -> CommandResult<EditOutcome> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    edit_task_impl(&ctx, state.inner(), task_id, draft, date, scope)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn delete_task(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    task_id: String,
    scope: Option<Scope>,
) -> CommandResult<EditOutcome> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    delete_task_impl(&ctx, state.inner(), task_id, scope)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn toggle_task(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    task_id: String,
) -> CommandResult<Option<Task>> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    toggle_task_impl(&ctx, state.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn promote_inbox_task(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    task_id: String,
    date: NaiveDate,
) -> CommandResult<Option<Task>> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    promote_inbox_task_impl(&ctx, state.inner(), task_id, date)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn reorder_day(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    date: NaiveDate,
    task_id: String,
    from_index: usize,
    to_index: usize,
) -> CommandResult<Option<Task>> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    reorder_day_impl(&ctx, state.inner(), date, task_id, from_index, to_index)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn edit_slot(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    date: NaiveDate,
    slot: Slot,
    edit: SlotEdit,
) -> CommandResult<SlotRecord> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    edit_slot_impl(&ctx, state.inner(), date, slot, edit)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn toggle_slot(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    date: NaiveDate,
    slot: Slot,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    toggle_slot_impl(&ctx, state.inner(), date, slot)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_notifications_enabled(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    enabled: bool,
) -> CommandResult<Settings> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    set_notifications_enabled_impl(&ctx, state.inner(), enabled)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn send_test_notification(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    send_test_notification_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_theme(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    selection: ThemeSelection,
) -> CommandResult<ResolvedTheme> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    set_theme_impl(&ctx, state.inner(), selection)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn reset_data(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    reset_data_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn add_ai_suggestion(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    suggestion: AiTask,
    date: NaiveDate,
) -> CommandResult<Vec<Task>> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    add_ai_suggestion_impl(&ctx, state.inner(), suggestion, date)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn import_legacy_meta(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    path: String,
) -> CommandResult<usize> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    import_legacy_meta_impl(&ctx, state.inner(), Path::new(&path))
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn apply_editor_commit(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    commit: EditorCommit,
) -> CommandResult<EditOutcome> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    apply_editor_commit_impl(&ctx, state.inner(), commit)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn modal_action(
    app: AppHandle,
    state: State<AppState>,
    scheduler: State<LocalScheduler>,
    action: ModalAction,
) -> CommandResult<ModalView> {
    let ctx = TauriCommandCtx {
        app: &app,
        scheduler: scheduler.inner(),
    };
    modal_action_impl(&ctx, state.inner(), action)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn suggest_tasks(app: AppHandle, text: String) -> CommandResult<AiSuggestions> {
    if text.trim().is_empty() {
        return err("prompt is empty");
    }
    let state = app.state::<AppState>().inner().clone();
    let config = crate::ai::AiConfig::from_env();
    let result = crate::ai::suggest_with_gemini(&config, &text, state.locale()).await;
    finish_prompt_impl(&state, result)
}
