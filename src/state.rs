use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};

use crate::agenda::day_flow;
use crate::ai::{suggestion_to_draft, AiTask};
use crate::modal::ModalState;
use crate::models::{
    Locale, NotificationLead, NotificationSettingFile, Repeat, Settings, Slot, SlotEdit,
    SlotRecord, SlotsFile, SortKey, Tab, Task, TaskDraft, TasksFile, ThemeSelection,
};
use crate::reorder::reindex;
use crate::repeat::expand;
use crate::slots::DaySlots;
use crate::storage::SCHEMA_VERSION;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
}

#[derive(Debug)]
struct AppData {
    tasks: Vec<Task>,
    slots: DaySlots,
    settings: Settings,
    locale: Locale,
    modal: ModalState,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupReplacement {
    pub removed: Vec<Task>,
    pub created: Vec<Task>,
}

pub fn new_group_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl AppState {
    pub fn new(tasks: Vec<Task>, slots: DaySlots, settings: Settings) -> Self {
        Self::with_locale(tasks, slots, settings, Locale::detect())
    }

    pub fn with_locale(
        tasks: Vec<Task>,
        slots: DaySlots,
        settings: Settings,
        locale: Locale,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppData {
                tasks,
                slots,
                settings,
                locale,
                modal: ModalState::Closed,
            })),
        }
    }

    pub fn replace_all(&self, tasks: Vec<Task>, slots: DaySlots, settings: Settings) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks = tasks;
        guard.slots = slots;
        guard.settings = settings;
    }

    pub fn tasks_file(&self) -> TasksFile {
        let guard = self.inner.lock().expect("state poisoned");
        TasksFile {
            schema_version: SCHEMA_VERSION,
            tasks: guard.tasks.clone(),
        }
    }

    pub fn slots_file(&self) -> SlotsFile {
        let guard = self.inner.lock().expect("state poisoned");
        guard.slots.to_file(SCHEMA_VERSION)
    }

    pub fn notifications_file(&self) -> NotificationSettingFile {
        let guard = self.inner.lock().expect("state poisoned");
        NotificationSettingFile {
            enabled: guard.settings.notifications_enabled,
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.clone()
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.iter().find(|t| t.id == task_id).cloned()
    }

    pub fn slots(&self) -> DaySlots {
        let guard = self.inner.lock().expect("state poisoned");
        guard.slots.clone()
    }

    pub fn settings(&self) -> Settings {
        let guard = self.inner.lock().expect("state poisoned");
        guard.settings.clone()
    }

    pub fn locale(&self) -> Locale {
        let guard = self.inner.lock().expect("state poisoned");
        guard.locale
    }

    pub fn modal(&self) -> ModalState {
        let guard = self.inner.lock().expect("state poisoned");
        guard.modal.clone()
    }

    pub fn set_modal(&self, modal: ModalState) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.modal = modal;
    }

    pub fn expand_and_commit(
        &self,
        draft: &TaskDraft,
        anchor: NaiveDate,
        now_ms: SortKey,
    ) -> Vec<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let title = draft.resolved_title(guard.locale);
        let created = expand(draft, &title, anchor, &new_group_id(), now_ms);
        guard.tasks.extend(created.iter().cloned());
        created
    }

    pub fn needs_scope_choice(&self, task_id: &str, draft: &TaskDraft) -> bool {
        self.task(task_id)
            .is_some_and(|task| task.is_recurring() && task.repeat != draft.repeat)
    }

    pub fn needs_delete_scope(&self, task_id: &str) -> bool {
        self.task(task_id)
            .is_some_and(|task| task.repeat != Repeat::None)
    }

    /// Rewrites one task in place. A changed repeat rule detaches it into its own group.
    pub fn update_single(
        &self,
        task_id: &str,
        draft: &TaskDraft,
        selected: NaiveDate,
    ) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let title = draft.resolved_title(guard.locale);
        let task = guard.tasks.iter_mut().find(|t| t.id == task_id)?;

        if task.repeat != draft.repeat {
            task.group_id = Some(new_group_id());
        }
        if draft.tab == Tab::Flow {
            task.date = selected;
        }
        task.title = title;
        task.has_time = draft.has_time;
        task.time = task.date.and_time(draft.time);
        task.has_duration = draft.has_duration;
        task.duration = draft.duration;
        task.tab = draft.tab;
        task.repeat = draft.repeat;
        task.notification = draft.notification;
        Some(task.clone())
    }

    pub fn replace_group(
        &self,
        task_id: &str,
        draft: &TaskDraft,
        selected: NaiveDate,
        now_ms: SortKey,
    ) -> Option<GroupReplacement> {
        let removed = self.remove_group(task_id);
        if removed.is_empty() {
            return None;
        }
        let created = self.expand_and_commit(draft, selected, now_ms);
        Some(GroupReplacement { removed, created })
    }

    pub fn remove_task(&self, task_id: &str) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let index = guard.tasks.iter().position(|t| t.id == task_id)?;
        Some(guard.tasks.remove(index))
    }

    pub fn remove_group(&self, task_id: &str) -> Vec<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let Some(target) = guard.tasks.iter().find(|t| t.id == task_id) else {
            return Vec::new();
        };
        let group = target.group().map(str::to_string);
        let (removed, kept): (Vec<Task>, Vec<Task>) =
            guard.tasks.drain(..).partition(|t| match group.as_deref() {
                Some(group) => t.group() == Some(group),
                None => t.id == task_id,
            });
        guard.tasks = kept;
        removed
    }

    pub fn toggle_complete(&self, task_id: &str) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let task = guard.tasks.iter_mut().find(|t| t.id == task_id)?;
        task.is_completed = !task.is_completed;
        Some(task.clone())
    }

    pub fn promote_inbox(&self, task_id: &str, date: NaiveDate, now_ms: SortKey) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let task = guard
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.tab == Tab::Inbox)?;
        task.tab = Tab::Flow;
        task.date = date;
        task.time = date.and_time(task.time.time());
        task.created_at = now_ms;
        Some(task.clone())
    }

    pub fn reorder_day(
        &self,
        date: NaiveDate,
        moved_id: &str,
        from_index: usize,
        to_index: usize,
        now_ms: SortKey,
    ) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let rendered = day_flow(&guard.tasks, date).rendered();
        let created_at = reindex(moved_id, from_index, to_index, &rendered, now_ms)?;
        let task = guard.tasks.iter_mut().find(|t| t.id == moved_id)?;
        task.has_time = false;
        task.tab = Tab::Flow;
        task.date = date;
        task.time = date.and_time(task.time.time());
        task.created_at = created_at;
        Some(task.clone())
    }

    pub fn slot(&self, date: NaiveDate, slot: Slot) -> SlotRecord {
        let guard = self.inner.lock().expect("state poisoned");
        guard.slots.get(date, slot)
    }

    pub fn edit_slot(&self, date: NaiveDate, slot: Slot, edit: &SlotEdit) -> SlotRecord {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.slots.apply_edit(date, slot, edit)
    }

    pub fn toggle_slot(&self, date: NaiveDate, slot: Slot) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.slots.toggle_completed(date, slot)
    }

    pub fn merge_slots(&self, slots: DaySlots) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.slots.merge(slots);
    }

    pub fn set_notifications_enabled(&self, enabled: bool) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.settings.notifications_enabled = enabled;
    }

    pub fn set_theme(&self, theme: ThemeSelection) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.settings.theme = theme;
    }

    pub fn reset_data(&self) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks.clear();
        guard.slots = DaySlots::default();
    }

    /// Adds an accepted AI suggestion onto `date`'s flow. Suggestions never carry a reminder.
    pub fn add_suggestion(
        &self,
        suggestion: &AiTask,
        date: NaiveDate,
        fallback_time: NaiveTime,
        now_ms: SortKey,
    ) -> Vec<Task> {
        let mut draft = suggestion_to_draft(suggestion, fallback_time);
        draft.notification = NotificationLead::None;
        self.expand_and_commit(&draft, date, now_ms)
    }
}
