use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::ai::{draft_to_suggestion, suggestion_to_draft, AiSuggestions};
use crate::models::{Locale, Repeat, Scope, Slot, SlotEdit, SlotRecord, Tab, Task, TaskDraft};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditorTarget {
    New,
    Task { task_id: String, recurring: bool },
    Slot { slot: Slot },
    AiSuggestion { index: usize, suggestions: AiSuggestions },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Picker {
    Time,
    Duration,
    Notification,
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSession {
    pub target: EditorTarget,
    pub draft: TaskDraft,
    pub date: NaiveDate,
    pub picker: Option<Picker>,
    #[serde(skip)]
    original_repeat: Option<Repeat>,
}

impl EditorSession {
    fn new(target: EditorTarget, draft: TaskDraft, date: NaiveDate) -> Self {
        let original_repeat = match target {
            EditorTarget::Task { recurring: true, .. } => Some(draft.repeat),
            _ => None,
        };
        Self {
            target,
            draft,
            date,
            picker: None,
            original_repeat,
        }
    }

    pub fn needs_scope_choice(&self) -> bool {
        self.original_repeat
            .is_some_and(|original| original != self.draft.repeat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditorCommit {
    Create {
        draft: TaskDraft,
        date: NaiveDate,
    },
    Edit {
        task_id: String,
        draft: TaskDraft,
        date: NaiveDate,
        scope: Scope,
    },
    Slot {
        date: NaiveDate,
        slot: Slot,
        edit: SlotEdit,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModalAction {
    OpenNewTask { tab: Tab, date: NaiveDate },
    OpenTask { task_id: String },
    OpenSlot { date: NaiveDate, slot: Slot },
    OpenShortcutMenu { task_id: String },
    OpenInbox,
    OpenSettings,
    OpenAiPrompt,
    LoadMore,
    TogglePicker { picker: Picker },
    UpdateDraft { draft: TaskDraft },
    ToggleAccent,
    AskReset,
    ConfirmReset,
    SetPromptText { text: String },
    SubmitPrompt,
    EditSuggestion { index: usize, date: NaiveDate },
    AcceptSuggestion { index: usize, date: NaiveDate },
    Save,
    ChooseScope { scope: Scope },
    ConfirmScope,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModalState {
    #[default]
    Closed,
    ShortcutMenu {
        task_id: String,
    },
    Inbox {
        page: usize,
    },
    TaskEditor(EditorSession),
    RepeatScope {
        session: EditorSession,
        scope: Scope,
    },
    Settings {
        accent_expanded: bool,
    },
    ResetConfirm,
    AiPrompt {
        text: String,
        loading: bool,
    },
    AiResult(AiSuggestions),
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::Closed)
    }

    pub fn new_task(tab: Tab, date: NaiveDate, now: NaiveTime) -> Self {
        let draft = TaskDraft::new(tab, now);
        ModalState::TaskEditor(EditorSession::new(EditorTarget::New, draft, date))
    }

    pub fn edit_task(task: &Task) -> Self {
        let target = EditorTarget::Task {
            task_id: task.id.clone(),
            recurring: task.is_recurring(),
        };
        ModalState::TaskEditor(EditorSession::new(
            target,
            TaskDraft::from_task(task),
            task.date,
        ))
    }

    pub fn edit_slot(
        date: NaiveDate,
        slot: Slot,
        record: &SlotRecord,
        default_time: NaiveTime,
        locale: Locale,
    ) -> Self {
        let mut draft = TaskDraft::new(Tab::Flow, default_time);
        draft.title = record.title_or_default(slot, locale);
        draft.has_time = record.has_time;
        draft.time = record.time.map(|t| t.time()).unwrap_or(default_time);
        draft.notification = record.notification;
        ModalState::TaskEditor(EditorSession::new(EditorTarget::Slot { slot }, draft, date))
    }

    pub fn shortcut_menu(task_id: &str) -> Self {
        ModalState::ShortcutMenu {
            task_id: task_id.to_string(),
        }
    }

    pub fn inbox() -> Self {
        ModalState::Inbox { page: 1 }
    }

    pub fn settings() -> Self {
        ModalState::Settings {
            accent_expanded: false,
        }
    }

    pub fn ai_prompt() -> Self {
        ModalState::AiPrompt {
            text: String::new(),
            loading: false,
        }
    }

    pub fn load_more(self) -> Self {
        match self {
            ModalState::Inbox { page } => ModalState::Inbox { page: page + 1 },
            other => other,
        }
    }

    /// Opens `picker`, or collapses it if it is already open. Any other picker closes.
    pub fn toggle_picker(self, picker: Picker) -> Self {
        match self {
            ModalState::TaskEditor(mut session) => {
                session.picker = (session.picker != Some(picker)).then_some(picker);
                ModalState::TaskEditor(session)
            }
            other => other,
        }
    }

    pub fn update_draft(self, update: impl FnOnce(&mut TaskDraft)) -> Self {
        match self {
            ModalState::TaskEditor(mut session) => {
                update(&mut session.draft);
                ModalState::TaskEditor(session)
            }
            other => other,
        }
    }

    pub fn toggle_accent(self) -> Self {
        match self {
            ModalState::Settings { accent_expanded } => ModalState::Settings {
                accent_expanded: !accent_expanded,
            },
            other => other,
        }
    }

    pub fn confirm_reset(self) -> Self {
        match self {
            ModalState::Settings { .. } => ModalState::ResetConfirm,
            other => other,
        }
    }

    pub fn set_prompt_text(self, value: &str) -> Self {
        match self {
            ModalState::AiPrompt { loading: false, .. } => ModalState::AiPrompt {
                text: value.to_string(),
                loading: false,
            },
            other => other,
        }
    }

    pub fn submit_prompt(self) -> Self {
        match self {
            ModalState::AiPrompt {
                text,
                loading: false,
            } if !text.trim().is_empty() => ModalState::AiPrompt {
                text,
                loading: true,
            },
            other => other,
        }
    }

    pub fn prompt_finished(self, result: Option<AiSuggestions>) -> Self {
        match (self, result) {
            (ModalState::AiPrompt { loading: true, .. }, Some(suggestions)) => {
                ModalState::AiResult(suggestions)
            }
            (ModalState::AiPrompt { text, loading: true }, None) => ModalState::AiPrompt {
                text,
                loading: false,
            },
            (other, _) => other,
        }
    }

    pub fn edit_suggestion(self, index: usize, date: NaiveDate, fallback_time: NaiveTime) -> Self {
        match self {
            ModalState::AiResult(suggestions) => {
                let Some(draft) = suggestions
                    .tasks
                    .get(index)
                    .map(|task| suggestion_to_draft(task, fallback_time))
                else {
                    return ModalState::AiResult(suggestions);
                };
                let target = EditorTarget::AiSuggestion { index, suggestions };
                ModalState::TaskEditor(EditorSession::new(target, draft, date))
            }
            other => other,
        }
    }

    pub fn remove_suggestion(self, index: usize) -> Self {
        match self {
            ModalState::AiResult(mut suggestions) => {
                if index < suggestions.tasks.len() {
                    suggestions.tasks.remove(index);
                }
                ModalState::AiResult(suggestions)
            }
            other => other,
        }
    }

    pub fn save(self) -> (Self, Option<EditorCommit>) {
        let session = match self {
            ModalState::TaskEditor(session) => session,
            other => return (other, None),
        };
        if session.needs_scope_choice() {
            return (
                ModalState::RepeatScope {
                    session,
                    scope: Scope::Single,
                },
                None,
            );
        }
        finish(session, Scope::Single)
    }

    pub fn choose_scope(self, scope: Scope) -> Self {
        match self {
            ModalState::RepeatScope { session, .. } => ModalState::RepeatScope { session, scope },
            other => other,
        }
    }

    pub fn confirm_scope(self) -> (Self, Option<EditorCommit>) {
        match self {
            ModalState::RepeatScope { session, scope } => finish(session, scope),
            other => (other, None),
        }
    }

    /// Backs out one level: a scope prompt returns to its editor, a suggestion editor returns
    /// to its list, everything else closes.
    pub fn cancel(self) -> Self {
        match self {
            ModalState::RepeatScope { session, .. } => ModalState::TaskEditor(session),
            ModalState::TaskEditor(EditorSession {
                target: EditorTarget::AiSuggestion { suggestions, .. },
                ..
            }) => ModalState::AiResult(suggestions),
            ModalState::TaskEditor(EditorSession {
                picker: Some(_),
                target,
                draft,
                date,
                original_repeat,
            }) => ModalState::TaskEditor(EditorSession {
                target,
                draft,
                date,
                picker: None,
                original_repeat,
            }),
            ModalState::ResetConfirm => ModalState::settings(),
            ModalState::AiPrompt { loading: true, text } => ModalState::AiPrompt {
                text,
                loading: true,
            },
            _ => ModalState::Closed,
        }
    }
}

fn finish(session: EditorSession, scope: Scope) -> (ModalState, Option<EditorCommit>) {
    let EditorSession {
        target, draft, date, ..
    } = session;
    match target {
        EditorTarget::New => (ModalState::Closed, Some(EditorCommit::Create { draft, date })),
        EditorTarget::Task { task_id, .. } => (
            ModalState::Closed,
            Some(EditorCommit::Edit {
                task_id,
                draft,
                date,
                scope,
            }),
        ),
        EditorTarget::Slot { slot } => {
            let edit = SlotEdit {
                title: draft.title.trim().to_string(),
                has_time: draft.has_time,
                time: date.and_time(draft.time),
                notification: draft.notification,
            };
            (ModalState::Closed, Some(EditorCommit::Slot { date, slot, edit }))
        }
        EditorTarget::AiSuggestion {
            index,
            mut suggestions,
        } => {
            if let Some(entry) = suggestions.tasks.get_mut(index) {
                *entry = draft_to_suggestion(&draft);
            }
            (ModalState::AiResult(suggestions), None)
        }
    }
}
