use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub type Timestamp = i64;

/// Milliseconds since the Unix epoch. Fractional once a drag reorder has
/// placed an item between two neighbours.
pub type SortKey = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    Ko,
    En,
}

impl Locale {
    pub fn detect() -> Self {
        sys_locale::get_locale()
            .map(|tag| Self::from_tag(&tag))
            .unwrap_or(Locale::En)
    }

    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().to_lowercase().starts_with("ko") {
            Locale::Ko
        } else {
            Locale::En
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Flow,
    Inbox,
}

// Aliases accept the labels earlier mobile builds persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    #[serde(alias = "안 함", alias = "한번")]
    None,
    #[serde(alias = "매일")]
    Daily,
    #[serde(alias = "평일(월~금)")]
    Weekdays,
    #[serde(alias = "주말(토~일)")]
    Weekends,
    #[serde(alias = "매주")]
    Weekly,
    #[serde(alias = "매달")]
    Monthly,
}

impl Repeat {
    pub const ALL: [Repeat; 6] = [
        Repeat::None,
        Repeat::Daily,
        Repeat::Weekdays,
        Repeat::Weekends,
        Repeat::Weekly,
        Repeat::Monthly,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Repeat::None => "none",
            Repeat::Daily => "daily",
            Repeat::Weekdays => "weekdays",
            Repeat::Weekends => "weekends",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Repeat::None, Locale::Ko) => "안 함",
            (Repeat::Daily, Locale::Ko) => "매일",
            (Repeat::Weekdays, Locale::Ko) => "평일(월~금)",
            (Repeat::Weekends, Locale::Ko) => "주말(토~일)",
            (Repeat::Weekly, Locale::Ko) => "매주",
            (Repeat::Monthly, Locale::Ko) => "매달",
            (Repeat::None, Locale::En) => "Never",
            (Repeat::Daily, Locale::En) => "Every day",
            (Repeat::Weekdays, Locale::En) => "Weekdays (Mon-Fri)",
            (Repeat::Weekends, Locale::En) => "Weekends (Sat-Sun)",
            (Repeat::Weekly, Locale::En) => "Every week",
            (Repeat::Monthly, Locale::En) => "Every month",
        }
    }

    /// Accepts the wire id or either display label, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim().to_lowercase();
        if needle == "한번" {
            return Some(Repeat::None);
        }
        Self::ALL.into_iter().find(|rule| {
            needle == rule.id()
                || needle == rule.label(Locale::Ko).to_lowercase()
                || needle == rule.label(Locale::En).to_lowercase()
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DurationOption {
    #[serde(rename = "10m", alias = "10분")]
    Min10,
    #[serde(rename = "15m", alias = "15분")]
    Min15,
    #[serde(rename = "30m", alias = "30분")]
    Min30,
    #[default]
    #[serde(rename = "1h", alias = "1시간")]
    Hour1,
    #[serde(rename = "1.5h", alias = "1.5시간")]
    Hour1Half,
    #[serde(rename = "2h", alias = "2시간")]
    Hour2,
    #[serde(rename = "2.5h", alias = "2.5시간")]
    Hour2Half,
    #[serde(rename = "3h", alias = "3시간")]
    Hour3,
    #[serde(rename = "3.5h", alias = "3.5시간")]
    Hour3Half,
    #[serde(rename = "4h", alias = "4시간")]
    Hour4,
}

impl DurationOption {
    pub const ALL: [DurationOption; 10] = [
        DurationOption::Min10,
        DurationOption::Min15,
        DurationOption::Min30,
        DurationOption::Hour1,
        DurationOption::Hour1Half,
        DurationOption::Hour2,
        DurationOption::Hour2Half,
        DurationOption::Hour3,
        DurationOption::Hour3Half,
        DurationOption::Hour4,
    ];

    pub fn minutes(self) -> i64 {
        match self {
            DurationOption::Min10 => 10,
            DurationOption::Min15 => 15,
            DurationOption::Min30 => 30,
            DurationOption::Hour1 => 60,
            DurationOption::Hour1Half => 90,
            DurationOption::Hour2 => 120,
            DurationOption::Hour2Half => 150,
            DurationOption::Hour3 => 180,
            DurationOption::Hour3Half => 210,
            DurationOption::Hour4 => 240,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            DurationOption::Min10 => "10m",
            DurationOption::Min15 => "15m",
            DurationOption::Min30 => "30m",
            DurationOption::Hour1 => "1h",
            DurationOption::Hour1Half => "1.5h",
            DurationOption::Hour2 => "2h",
            DurationOption::Hour2Half => "2.5h",
            DurationOption::Hour3 => "3h",
            DurationOption::Hour3Half => "3.5h",
            DurationOption::Hour4 => "4h",
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (DurationOption::Min10, Locale::Ko) => "10분",
            (DurationOption::Min15, Locale::Ko) => "15분",
            (DurationOption::Min30, Locale::Ko) => "30분",
            (DurationOption::Hour1, Locale::Ko) => "1시간",
            (DurationOption::Hour1Half, Locale::Ko) => "1.5시간",
            (DurationOption::Hour2, Locale::Ko) => "2시간",
            (DurationOption::Hour2Half, Locale::Ko) => "2.5시간",
            (DurationOption::Hour3, Locale::Ko) => "3시간",
            (DurationOption::Hour3Half, Locale::Ko) => "3.5시간",
            (DurationOption::Hour4, Locale::Ko) => "4시간",
            (DurationOption::Min10, Locale::En) => "10 min",
            (DurationOption::Min15, Locale::En) => "15 min",
            (DurationOption::Min30, Locale::En) => "30 min",
            (DurationOption::Hour1, Locale::En) => "1 hr",
            (DurationOption::Hour1Half, Locale::En) => "1.5 hr",
            (DurationOption::Hour2, Locale::En) => "2 hr",
            (DurationOption::Hour2Half, Locale::En) => "2.5 hr",
            (DurationOption::Hour3, Locale::En) => "3 hr",
            (DurationOption::Hour3Half, Locale::En) => "3.5 hr",
            (DurationOption::Hour4, Locale::En) => "4 hr",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|option| {
            needle == option.id()
                || needle == option.label(Locale::Ko)
                || needle == option.label(Locale::En).to_lowercase()
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLead {
    #[default]
    #[serde(alias = "안 함")]
    None,
    #[serde(rename = "5m", alias = "5분 전")]
    Min5,
    #[serde(rename = "10m", alias = "10분 전")]
    Min10,
    #[serde(rename = "30m", alias = "30분 전")]
    Min30,
    #[serde(rename = "1h", alias = "1시간 전")]
    Hour1,
    #[serde(alias = "정시")]
    AtStart,
}

impl NotificationLead {
    pub const ALL: [NotificationLead; 6] = [
        NotificationLead::None,
        NotificationLead::Min5,
        NotificationLead::Min10,
        NotificationLead::Min30,
        NotificationLead::Hour1,
        NotificationLead::AtStart,
    ];

    pub fn offset_minutes(self) -> Option<i64> {
        match self {
            NotificationLead::None => None,
            NotificationLead::Min5 => Some(5),
            NotificationLead::Min10 => Some(10),
            NotificationLead::Min30 => Some(30),
            NotificationLead::Hour1 => Some(60),
            NotificationLead::AtStart => Some(0),
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            NotificationLead::None => "none",
            NotificationLead::Min5 => "5m",
            NotificationLead::Min10 => "10m",
            NotificationLead::Min30 => "30m",
            NotificationLead::Hour1 => "1h",
            NotificationLead::AtStart => "at_start",
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (NotificationLead::None, Locale::Ko) => "안 함",
            (NotificationLead::Min5, Locale::Ko) => "5분 전",
            (NotificationLead::Min10, Locale::Ko) => "10분 전",
            (NotificationLead::Min30, Locale::Ko) => "30분 전",
            (NotificationLead::Hour1, Locale::Ko) => "1시간 전",
            (NotificationLead::AtStart, Locale::Ko) => "정시",
            (NotificationLead::None, Locale::En) => "None",
            (NotificationLead::Min5, Locale::En) => "5 minutes",
            (NotificationLead::Min10, Locale::En) => "10 minutes",
            (NotificationLead::Min30, Locale::En) => "30 minutes",
            (NotificationLead::Hour1, Locale::En) => "1 hour",
            (NotificationLead::AtStart, Locale::En) => "At start time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|lead| {
            needle == lead.id()
                || needle == lead.label(Locale::Ko)
                || needle == lead.label(Locale::En).to_lowercase()
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Single,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub has_time: bool,
    pub time: NaiveDateTime,
    pub has_duration: bool,
    #[serde(default)]
    pub duration: DurationOption,
    pub tab: Tab,
    pub created_at: SortKey,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub notification: NotificationLead,
}

impl Task {
    /// Group id, treating an empty string like a legacy task without one.
    pub fn group(&self) -> Option<&str> {
        self.group_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_recurring(&self) -> bool {
        self.group().is_some() && self.repeat != Repeat::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TaskDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tab: Tab,
    #[serde(default)]
    pub has_time: bool,
    pub time: NaiveTime,
    #[serde(default)]
    pub has_duration: bool,
    #[serde(default)]
    pub duration: DurationOption,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub notification: NotificationLead,
}

impl TaskDraft {
    pub fn new(tab: Tab, time: NaiveTime) -> Self {
        Self {
            title: String::new(),
            tab,
            has_time: false,
            time,
            has_duration: false,
            duration: DurationOption::default(),
            repeat: Repeat::None,
            notification: NotificationLead::None,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            tab: task.tab,
            has_time: task.has_time,
            time: task.time.time(),
            has_duration: task.has_duration,
            duration: task.duration,
            repeat: task.repeat,
            notification: task.notification,
        }
    }

    pub fn resolved_title(&self, locale: Locale) -> String {
        let title = self.title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
        match (self.tab, locale) {
            (Tab::Inbox, Locale::Ko) => "새로운 할일".to_string(),
            (Tab::Flow, Locale::Ko) => "새로운 일정".to_string(),
            (Tab::Inbox, Locale::En) => "New to-do".to_string(),
            (Tab::Flow, Locale::En) => "New event".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Wake,
    Sleep,
}

impl Slot {
    pub fn id(self) -> &'static str {
        match self {
            Slot::Wake => "wake",
            Slot::Sleep => "sleep",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "wake" => Some(Slot::Wake),
            "sleep" => Some(Slot::Sleep),
            _ => None,
        }
    }

    pub fn default_title(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Slot::Wake, Locale::Ko) => "기상",
            (Slot::Sleep, Locale::Ko) => "취침",
            (Slot::Wake, Locale::En) => "Wake up",
            (Slot::Sleep, Locale::En) => "Sleep",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub struct SlotRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub has_time: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveDateTime>,
    #[serde(default)]
    pub notification: NotificationLead,
    #[serde(default)]
    pub completed: bool,
}

impl SlotRecord {
    pub fn title_or_default(&self, slot: Slot, locale: Locale) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| slot.default_title(locale).to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SlotEdit {
    pub title: String,
    pub has_time: bool,
    pub time: NaiveDateTime,
    #[serde(default)]
    pub notification: NotificationLead,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ThemeSelection {
    #[serde(default = "default_theme_id")]
    pub background_id: String,
    #[serde(default = "default_theme_id")]
    pub accent_id: String,
}

impl Default for ThemeSelection {
    fn default() -> Self {
        Self {
            background_id: default_theme_id(),
            accent_id: default_theme_id(),
        }
    }
}

fn default_theme_id() -> String {
    "default".to_string()
}

fn default_notifications_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct NotificationSettingFile {
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,
}

impl Default for NotificationSettingFile {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    pub notifications_enabled: bool,
    pub theme: ThemeSelection,
}

impl Settings {
    pub fn new(notifications_enabled: bool, theme: ThemeSelection) -> Self {
        Self {
            notifications_enabled,
            theme,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TasksFile {
    pub schema_version: u32,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SlotsFile {
    pub schema_version: u32,
    #[serde(default)]
    pub slots: std::collections::BTreeMap<String, SlotRecord>,
}
