use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::{NotificationSettingFile, SlotsFile, TasksFile, ThemeSelection};
use crate::slots::DaySlots;

pub const SCHEMA_VERSION: u32 = 1;

const TASKS_FILE: &str = "tasks.json";
const SLOTS_FILE: &str = "slots.json";
const NOTIFICATIONS_FILE: &str = "notifications.json";
const THEME_FILE: &str = "theme.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("legacy meta must be a json object")]
    LegacyShape,
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn load_tasks(&self) -> Result<TasksFile, StorageError> {
        Ok(self
            .load_optional(TASKS_FILE)?
            .unwrap_or_else(|| TasksFile {
                schema_version: SCHEMA_VERSION,
                tasks: Vec::new(),
            }))
    }

    pub fn load_slots(&self) -> Result<SlotsFile, StorageError> {
        Ok(self
            .load_optional(SLOTS_FILE)?
            .unwrap_or_else(|| DaySlots::default().to_file(SCHEMA_VERSION)))
    }

    pub fn load_notifications(&self) -> Result<NotificationSettingFile, StorageError> {
        Ok(self.load_optional(NOTIFICATIONS_FILE)?.unwrap_or_default())
    }

    pub fn load_theme(&self) -> Result<ThemeSelection, StorageError> {
        Ok(self.load_optional(THEME_FILE)?.unwrap_or_default())
    }

    pub fn save_tasks(&self, data: &TasksFile) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(TASKS_FILE), data)
    }

    pub fn save_slots(&self, data: &SlotsFile) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(SLOTS_FILE), data)
    }

    pub fn save_notifications(&self, data: &NotificationSettingFile) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(NOTIFICATIONS_FILE), data)
    }

    pub fn save_theme(&self, data: &ThemeSelection) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(THEME_FILE), data)
    }

    /// Removes the task and slot files. Settings are kept.
    pub fn clear_data(&self) -> Result<(), StorageError> {
        for name in [TASKS_FILE, SLOTS_FILE] {
            match fs::remove_file(self.root.join(name)) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    pub fn import_legacy_meta(&self, source: &Path) -> Result<DaySlots, StorageError> {
        let value: serde_json::Value = self.load_json(source.to_path_buf())?;
        let map = value.as_object().ok_or(StorageError::LegacyShape)?;
        Ok(DaySlots::from_legacy(map))
    }

    fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>, StorageError> {
        match self.load_json(self.root.join(filename)) {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn load_json<T: DeserializeOwned>(&self, path: PathBuf) -> Result<T, StorageError> {
        let mut file = File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    fn write_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DurationOption, NotificationLead, Repeat, Slot, Tab, Task};
    use chrono::NaiveDate;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().join("data"));
        storage.ensure_dirs().expect("ensure dirs");
        (dir, storage)
    }

    fn task(id: &str, created_at: f64) -> Task {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            has_time: false,
            time: date.and_hms_opt(9, 0, 0).unwrap(),
            has_duration: true,
            duration: DurationOption::Min30,
            tab: Tab::Flow,
            created_at,
            date,
            is_completed: false,
            repeat: Repeat::Daily,
            group_id: Some("g".to_string()),
            notification: NotificationLead::Min5,
        }
    }

    #[test]
    fn missing_files_load_as_defaults() {
        let (_dir, storage) = storage();
        assert!(storage.load_tasks().unwrap().tasks.is_empty());
        assert!(storage.load_slots().unwrap().slots.is_empty());
        assert!(storage.load_notifications().unwrap().enabled);
        assert_eq!(storage.load_theme().unwrap(), ThemeSelection::default());
    }

    #[test]
    fn save_and_reload_is_lossless() {
        let (_dir, storage) = storage();
        let tasks = TasksFile {
            schema_version: SCHEMA_VERSION,
            tasks: vec![task("a", 1_700_000_000_000.0), task("b", 1_700_000_000_000.25)],
        };
        let mut slots = DaySlots::default();
        slots.toggle_completed(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), Slot::Wake);

        storage.save_tasks(&tasks).unwrap();
        storage.save_slots(&slots.to_file(SCHEMA_VERSION)).unwrap();
        storage
            .save_notifications(&NotificationSettingFile { enabled: false })
            .unwrap();
        let theme = ThemeSelection {
            background_id: "dark_blue".to_string(),
            accent_id: "pink".to_string(),
        };
        storage.save_theme(&theme).unwrap();

        assert_eq!(storage.load_tasks().unwrap(), tasks);
        assert_eq!(DaySlots::from_file(storage.load_slots().unwrap()), slots);
        assert!(!storage.load_notifications().unwrap().enabled);
        assert_eq!(storage.load_theme().unwrap(), theme);
        assert!(!storage.root().join("tasks.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let (_dir, storage) = storage();
        fs::write(storage.root().join(TASKS_FILE), "{not json").unwrap();
        assert!(matches!(storage.load_tasks(), Err(StorageError::Json(_))));
    }

    #[test]
    fn clear_data_keeps_settings() {
        let (_dir, storage) = storage();
        storage
            .save_tasks(&TasksFile {
                schema_version: SCHEMA_VERSION,
                tasks: vec![task("a", 1.0)],
            })
            .unwrap();
        storage
            .save_notifications(&NotificationSettingFile { enabled: false })
            .unwrap();
        storage.clear_data().unwrap();
        storage.clear_data().unwrap();
        assert!(storage.load_tasks().unwrap().tasks.is_empty());
        assert!(!storage.load_notifications().unwrap().enabled);
    }

    #[test]
    fn import_legacy_meta_reads_flat_dictionary() {
        let (dir, storage) = storage();
        let path = dir.path().join("meta.json");
        fs::write(
            &path,
            r#"{"2025-06-02_sleep ": true, "2025-06-02_sleep _title": "lights out"}"#,
        )
        .unwrap();
        let slots = storage.import_legacy_meta(&path).unwrap();
        let record = slots.get(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), Slot::Sleep);
        assert!(record.completed);
        assert_eq!(record.title.as_deref(), Some("lights out"));

        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            storage.import_legacy_meta(&path),
            Err(StorageError::LegacyShape)
        ));
    }
}
