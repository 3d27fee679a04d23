//! 任务数据文件的读写
//!
//! 读取永远不会失败：文件不存在或无法解析时返回默认状态。
//! 写入是原子的（临时文件 → fsync → rename），
//! 读者只会看到旧文件或完整的新文件。

use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::fs::timestamp;
use crate::models::{Priority, Task, TaskStatus, DEFAULT_CATEGORIES, FALLBACK_CATEGORY};

/// 存储文件的完整内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFile {
    pub tasks: Vec<Task>,
    pub categories: Vec<String>,
    /// 下一个可分配的 id（删除后不复用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<u32>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            next_id: None,
        }
    }
}

/// 最早版本的格式：顶层是任务数组，没有 id / 分类 / 优先级
#[derive(Debug, Deserialize)]
struct LegacyTask {
    title: String,
    #[serde(default)]
    completed: bool,
    #[serde(with = "timestamp")]
    created_at: NaiveDateTime,
    #[serde(default, with = "timestamp::option")]
    completed_at: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp::option")]
    reminder: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Current(StoreFile),
    Legacy(Vec<LegacyTask>),
}

impl StoreFile {
    fn from_legacy(legacy: Vec<LegacyTask>) -> Self {
        let tasks = legacy
            .into_iter()
            .zip(1u32..)
            .map(|(old, id)| {
                let status = if old.completed {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Active
                };
                Task {
                    id,
                    title: old.title,
                    category: FALLBACK_CATEGORY.to_string(),
                    priority: Priority::Medium,
                    status,
                    created_at: old.created_at,
                    completed_at: if old.completed { old.completed_at } else { None },
                    reminder_at: old.reminder,
                }
            })
            .collect();

        Self {
            tasks,
            ..Self::default()
        }
    }

    /// 修复手工编辑或旧版本留下的不一致
    fn normalize(&mut self) {
        for task in &mut self.tasks {
            if task.is_completed() {
                task.reminder_at = None;
            } else {
                task.completed_at = None;
            }
            if !self.categories.contains(&task.category) {
                self.categories.push(task.category.clone());
            }
        }
        if self.categories.is_empty() {
            self.categories.push(FALLBACK_CATEGORY.to_string());
        }
    }
}

/// 解析文件内容（当前格式或旧版本格式）
pub fn decode(content: &str) -> Result<StoreFile, serde_json::Error> {
    let mut file = match serde_json::from_str::<OnDisk>(content)? {
        OnDisk::Current(file) => file,
        OnDisk::Legacy(tasks) => StoreFile::from_legacy(tasks),
    };
    file.normalize();
    Ok(file)
}

pub fn encode(file: &StoreFile) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(file)
}

/// 从磁盘加载，任何失败都回退到默认状态
pub fn load(path: &Path) -> StoreFile {
    if !path.exists() {
        info!("event=store_load status=missing path={}", path.display());
        return StoreFile::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(
                "event=store_load status=unreadable path={} error={}",
                path.display(),
                e
            );
            return StoreFile::default();
        }
    };

    match decode(&content) {
        Ok(file) => {
            info!(
                "event=store_load status=ok path={} tasks={} categories={}",
                path.display(),
                file.tasks.len(),
                file.categories.len()
            );
            file
        }
        Err(e) => {
            // 先把损坏的文件挪开，避免下一次保存覆盖原始数据
            let backup = sibling_path(path, ".corrupt");
            match fs::rename(path, &backup) {
                Ok(()) => warn!(
                    "event=store_load status=corrupt path={} backup={} error={}",
                    path.display(),
                    backup.display(),
                    e
                ),
                Err(rename_err) => warn!(
                    "event=store_load status=corrupt path={} error={} backup_error={}",
                    path.display(),
                    e,
                    rename_err
                ),
            }
            StoreFile::default()
        }
    }
}

/// 原子写入
pub fn save(path: &Path, file: &StoreFile) -> StoreResult<()> {
    let json = encode(file)
        .map_err(|e| StoreError::Persistence(format!("failed to serialize tasks: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Persistence(format!(
                    "failed to create data directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let tmp_path = sibling_path(path, ".tmp");
    let write_tmp = || -> std::io::Result<()> {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.sync_all()
    };

    if let Err(e) = write_tmp() {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Persistence(format!(
            "failed to write '{}': {}",
            tmp_path.display(),
            e
        )));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::Persistence(format!(
            "failed to rename '{}' to '{}': {}",
            tmp_path.display(),
            path.display(),
            e
        ))
    })
}

/// 同目录下追加后缀的文件名，如 `tasks.json.tmp`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "tasks.json".into());
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample() -> StoreFile {
        let mut done = Task::new(2, "報告書を書く".into(), "Work".into(), Priority::High, at(1, 9, 0));
        done.status = TaskStatus::Completed;
        done.completed_at = Some(at(1, 17, 45));

        let mut reminded = Task::new(3, "Buy milk".into(), "Errands".into(), Priority::Low, at(2, 8, 0));
        reminded.reminder_at = Some(at(2, 18, 30));

        StoreFile {
            tasks: vec![
                Task::new(1, "Plain".into(), "Uncategorized".into(), Priority::Medium, at(1, 8, 0)),
                done,
                reminded,
            ],
            categories: vec!["Uncategorized".into(), "Work".into(), "Errands".into()],
            next_id: Some(5),
        }
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let file = sample();

        save(&path, &file).unwrap();
        assert_eq!(load(&path), file);
    }

    #[test]
    fn test_absent_optionals_are_omitted_and_unicode_kept() {
        let json = encode(&sample()).unwrap();

        assert!(json.contains("報告書を書く"));
        assert!(json.contains("\"priority\": \"高\""));
        assert!(!json.contains("null"));
        // 只有任务 2 有 completed_at，只有任务 3 有 reminder_at
        assert_eq!(json.matches("completed_at").count(), 1);
        assert_eq!(json.matches("reminder_at").count(), 1);
    }

    #[test]
    fn test_load_missing_or_corrupt_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        assert_eq!(load(&path), StoreFile::default());

        fs::write(&path, "{ this is not json").unwrap();
        assert_eq!(load(&path), StoreFile::default());
    }

    #[test]
    fn test_corrupt_file_is_kept_as_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ \"tasks\": [ truncated").unwrap();

        assert_eq!(load(&path), StoreFile::default());
        assert!(!path.exists());
        let backup = dir.path().join("tasks.json.corrupt");
        assert_eq!(
            fs::read_to_string(&backup).unwrap(),
            "{ \"tasks\": [ truncated"
        );

        // 之后的保存不会碰备份
        save(&path, &sample()).unwrap();
        assert_eq!(load(&path), sample());
        assert!(backup.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.json");

        save(&path, &sample()).unwrap();
        save(&path, &StoreFile::default()).unwrap();

        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("tasks.json")]);
        assert_eq!(load(&path), StoreFile::default());
    }

    #[test]
    fn test_decode_accepts_short_timestamps() {
        let json = r#"{
  "tasks": [
    {"id": 4, "title": "Call mom", "category": "Personal", "priority": "低",
     "status": "active", "created_at": "2025-03-01 08:00", "reminder_at": "2025-03-01 19:00"}
  ],
  "categories": ["Personal"]
}"#;
        let file = decode(json).unwrap();
        assert_eq!(file.tasks[0].reminder_at, Some(at(1, 19, 0)));
        assert_eq!(file.next_id, None);
    }

    #[test]
    fn test_decode_upgrades_legacy_array() {
        let json = r#"[
  {"title": "古いタスク", "completed": false, "created_at": "2025-03-01T08:00:00.500000",
   "reminder": "2025-03-01T19:00:00"},
  {"title": "Done one", "completed": true, "created_at": "2025-03-01T08:00:00",
   "completed_at": "2025-03-01T09:00:00"}
]"#;
        let file = decode(json).unwrap();

        assert_eq!(file.tasks.len(), 2);
        assert_eq!(file.tasks[0].id, 1);
        assert_eq!(file.tasks[0].title, "古いタスク");
        assert_eq!(file.tasks[0].category, FALLBACK_CATEGORY);
        assert_eq!(file.tasks[0].reminder_at, Some(at(1, 19, 0)));
        assert_eq!(file.tasks[1].id, 2);
        assert_eq!(file.tasks[1].status, TaskStatus::Completed);
        assert_eq!(file.tasks[1].completed_at, Some(at(1, 9, 0)));
        assert!(file.categories.contains(&FALLBACK_CATEGORY.to_string()));
    }

    #[test]
    fn test_decode_normalizes_inconsistent_state() {
        let json = r#"{
  "tasks": [
    {"id": 1, "title": "x", "category": "Ghost", "priority": "中",
     "status": "completed", "created_at": "2025-03-01T08:00:00",
     "completed_at": "2025-03-01T09:00:00", "reminder_at": "2025-03-01T19:00:00"}
  ],
  "categories": []
}"#;
        let file = decode(json).unwrap();
        assert_eq!(file.tasks[0].reminder_at, None);
        assert_eq!(file.categories, vec!["Ghost".to_string()]);
    }
}
