use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::fs::timestamp;

/// 任务优先级（固定三档，序列化为 高/中/低）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "高")]
    High,
    #[serde(rename = "中")]
    Medium,
    #[serde(rename = "低")]
    Low,
}

impl Priority {
    /// 存储文件中使用的标签
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "高",
            Priority::Medium => "中",
            Priority::Low => "低",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.write_str(name)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" | "高" => Ok(Priority::High),
            "medium" | "med" | "m" | "中" => Ok(Priority::Medium),
            "low" | "l" | "低" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}' (expected high|medium|low)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Active => f.write_str("active"),
            TaskStatus::Completed => f.write_str("completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub category: String,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub reminder_at: Option<NaiveDateTime>,
}

impl Task {
    pub fn new(
        id: u32,
        title: String,
        category: String,
        priority: Priority,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            title,
            category,
            priority,
            status: TaskStatus::Active,
            created_at,
            completed_at: None,
            reminder_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// 提醒是否已到期（now >= reminder_at，仅对未完成任务有效）
    pub fn reminder_due(&self, now: NaiveDateTime) -> bool {
        !self.is_completed() && self.reminder_at.is_some_and(|at| now >= at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_priority_parse_accepts_both_spellings() {
        assert_eq!("High".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("中".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_reminder_due_uses_at_or_after() {
        let mut task = Task::new(1, "Buy milk".into(), "Errands".into(), Priority::Medium, at(9, 0));
        assert!(!task.reminder_due(at(10, 0)));

        task.reminder_at = Some(at(10, 0));
        assert!(!task.reminder_due(at(9, 59)));
        assert!(task.reminder_due(at(10, 0)));
        // 轮询漂移：过了时间也必须触发
        assert!(task.reminder_due(at(10, 7)));

        task.status = TaskStatus::Completed;
        assert!(!task.reminder_due(at(10, 7)));
    }
}
