use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::error::{StoreError, StoreResult};
use crate::fs::timestamp;
use crate::models::Priority;
use crate::store::ReminderTime;

/// 解析提醒时间输入
///
/// - `HH:MM` → 下一次出现的该时刻
/// - `YYYY-MM-DD HH:MM` / ISO-8601 → 指定时间
/// - `+30m` / `+2h` / `+1d` → 相对现在
pub fn parse_reminder_input(input: &str, now: NaiveDateTime) -> StoreResult<ReminderTime> {
    let input = input.trim();
    let malformed = || {
        StoreError::InvalidInput(format!(
            "malformed time '{}' (use HH:MM, YYYY-MM-DD HH:MM or +30m)",
            input
        ))
    };

    if let Some(relative) = input.strip_prefix('+') {
        let split = relative
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(relative.len());
        let (amount, unit) = relative.split_at(split);
        let amount: i64 = amount.parse().map_err(|_| malformed())?;
        // 超出范围的偏移按格式错误处理
        let offset = match unit.trim() {
            "" | "m" | "min" => Duration::try_minutes(amount),
            "h" => Duration::try_hours(amount),
            "d" => Duration::try_days(amount),
            _ => return Err(malformed()),
        };
        return offset
            .and_then(|offset| now.checked_add_signed(offset))
            .map(ReminderTime::At)
            .ok_or_else(malformed);
    }

    if let Ok(time) = NaiveTime::parse_from_str(input, "%H:%M") {
        return Ok(ReminderTime::TimeOfDay(time));
    }

    timestamp::parse(input)
        .map(ReminderTime::At)
        .ok_or_else(malformed)
}

/// 快速添加语法：`标题 #分类 !优先级`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAdd {
    pub title: String,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

pub fn parse_quick_add(input: &str) -> QuickAdd {
    let mut words = Vec::new();
    let mut category = None;
    let mut priority = None;

    for word in input.split_whitespace() {
        if let Some(name) = word.strip_prefix('#').filter(|n| !n.is_empty()) {
            category = Some(name.to_string());
        } else if let Some(p) = word.strip_prefix('!').and_then(|p| p.parse::<Priority>().ok()) {
            priority = Some(p);
        } else {
            words.push(word);
        }
    }

    QuickAdd {
        title: words.join(" "),
        category,
        priority,
    }
}
