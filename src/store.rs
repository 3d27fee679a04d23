//! 任务存储：任务集合与分类注册表的唯一拥有者
//!
//! 所有读写都经过同一把互斥锁，粒度是单个操作；
//! 每次修改都会在返回前落盘，并向订阅者广播 [`StoreEvent`]。

use chrono::{Duration, NaiveDateTime, NaiveTime};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::fs::{self, StoreFile};
use crate::models::{CategoryRegistry, Priority, Task, TaskStatus, FALLBACK_CATEGORY};

/// 存储变更事件，界面层据此重新查询并重绘
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    TaskAdded(u32),
    TaskUpdated(u32),
    TaskDeleted(u32),
    CategoriesChanged,
    /// 调度器触发并清除了该任务的提醒
    ReminderFired(u32),
}

/// 过滤条件，`None` 表示不限制
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.category.as_deref().is_none_or(|c| task.category == c)
            && self.priority.is_none_or(|p| task.priority == p)
    }
}

/// 提醒时间：完整日期时间，或只有时刻（取下一次出现）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderTime {
    At(NaiveDateTime),
    TimeOfDay(NaiveTime),
}

impl ReminderTime {
    /// 只有时刻时取今天，若已经过去则顺延一天
    pub fn resolve(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            ReminderTime::At(at) => at,
            ReminderTime::TimeOfDay(time) => {
                let today = now.date().and_time(time);
                if today < now {
                    today + Duration::days(1)
                } else {
                    today
                }
            }
        }
    }
}

/// 被调度器认领的到期提醒
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub id: u32,
    pub title: String,
    pub category: String,
    pub priority: Priority,
    pub reminder_at: NaiveDateTime,
}

/// 一次认领的结果：提醒已在内存中清除，`persisted` 是落盘结果
#[derive(Debug)]
pub struct ReminderClaim {
    pub reminders: Vec<DueReminder>,
    pub persisted: StoreResult<()>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
}

impl TaskStats {
    /// 完成率 0.0 ~ 1.0
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

struct StoreState {
    tasks: Vec<Task>,
    categories: CategoryRegistry,
    /// `None` 表示 id 已用尽
    next_id: Option<u32>,
}

impl StoreState {
    fn from_file(file: StoreFile) -> Self {
        let max_id = file.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let next_id = max_id
            .checked_add(1)
            .map(|floor| file.next_id.unwrap_or(1).max(floor));
        if next_id.is_none() {
            warn!("event=store_load status=ids_exhausted max_id={}", max_id);
        }
        Self {
            categories: CategoryRegistry::from_names(file.categories),
            tasks: file.tasks,
            next_id,
        }
    }

    fn to_file(&self) -> StoreFile {
        StoreFile {
            tasks: self.tasks.clone(),
            categories: self.categories.names().to_vec(),
            next_id: self.next_id,
        }
    }

    fn task_mut(&mut self, id: u32) -> StoreResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::task_not_found(id))
    }
}

pub struct TaskStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState>,
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl TaskStore {
    /// 打开存储文件（不存在或损坏时以默认状态启动）
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();
        let state = StoreState::from_file(fs::load(&path));
        Self {
            path,
            clock,
            state: Mutex::new(state),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// 订阅变更事件；接收端被丢弃后自动退订
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        lock_or_recover(&self.subscribers).push(tx);
        rx
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        lock_or_recover(&self.state)
    }

    /// 落盘并广播事件；保存失败时内存状态保留，事件照常发出
    fn commit(&self, state: &StoreState, events: &[StoreEvent]) -> StoreResult<()> {
        let result = fs::save(&self.path, &state.to_file());
        match &result {
            Ok(()) => debug!("event=store_flush status=ok path={}", self.path.display()),
            Err(e) => error!(
                "event=store_flush status=error path={} error={}",
                self.path.display(),
                e
            ),
        }

        let mut subscribers = lock_or_recover(&self.subscribers);
        subscribers.retain(|tx| events.iter().all(|ev| tx.send(ev.clone()).is_ok()));

        result
    }

    pub fn add(&self, title: &str, category: &str, priority: Priority) -> StoreResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("task title cannot be empty".to_string()));
        }

        let mut state = self.lock();
        let mut events = Vec::new();
        if !state.categories.contains(category) {
            // 兜底分类总是可用
            if category != FALLBACK_CATEGORY {
                return Err(StoreError::NotFound(format!("category '{}'", category)));
            }
            state.categories.ensure_fallback();
            events.push(StoreEvent::CategoriesChanged);
        }

        let Some(id) = state.next_id else {
            return Err(StoreError::InvalidState("task ids are exhausted".to_string()));
        };
        state.next_id = id.checked_add(1);
        let task = Task::new(
            id,
            title.to_string(),
            category.to_string(),
            priority,
            self.clock.now(),
        );
        state.tasks.push(task.clone());
        info!("event=task_add id={} category={} priority={}", id, category, priority);

        events.push(StoreEvent::TaskAdded(id));
        self.commit(&state, &events)?;
        Ok(task)
    }

    pub fn delete(&self, id: u32) -> StoreResult<()> {
        let mut state = self.lock();
        let pos = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::task_not_found(id))?;
        state.tasks.remove(pos);
        info!("event=task_delete id={}", id);

        self.commit(&state, &[StoreEvent::TaskDeleted(id)])
    }

    pub fn toggle_complete(&self, id: u32) -> StoreResult<Task> {
        let now = self.clock.now();
        let mut state = self.lock();
        let task = state.task_mut(id)?;

        match task.status {
            TaskStatus::Active => {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(now);
                task.reminder_at = None;
            }
            TaskStatus::Completed => {
                task.status = TaskStatus::Active;
                task.completed_at = None;
            }
        }
        let task = task.clone();
        info!("event=task_toggle id={} status={}", id, task.status);

        self.commit(&state, &[StoreEvent::TaskUpdated(id)])?;
        Ok(task)
    }

    pub fn set_reminder(&self, id: u32, at: ReminderTime) -> StoreResult<Task> {
        let now = self.clock.now();
        let mut state = self.lock();
        let task = state.task_mut(id)?;

        if task.is_completed() {
            return Err(StoreError::InvalidState(format!(
                "task #{} is completed; reopen it before setting a reminder",
                id
            )));
        }

        let resolved = at.resolve(now);
        task.reminder_at = Some(resolved);
        let task = task.clone();
        info!(
            "event=reminder_set id={} at={}",
            id,
            fs::timestamp::format(&resolved)
        );

        self.commit(&state, &[StoreEvent::TaskUpdated(id)])?;
        Ok(task)
    }

    pub fn clear_reminder(&self, id: u32) -> StoreResult<Task> {
        let mut state = self.lock();
        let task = state.task_mut(id)?;
        task.reminder_at = None;
        let task = task.clone();
        info!("event=reminder_clear id={}", id);

        self.commit(&state, &[StoreEvent::TaskUpdated(id)])?;
        Ok(task)
    }

    /// 认领所有到期提醒：在同一个临界区内清除并落盘一次
    pub fn take_due_reminders(&self, now: NaiveDateTime) -> ReminderClaim {
        let mut state = self.lock();
        let mut reminders = Vec::new();

        for task in state.tasks.iter_mut().filter(|t| t.reminder_due(now)) {
            if let Some(reminder_at) = task.reminder_at.take() {
                reminders.push(DueReminder {
                    id: task.id,
                    title: task.title.clone(),
                    category: task.category.clone(),
                    priority: task.priority,
                    reminder_at,
                });
            }
        }

        if reminders.is_empty() {
            return ReminderClaim {
                reminders,
                persisted: Ok(()),
            };
        }

        let events: Vec<StoreEvent> = reminders
            .iter()
            .map(|r| StoreEvent::ReminderFired(r.id))
            .collect();
        let persisted = self.commit(&state, &events);

        ReminderClaim {
            reminders,
            persisted,
        }
    }

    pub fn get(&self, id: u32) -> Option<Task> {
        self.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// 按插入顺序返回满足全部条件的任务
    pub fn filter(&self, filter: &TaskFilter) -> Vec<Task> {
        self.lock()
            .tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> TaskStats {
        let state = self.lock();
        TaskStats {
            total: state.tasks.len(),
            completed: state.tasks.iter().filter(|t| t.is_completed()).count(),
        }
    }

    pub fn categories(&self) -> Vec<String> {
        self.lock().categories.names().to_vec()
    }

    pub fn add_category(&self, name: &str) -> StoreResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("category name cannot be empty".to_string()));
        }

        let mut state = self.lock();
        if !state.categories.insert(name) {
            return Err(StoreError::DuplicateCategory(name.to_string()));
        }
        info!("event=category_add name={}", name);

        self.commit(&state, &[StoreEvent::CategoriesChanged])
    }

    /// 删除分类：先把引用它的任务改到兜底分类，再移除；兜底分类本身不能删除
    pub fn remove_category(&self, name: &str) -> StoreResult<()> {
        let mut state = self.lock();
        if !state.categories.contains(name) {
            return Err(StoreError::NotFound(format!("category '{}'", name)));
        }
        if name == FALLBACK_CATEGORY {
            return Err(StoreError::InvalidState(format!(
                "category '{}' cannot be removed",
                FALLBACK_CATEGORY
            )));
        }

        let mut events = Vec::new();
        for task in state.tasks.iter_mut().filter(|t| t.category == name) {
            task.category = FALLBACK_CATEGORY.to_string();
            events.push(StoreEvent::TaskUpdated(task.id));
        }
        state.categories.remove(name);

        let fallback_in_use = state.tasks.iter().any(|t| t.category == FALLBACK_CATEGORY);
        if fallback_in_use {
            state.categories.ensure_fallback();
        } else {
            state.categories.ensure_fallback_if_empty();
        }
        events.push(StoreEvent::CategoriesChanged);
        info!(
            "event=category_remove name={} reassigned={}",
            name,
            events.len() - 1
        );

        self.commit(&state, &events)
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
