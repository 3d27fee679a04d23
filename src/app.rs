use log::warn;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tui_textarea::TextArea;

use crate::config::Config;
use crate::error::StoreError;
use crate::input::parse::{parse_quick_add, parse_reminder_input};
use crate::models::{Priority, Task, TaskStatus, FALLBACK_CATEGORY};
use crate::notify::Notifier;
use crate::store::{StoreEvent, TaskFilter, TaskStats, TaskStore};

/// 激励语每 15 分钟轮换一次
const MOTIVATION_ROTATE: Duration = Duration::from_secs(15 * 60);

pub const MOTIVATION_MESSAGES: [&str; 5] = [
    "Small steps add up to big results.",
    "One task at a time is still progress.",
    "Done is better than perfect.",
    "Future you will thank you for this one.",
    "Keep going, the list is getting shorter.",
];

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// 通知消息
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl Notification {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// 输入框用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    AddTask,
    Reminder(u32),
    AddCategory,
}

/// 对话框
pub enum Dialog {
    Input {
        kind: InputKind,
        title: String,
        prompt: String,
        textarea: TextArea<'static>,
    },
    ConfirmDelete {
        id: u32,
        title: String,
    },
    ConfirmRemoveCategory {
        name: String,
    },
}

/// 应用模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Dialog,
    Help,
}

/// 界面状态；只在 UI 线程上修改
pub struct App {
    pub store: Arc<TaskStore>,
    events: Receiver<StoreEvent>,
    notifier: Arc<dyn Notifier>,
    pub config: Config,
    /// 当前过滤条件下的任务（按插入顺序）
    pub tasks: Vec<Task>,
    pub categories: Vec<String>,
    pub stats: TaskStats,
    pub selected: usize,
    pub status_filter: Option<TaskStatus>,
    pub category_filter: Option<String>,
    pub mode: Mode,
    pub dialog: Option<Dialog>,
    pub notification: Option<Notification>,
    pub motivation_index: usize,
    motivation_since: Instant,
}

impl App {
    pub fn new(store: Arc<TaskStore>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        let events = store.subscribe();
        let mut app = Self {
            store,
            events,
            notifier,
            config,
            tasks: Vec::new(),
            categories: Vec::new(),
            stats: TaskStats::default(),
            selected: 0,
            status_filter: None,
            category_filter: None,
            mode: Mode::Normal,
            dialog: None,
            notification: None,
            motivation_index: 0,
            motivation_since: Instant::now(),
        };
        app.refresh();
        app
    }

    /// 重新查询存储
    pub fn refresh(&mut self) {
        self.categories = self.store.categories();
        if let Some(category) = &self.category_filter {
            if !self.categories.contains(category) {
                self.category_filter = None;
            }
        }

        let filter = TaskFilter {
            status: self.status_filter,
            category: self.category_filter.clone(),
            priority: None,
        };
        self.tasks = self.store.filter(&filter);
        self.stats = self.store.stats();

        if self.selected >= self.tasks.len() {
            self.selected = self.tasks.len().saturating_sub(1);
        }
    }

    /// 处理调度器与其他来源的变更事件；返回是否需要重绘
    pub fn drain_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            if let StoreEvent::ReminderFired(id) = event {
                let title = self
                    .store
                    .get(id)
                    .map(|t| t.title)
                    .unwrap_or_else(|| format!("#{}", id));
                self.notify_with_ttl(
                    format!("⏰ 「{}」 is due now", title),
                    NotificationLevel::Warning,
                    self.config.notification_duration().max(Duration::from_secs(3)),
                );
            }
            changed = true;
        }
        if changed {
            self.refresh();
        }
        changed
    }

    /// 定时任务：过期通知、激励语轮换
    pub fn tick(&mut self) {
        if self.notification.as_ref().is_some_and(|n| n.is_expired()) {
            self.notification = None;
        }
        if self.motivation_since.elapsed() >= MOTIVATION_ROTATE {
            self.motivation_index = (self.motivation_index + 1) % MOTIVATION_MESSAGES.len();
            self.motivation_since = Instant::now();
        }
    }

    pub fn motivation(&self) -> &'static str {
        MOTIVATION_MESSAGES[self.motivation_index % MOTIVATION_MESSAGES.len()]
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.get(self.selected)
    }

    pub fn show_notification(&mut self, message: impl Into<String>, level: NotificationLevel) {
        self.notify_with_ttl(message, level, Duration::from_secs(3));
    }

    fn notify_with_ttl(&mut self, message: impl Into<String>, level: NotificationLevel, ttl: Duration) {
        self.notification = Some(Notification {
            message: message.into(),
            level,
            created_at: Instant::now(),
            ttl,
        });
    }

    fn report_error(&mut self, err: StoreError) {
        if matches!(err, StoreError::Persistence(_)) {
            warn!("event=ui_persist_error error={}", err);
        }
        self.show_notification(err.to_string(), NotificationLevel::Error);
    }

    pub fn select_next(&mut self) {
        if !self.tasks.is_empty() {
            self.selected = (self.selected + 1) % self.tasks.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.tasks.is_empty() {
            self.selected = self.selected.checked_sub(1).unwrap_or(self.tasks.len() - 1);
        }
    }

    /// 状态过滤：全部 → 未完成 → 已完成
    pub fn cycle_status_filter(&mut self) {
        self.status_filter = match self.status_filter {
            None => Some(TaskStatus::Active),
            Some(TaskStatus::Active) => Some(TaskStatus::Completed),
            Some(TaskStatus::Completed) => None,
        };
        self.selected = 0;
        self.refresh();
    }

    /// 分类过滤：全部 → 各分类依次
    pub fn cycle_category_filter(&mut self) {
        let next = match &self.category_filter {
            None => self.categories.first().cloned(),
            Some(current) => self
                .categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| self.categories.get(i + 1))
                .cloned(),
        };
        self.category_filter = next;
        self.selected = 0;
        self.refresh();
    }

    pub fn open_input(&mut self, kind: InputKind) {
        let (title, prompt) = match kind {
            InputKind::AddTask => (
                "New task".to_string(),
                "Title, optional #category and !high|!medium|!low".to_string(),
            ),
            InputKind::Reminder(id) => (
                format!("Reminder for #{}", id),
                "HH:MM, YYYY-MM-DD HH:MM, or +30m / +2h".to_string(),
            ),
            InputKind::AddCategory => ("New category".to_string(), "Category name".to_string()),
        };
        self.dialog = Some(Dialog::Input {
            kind,
            title,
            prompt,
            textarea: TextArea::default(),
        });
        self.mode = Mode::Dialog;
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
        self.mode = Mode::Normal;
    }

    pub fn submit_input(&mut self, kind: InputKind, text: &str) {
        match kind {
            InputKind::AddTask => self.add_task(text),
            InputKind::Reminder(id) => self.set_reminder(id, text),
            InputKind::AddCategory => match self.store.add_category(text) {
                Ok(()) => self.show_notification(
                    format!("Category '{}' added", text.trim()),
                    NotificationLevel::Success,
                ),
                Err(e) => self.report_error(e),
            },
        }
        self.refresh();
    }

    /// 快速添加；未指定分类时使用当前分类过滤或兜底分类
    pub fn add_task(&mut self, text: &str) {
        let quick = parse_quick_add(text);
        let category = quick
            .category
            .or_else(|| self.category_filter.clone())
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());
        let priority = quick.priority.unwrap_or(Priority::Medium);

        match self.store.add(&quick.title, &category, priority) {
            Ok(task) => {
                self.notifier.notify(
                    "New task added",
                    &format!("「{}」 was added. You've got this!", task.title),
                    Duration::from_secs(5),
                );
                self.show_notification(
                    format!("Added #{} 「{}」", task.id, task.title),
                    NotificationLevel::Success,
                );
            }
            Err(e) => self.report_error(e),
        }
    }

    pub fn set_reminder(&mut self, id: u32, text: &str) {
        let result = parse_reminder_input(text, self.store.now())
            .and_then(|at| self.store.set_reminder(id, at));
        match result {
            Ok(task) => {
                let when = task
                    .reminder_at
                    .map(|at| at.format("%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                self.show_notification(
                    format!("Reminder for 「{}」 set to {}", task.title, when),
                    NotificationLevel::Info,
                );
            }
            Err(e) => self.report_error(e),
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        match self.store.toggle_complete(id) {
            Ok(task) if task.is_completed() => {
                self.notifier.notify(
                    "Task completed!",
                    &format!("「{}」 is done. Nice work!", task.title),
                    Duration::from_secs(5),
                );
                self.show_notification(
                    format!("Completed 「{}」", task.title),
                    NotificationLevel::Success,
                );
            }
            Ok(task) => self.show_notification(
                format!("Reopened 「{}」", task.title),
                NotificationLevel::Info,
            ),
            Err(e) => self.report_error(e),
        }
        self.refresh();
    }

    pub fn request_delete(&mut self) {
        if let Some((id, title)) = self.selected_task().map(|t| (t.id, t.title.clone())) {
            self.dialog = Some(Dialog::ConfirmDelete { id, title });
            self.mode = Mode::Dialog;
        }
    }

    pub fn delete_task(&mut self, id: u32, title: &str) {
        match self.store.delete(id) {
            Ok(()) => self.show_notification(
                format!("Deleted 「{}」", title),
                NotificationLevel::Info,
            ),
            Err(e) => self.report_error(e),
        }
        self.refresh();
    }

    pub fn request_reminder(&mut self) {
        match self.selected_task().map(|t| (t.id, t.is_completed())) {
            Some((_, true)) => self.show_notification(
                "Completed tasks cannot have reminders",
                NotificationLevel::Warning,
            ),
            Some((id, false)) => self.open_input(InputKind::Reminder(id)),
            None => {}
        }
    }

    pub fn clear_selected_reminder(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        match self.store.clear_reminder(id) {
            Ok(task) => self.show_notification(
                format!("Reminder cleared for 「{}」", task.title),
                NotificationLevel::Info,
            ),
            Err(e) => self.report_error(e),
        }
        self.refresh();
    }

    /// 删除当前过滤的分类（任务会移到兜底分类）
    pub fn request_remove_category(&mut self) {
        match self.category_filter.clone() {
            Some(name) => {
                self.dialog = Some(Dialog::ConfirmRemoveCategory { name });
                self.mode = Mode::Dialog;
            }
            None => self.show_notification(
                "Select a category filter (c) first",
                NotificationLevel::Warning,
            ),
        }
    }

    pub fn remove_category(&mut self, name: &str) {
        match self.store.remove_category(name) {
            Ok(()) => self.show_notification(
                format!("Category '{}' removed; its tasks moved to {}", name, FALLBACK_CATEGORY),
                NotificationLevel::Info,
            ),
            Err(e) => self.report_error(e),
        }
        self.category_filter = None;
        self.refresh();
    }
}
