//! 提醒调度器
//!
//! 后台线程按固定间隔轮询存储，认领到期提醒并逐个发通知。
//! 认领（清除提醒 + 落盘）在存储锁内完成，通知在锁外发送，
//! 因此每个提醒最多触发一次，通知失败也不会影响提醒状态。

use log::{error, info, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::notify::Notifier;
use crate::store::{DueReminder, TaskStore};

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// 默认通知显示时长
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

pub struct ReminderScheduler {
    store: Arc<TaskStore>,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
    notification_duration: Duration,
}

impl ReminderScheduler {
    pub fn new(store: Arc<TaskStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            poll_interval: DEFAULT_POLL_INTERVAL,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(10));
        self
    }

    pub fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }

    /// 执行一轮检查，返回本轮触发的提醒数
    pub fn run_cycle(&self) -> usize {
        let now = self.store.now();
        let claim = self.store.take_due_reminders(now);

        if let Err(e) = &claim.persisted {
            // 内存中已清除，下次成功保存时会同步到磁盘
            error!("event=reminder_claim status=persist_error error={}", e);
        }

        for reminder in &claim.reminders {
            let (title, body) = reminder_message(reminder);
            self.notifier.notify(&title, &body, self.notification_duration);
            info!(
                "event=reminder_fired id={} due={}",
                reminder.id,
                crate::fs::timestamp::format(&reminder.reminder_at)
            );
        }

        claim.reminders.len()
    }

    /// 启动后台线程
    pub fn spawn(self) -> std::io::Result<SchedulerHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let running = Arc::new(AtomicBool::new(true));
        let running_flag = Arc::clone(&running);
        let interval = self.poll_interval;

        let join = thread::Builder::new()
            .name("reminder-scheduler".to_string())
            .spawn(move || {
                info!(
                    "event=scheduler_start interval_ms={}",
                    interval.as_millis()
                );
                loop {
                    self.run_cycle();
                    // 可被关闭信号打断的等待
                    match shutdown_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                running_flag.store(false, Ordering::SeqCst);
                info!("event=scheduler_stop");
            })?;

        Ok(SchedulerHandle {
            shutdown_tx: Some(shutdown_tx),
            join: Some(join),
            running,
        })
    }
}

/// 通知标题与正文
pub fn reminder_message(reminder: &DueReminder) -> (String, String) {
    let title = "⏰ Task reminder".to_string();
    let body = format!(
        "\"{}\" is due now ({}, {} priority)",
        reminder.title, reminder.category, reminder.priority
    );
    (title, body)
}

/// 调度线程的句柄；丢弃时自动关闭
pub struct SchedulerHandle {
    shutdown_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// 发送关闭信号并等待线程退出（最多等当前这一轮结束）
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("event=scheduler_stop status=panicked");
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
