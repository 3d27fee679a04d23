//! 桌面通知
//!
//! 通知是尽力而为的：实现方自己捕获并记录失败，不向调用方返回错误。

use log::{info, warn};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str, duration: Duration);
}

/// 只写日志（没有可用的通知命令时使用）
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str, duration: Duration) {
        info!(
            "event=notify backend=log title={:?} body={:?} duration_secs={}",
            title,
            body,
            duration.as_secs()
        );
    }
}

/// 调用外部命令显示通知（notify-send / osascript / 自定义命令）
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: String,
}

impl CommandNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn build(&self, title: &str, body: &str, duration: Duration) -> Option<Command> {
        // 解析命令（可能包含参数）
        let parts: Vec<&str> = self.command.split_whitespace().collect();
        let (program, extra) = parts.split_first()?;

        let mut cmd = Command::new(program);
        cmd.args(extra);

        match *program {
            "notify-send" => {
                cmd.arg("-t")
                    .arg(duration.as_millis().to_string())
                    .arg(title)
                    .arg(body);
            }
            "osascript" => {
                cmd.arg("-e").arg(format!(
                    "display notification {} with title {}",
                    applescript_quote(body),
                    applescript_quote(title)
                ));
            }
            _ => {
                cmd.arg(title).arg(body);
            }
        }

        Some(cmd)
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, title: &str, body: &str, duration: Duration) {
        let Some(mut cmd) = self.build(title, body, duration) else {
            warn!("event=notify backend=command status=error error=empty_command");
            return;
        };

        match cmd.output() {
            Ok(output) if output.status.success() => {
                info!("event=notify backend=command status=ok title={:?}", title);
            }
            Ok(output) => {
                warn!(
                    "event=notify backend=command status=error exit={} stderr={:?}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => {
                warn!(
                    "event=notify backend=command status=error command={:?} error={}",
                    self.command, e
                );
            }
        }
    }
}

/// AppleScript 字符串字面量：只需转义 `\` 和 `"`
fn applescript_quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if c == '\\' || c == '"' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// 根据配置选择通知后端
pub fn from_command(command: &str) -> Arc<dyn Notifier> {
    if command.trim().is_empty() {
        Arc::new(LogNotifier)
    } else {
        Arc::new(CommandNotifier::new(command.trim()))
    }
}

/// 测试用：记录所有通知
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub calls: std::sync::Mutex<Vec<(String, String, Duration)>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn titles_and_bodies(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(t, b, _)| (t.clone(), b.clone()))
            .collect()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str, duration: Duration) {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string(), duration));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_notify_send_gets_timeout_in_millis() {
        let notifier = CommandNotifier::new("notify-send --app-name=taskbell");
        let cmd = notifier
            .build("Task reminder", "Buy milk", Duration::from_secs(10))
            .unwrap();

        assert_eq!(cmd.get_program(), "notify-send");
        assert_eq!(
            args_of(&cmd),
            vec!["--app-name=taskbell", "-t", "10000", "Task reminder", "Buy milk"]
        );
    }

    #[test]
    fn test_osascript_builds_script() {
        let notifier = CommandNotifier::new("osascript");
        let cmd = notifier
            .build("Task reminder", "Say \"hi\"", Duration::from_secs(5))
            .unwrap();

        let args = args_of(&cmd);
        assert_eq!(args[0], "-e");
        assert_eq!(
            args[1],
            r#"display notification "Say \"hi\"" with title "Task reminder""#
        );
    }

    #[test]
    fn test_osascript_keeps_control_and_unicode_characters() {
        let notifier = CommandNotifier::new("osascript");
        let cmd = notifier
            .build("⏰ 提醒", "line one\nC:\\tmp\t「牛乳」", Duration::from_secs(5))
            .unwrap();

        assert_eq!(
            args_of(&cmd)[1],
            "display notification \"line one\nC:\\\\tmp\t「牛乳」\" with title \"⏰ 提醒\""
        );
    }

    #[test]
    fn test_missing_command_does_not_panic() {
        let notifier = CommandNotifier::new("taskbell-no-such-notifier-binary");
        notifier.notify("title", "body", Duration::from_secs(1));

        let empty = CommandNotifier::new("   ");
        assert!(empty.build("t", "b", Duration::from_secs(1)).is_none());
        empty.notify("t", "b", Duration::from_secs(1));
    }
}
