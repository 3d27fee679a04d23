/// 应用配置管理
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 任务数据文件（默认 ~/.taskbell/tasks.json）
    pub data_file: Option<PathBuf>,
    /// 提醒轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 通知显示时长（秒）
    pub notification_duration_secs: u64,
    /// 通知命令，留空则只写日志
    pub notify_command: String,
    /// 日志级别 trace|debug|info|warn|error
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            poll_interval_secs: 30,
            notification_duration_secs: 10,
            notify_command: detect_notify_command(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_secs(self.notification_duration_secs)
    }

    pub fn data_file(&self) -> Result<PathBuf> {
        match &self.data_file {
            Some(path) => Ok(path.clone()),
            None => Ok(get_home_dir()?.join("tasks.json")),
        }
    }
}

/// 获取数据目录
/// TASKBELL_HOME 优先，否则 ~/.taskbell
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TASKBELL_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Failed to get home directory (HOME / USERPROFILE not set)")?;
    Ok(PathBuf::from(home_dir).join(".taskbell"))
}

/// 获取配置文件路径
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("config.toml"))
}

/// 日志目录
pub fn get_log_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("logs"))
}

/// 加载配置
pub fn load_config() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        // 配置文件不存在，返回默认配置
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse {}", config_path.display()))
}

fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

/// 保存配置
pub fn save_config(config: &Config) -> Result<()> {
    let config_path = get_config_path()?;

    // 确保目录存在
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(config_path, content)?;

    Ok(())
}

/// 检测系统通知命令
fn detect_notify_command() -> String {
    match std::env::consts::OS {
        "macos" => "osascript".to_string(),
        "linux" | "freebsd" | "openbsd" => {
            if which("notify-send").is_ok() {
                "notify-send".to_string()
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

/// 检查命令是否存在
fn which(cmd: &str) -> Result<PathBuf> {
    use std::process::Command;

    let output = Command::new("which").arg(cmd).output()?;

    if output.status.success() {
        let path = String::from_utf8(output.stdout)?.trim().to_string();
        Ok(PathBuf::from(path))
    } else {
        Err(anyhow::anyhow!("Command not found: {}", cmd))
    }
}

/// 更新通知命令
pub fn set_notify_command(command: String) -> Result<()> {
    let mut config = load_config()?;
    config.notify_command = command;
    save_config(&config)?;
    if config.notify_command.is_empty() {
        println!("✓ 通知已改为仅写入日志");
    } else {
        println!("✓ 通知命令已设置为: {}", config.notify_command);
    }
    Ok(())
}

/// 更新轮询间隔
pub fn set_poll_interval(secs: u64) -> Result<()> {
    if secs == 0 {
        anyhow::bail!("轮询间隔必须大于 0 秒");
    }
    let mut config = load_config()?;
    config.poll_interval_secs = secs;
    save_config(&config)?;
    println!("✓ 提醒轮询间隔已设置为 {} 秒", secs);
    Ok(())
}

/// 显示当前配置
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    println!("当前配置:");
    println!("  数据文件:   {}", config.data_file()?.display());
    println!("  轮询间隔:   {} 秒", config.poll_interval_secs);
    println!("  通知时长:   {} 秒", config.notification_duration_secs);
    println!(
        "  通知命令:   {}",
        if config.notify_command.is_empty() {
            "(仅日志)"
        } else {
            config.notify_command.as_str()
        }
    );
    println!("  日志级别:   {}", config.log_level);
    println!();
    println!("配置文件: {}", get_config_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config("poll_interval_secs = 45\nnotify_command = \"\"\n").unwrap();
        assert_eq!(config.poll_interval_secs, 45);
        assert_eq!(config.notification_duration_secs, 10);
        assert_eq!(config.notify_command, "");
        assert_eq!(config.log_level, "info");
        assert!(config.data_file.is_none());
    }

    #[test]
    fn test_poll_interval_has_floor() {
        let config = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config {
            data_file: Some(PathBuf::from("/tmp/タスク.json")),
            poll_interval_secs: 60,
            notification_duration_secs: 5,
            notify_command: "notify-send --urgency=low".to_string(),
            log_level: "debug".to_string(),
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(parse_config(&text).unwrap(), config);
    }

    #[test]
    fn test_explicit_data_file_wins() {
        let config = Config {
            data_file: Some(PathBuf::from("/srv/tasks.json")),
            ..Config::default()
        };
        assert_eq!(config.data_file().unwrap(), PathBuf::from("/srv/tasks.json"));
    }
}
