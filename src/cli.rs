use anyhow::Result;
use log::info;
use std::env;
use std::io::BufRead;
use std::sync::Arc;

use crate::config::Config;
use crate::input::parse::parse_reminder_input;
use crate::models::{Priority, Task, TaskStatus, FALLBACK_CATEGORY};
use crate::notify;
use crate::scheduler::ReminderScheduler;
use crate::store::{TaskFilter, TaskStore};

/// 处理 CLI 命令
/// 返回 true 表示应该继续进入 TUI，false 表示已处理完毕应该退出
pub fn handle_cli(config: &Config) -> Result<bool> {
    let args: Vec<String> = env::args().collect();

    // 如果没有参数，进入 TUI 模式
    if args.len() < 2 {
        return Ok(true);
    }

    match args[1].as_str() {
        "add" | "list" | "ls" | "done" | "rm" | "remind" | "unremind" | "category" => {
            let store = TaskStore::open(config.data_file()?);
            if let Err(e) = run_store_command(&store, &args[1..]) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            Ok(false)
        }
        "watch" => {
            watch(config)?;
            Ok(false)
        }
        "config" => {
            if args.len() < 3 {
                crate::config::show_config()?;
            } else {
                match args[2].as_str() {
                    "show" => crate::config::show_config()?,
                    "notify" => {
                        // 不带参数表示关闭外部通知
                        crate::config::set_notify_command(args[3..].join(" "))?;
                    }
                    "interval" => {
                        let Some(secs) = args.get(3).and_then(|s| s.parse::<u64>().ok()) else {
                            eprintln!("用法: tb config interval <秒>");
                            std::process::exit(1);
                        };
                        crate::config::set_poll_interval(secs)?;
                    }
                    _ => {
                        eprintln!("未知的配置选项: {}", args[2]);
                        eprintln!("可用选项: show, notify, interval");
                        std::process::exit(1);
                    }
                }
            }
            Ok(false)
        }
        "--help" | "-h" | "help" => {
            print_help();
            Ok(false)
        }
        "--version" | "-V" | "-v" => {
            print_version();
            Ok(false)
        }
        _ => {
            eprintln!("未知命令: {}", args[1]);
            eprintln!("使用 'tb --help' 查看帮助");
            std::process::exit(1);
        }
    }
}

// ============================================================================
// Task Commands
// ============================================================================

/// `args[0]` 是命令名
fn run_store_command(store: &TaskStore, args: &[String]) -> Result<(), String> {
    let rest = &args[1..];
    match args[0].as_str() {
        "add" => {
            let (title, category, priority) = parse_add_args(rest)?;
            let category = category.unwrap_or_else(|| FALLBACK_CATEGORY.to_string());
            let task = store
                .add(&title, &category, priority.unwrap_or_default())
                .map_err(|e| e.to_string())?;
            println!("✓ Added #{} {}", task.id, task.title);
            Ok(())
        }
        "list" | "ls" => {
            let filter = parse_list_filter(rest)?;
            let tasks = store.filter(&filter);
            if tasks.is_empty() {
                println!("No tasks found.");
                return Ok(());
            }
            for task in &tasks {
                println!("{}", format_task_line(task));
            }
            let stats = store.stats();
            println!(
                "\n{} tasks, {} done ({:.0}%)",
                stats.total,
                stats.completed,
                stats.progress() * 100.0
            );
            Ok(())
        }
        "done" => {
            let id = parse_id(rest.first())?;
            let task = store.toggle_complete(id).map_err(|e| e.to_string())?;
            match task.status {
                TaskStatus::Completed => println!("✓ Completed #{} {}", task.id, task.title),
                TaskStatus::Active => println!("Reopened #{} {}", task.id, task.title),
            }
            Ok(())
        }
        "rm" => {
            let id = parse_id(rest.first())?;
            store.delete(id).map_err(|e| e.to_string())?;
            println!("Deleted #{}", id);
            Ok(())
        }
        "remind" => {
            let id = parse_id(rest.first())?;
            if rest.len() < 2 {
                return Err("Missing time\nUsage: tb remind <id> <HH:MM | YYYY-MM-DD HH:MM | +30m>".to_string());
            }
            let at = parse_reminder_input(&rest[1..].join(" "), store.now())
                .map_err(|e| e.to_string())?;
            let task = store.set_reminder(id, at).map_err(|e| e.to_string())?;
            if let Some(at) = task.reminder_at {
                println!("⏰ #{} {} at {}", task.id, task.title, at.format("%Y-%m-%d %H:%M"));
            }
            Ok(())
        }
        "unremind" => {
            let id = parse_id(rest.first())?;
            let task = store.clear_reminder(id).map_err(|e| e.to_string())?;
            println!("Reminder cleared for #{} {}", task.id, task.title);
            Ok(())
        }
        "category" => handle_category_command(store, rest),
        cmd => Err(format!("Unknown command: {}", cmd)),
    }
}

fn handle_category_command(store: &TaskStore, args: &[String]) -> Result<(), String> {
    match args.first().map(|s| s.as_str()) {
        None | Some("list") => {
            let tasks = store.filter(&TaskFilter::all());
            println!("NAME                TASKS");
            println!("------------------  -----");
            for name in store.categories() {
                let count = tasks.iter().filter(|t| t.category == name).count();
                println!("{:<18}  {}", name, count);
            }
            Ok(())
        }
        Some("add") => {
            let name = args[1..].join(" ");
            store.add_category(&name).map_err(|e| e.to_string())?;
            println!("Created category '{}'", name.trim());
            Ok(())
        }
        Some("rm") => {
            let name = args[1..].join(" ");
            store.remove_category(&name).map_err(|e| e.to_string())?;
            println!(
                "Removed category '{}' (tasks moved to '{}')",
                name, FALLBACK_CATEGORY
            );
            Ok(())
        }
        Some(cmd) => Err(format!(
            "Unknown category command: {}\nUsage: tb category [list | add <name> | rm <name>]",
            cmd
        )),
    }
}

/// 前台运行提醒调度，直到按下 Enter 或 stdin 关闭
fn watch(config: &Config) -> Result<()> {
    let store = Arc::new(TaskStore::open(config.data_file()?));
    let notifier = notify::from_command(&config.notify_command);
    let mut handle = ReminderScheduler::new(store, notifier)
        .with_poll_interval(config.poll_interval())
        .with_notification_duration(config.notification_duration())
        .spawn()?;
    info!("event=watch_start scheduler={:?}", handle.state());

    println!(
        "Watching reminders every {}s. Press Enter to stop.",
        config.poll_interval().as_secs()
    );
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    handle.shutdown();
    println!("Stopped.");
    Ok(())
}

// ============================================================================
// Argument helpers
// ============================================================================

fn parse_flag(args: &[String], flags: &[&str]) -> Option<String> {
    args.iter()
        .position(|s| flags.contains(&s.as_str()))
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_id(arg: Option<&String>) -> Result<u32, String> {
    let arg = arg.ok_or_else(|| "Missing task ID".to_string())?;
    arg.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("Invalid task ID '{}' (must be a number)", arg))
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid priority '{}' (high, medium, low)", value))
}

/// `add` 的参数：标题词 + `--category` / `--priority`
fn parse_add_args(args: &[String]) -> Result<(String, Option<String>, Option<Priority>), String> {
    let mut words = Vec::new();
    let mut category = None;
    let mut priority = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--category" | "-c" => {
                let value = iter.next().ok_or("Missing value for --category")?;
                category = Some(value.clone());
            }
            "--priority" | "-p" => {
                let value = iter.next().ok_or("Missing value for --priority")?;
                priority = Some(parse_priority(value)?);
            }
            _ => words.push(arg.as_str()),
        }
    }

    let title = words.join(" ");
    if title.trim().is_empty() {
        return Err("Missing task title\nUsage: tb add <title> [--category C] [--priority P]".to_string());
    }
    Ok((title, category, priority))
}

fn parse_list_filter(args: &[String]) -> Result<TaskFilter, String> {
    let mut filter = TaskFilter::all();
    if args.iter().any(|a| a == "--active") {
        filter = filter.with_status(TaskStatus::Active);
    }
    if args.iter().any(|a| a == "--completed" || a == "--done") {
        filter = filter.with_status(TaskStatus::Completed);
    }
    if let Some(category) = parse_flag(args, &["--category", "-c"]) {
        filter = filter.with_category(category);
    }
    if let Some(priority) = parse_flag(args, &["--priority", "-p"]) {
        filter = filter.with_priority(parse_priority(&priority)?);
    }
    Ok(filter)
}

fn format_task_line(task: &Task) -> String {
    let marker = if task.is_completed() { "[✓]" } else { "[ ]" };
    let mut line = format!(
        "#{:<4} {} {} {}  [{}]",
        task.id,
        marker,
        task.priority.label(),
        task.title,
        task.category
    );
    if let Some(at) = task.reminder_at {
        line.push_str(&format!("  ⏰ {}", at.format("%Y-%m-%d %H:%M")));
    }
    line
}

/// 打印帮助信息
fn print_help() {
    println!("taskbell (tb) - 终端待办与提醒\n");
    println!("用法:");
    println!("  tb                      启动 TUI 界面");
    println!("  tb <命令> [参数]         运行 CLI 命令");
    println!("  tb --help               显示此帮助信息");
    println!("  tb --version            显示版本信息\n");

    println!("任务命令:");
    println!("  add <标题> [--category C] [--priority high|medium|low]");
    println!("  list [--active|--completed] [--category C] [--priority P]");
    println!("  done <id>               切换完成状态");
    println!("  rm <id>                 删除任务");
    println!("  remind <id> <时间>       设置提醒 (HH:MM, YYYY-MM-DD HH:MM, +30m, +2h)");
    println!("  unremind <id>           清除提醒\n");

    println!("分类命令:");
    println!("  category list");
    println!("  category add <名称>");
    println!("  category rm <名称>       任务会移到 {}\n", FALLBACK_CATEGORY);

    println!("其他:");
    println!("  watch                   前台运行提醒（按 Enter 停止）");
    println!("  config [show]           显示配置");
    println!("  config notify <命令>     设置通知命令（留空则仅写日志）");
    println!("  config interval <秒>     设置提醒轮询间隔\n");

    println!("示例:");
    println!("  tb add 买牛奶 --category Personal --priority high");
    println!("  tb remind 1 18:30");
    println!("  tb list --active");
}

/// 打印版本信息
fn print_version() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const NAME: &str = env!("CARGO_PKG_NAME");
    println!("{} {}", NAME, VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_add_args() {
        let (title, category, priority) =
            parse_add_args(&args("Write report --category Work -p high")).unwrap();
        assert_eq!(title, "Write report");
        assert_eq!(category.as_deref(), Some("Work"));
        assert_eq!(priority, Some(Priority::High));

        assert!(parse_add_args(&args("--priority low")).is_err());
        assert!(parse_add_args(&args("x --priority urgent")).is_err());
        assert!(parse_add_args(&args("x --category")).is_err());
    }

    #[test]
    fn test_parse_list_filter() {
        let filter = parse_list_filter(&args("--active --priority high")).unwrap();
        assert_eq!(filter.status, Some(TaskStatus::Active));
        assert_eq!(filter.priority, Some(Priority::High));
        assert_eq!(filter.category, None);

        let filter = parse_list_filter(&args("--completed -c Work")).unwrap();
        assert_eq!(filter.status, Some(TaskStatus::Completed));
        assert_eq!(filter.category.as_deref(), Some("Work"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some(&"7".to_string())), Ok(7));
        assert_eq!(parse_id(Some(&"#12".to_string())), Ok(12));
        assert!(parse_id(Some(&"abc".to_string())).is_err());
        assert!(parse_id(None).is_err());
    }

    #[test]
    fn test_store_commands_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json"));

        run_store_command(&store, &args("add Buy milk -c Personal")).unwrap();
        run_store_command(&store, &args("remind 1 +30m")).unwrap();
        assert!(store.get(1).unwrap().reminder_at.is_some());

        run_store_command(&store, &args("done 1")).unwrap();
        let task = store.get(1).unwrap();
        assert!(task.is_completed());
        assert!(task.reminder_at.is_none());

        assert!(run_store_command(&store, &args("remind 1 18:00")).is_err());
        run_store_command(&store, &args("rm 1")).unwrap();
        assert!(run_store_command(&store, &args("rm 1")).is_err());
    }

    #[test]
    fn test_category_commands() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json"));

        run_store_command(&store, &args("category add Errands")).unwrap();
        assert!(run_store_command(&store, &args("category add Errands")).is_err());
        run_store_command(&store, &args("add stamps --category Errands")).unwrap();

        run_store_command(&store, &args("category rm Errands")).unwrap();
        assert!(!store.categories().contains(&"Errands".to_string()));
        assert_eq!(store.get(1).unwrap().category, FALLBACK_CATEGORY);
    }

    #[test]
    fn test_format_task_line() {
        let created = chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut task = Task::new(3, "Call mom".to_string(), "Personal".to_string(), Priority::High, created);
        task.reminder_at = Some(created);
        let line = format_task_line(&task);
        assert!(line.starts_with("#3"));
        assert!(line.contains("[ ] 高 Call mom"));
        assert!(line.contains("⏰ 2025-03-01 09:00"));
    }
}
