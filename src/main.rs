use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;

mod app;
mod cli;
mod clock;
mod config;
mod error;
mod fs;
mod input;
mod logging;
mod models;
mod notify;
mod scheduler;
mod store;
mod ui;

use app::App;
use scheduler::ReminderScheduler;
use store::TaskStore;

fn main() -> Result<()> {
    let config = config::load_config()?;

    // 日志句柄必须活到进程结束
    let _logger = match logging::init_logging(&config.log_level, &config::get_log_dir()?) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("日志初始化失败: {}", e);
            None
        }
    };

    // 处理 CLI 命令
    let should_run_tui = cli::handle_cli(&config)?;

    // 如果 CLI 命令已处理，直接退出
    if !should_run_tui {
        return Ok(());
    }

    let store = Arc::new(TaskStore::open(config.data_file()?));
    let notifier = notify::from_command(&config.notify_command);

    let mut scheduler = ReminderScheduler::new(store.clone(), notifier.clone())
        .with_poll_interval(config.poll_interval())
        .with_notification_duration(config.notification_duration())
        .spawn()
        .context("无法启动提醒线程")?;
    info!("event=app_start data_file={}", store.path().display());

    // 设置终端
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 创建应用
    let mut app = App::new(store, notifier, config);

    // 运行应用
    let res = run_app(&mut terminal, &mut app);

    // 恢复终端
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    scheduler.shutdown();
    info!("event=app_stop");

    if let Err(err) = res {
        warn!("event=app_error error={:?}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.drain_events();
        app.tick();

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Windows 下会同时收到 Press 和 Release
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if !input::handle_key_input(app, key) {
                    return Ok(()); // 退出应用
                }
            }
        }
    }
}
