pub mod dialogs;
mod help;
mod list;
mod statusbar;

use crate::app::{App, Mode, Notification, NotificationLevel};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;

/// 主渲染函数
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // 标题 + 激励语
            Constraint::Length(1), // 进度条
            Constraint::Min(3),    // 任务列表
            Constraint::Length(1), // 状态栏
        ])
        .split(f.area());

    render_header(f, chunks[0], app);
    render_progress(f, chunks[1], app);
    list::render(f, chunks[2], app);
    statusbar::render(f, chunks[3], app);

    if let Some(dialog) = &app.dialog {
        dialogs::render_dialog(f, dialog);
    }

    if app.mode == Mode::Help {
        help::render(f, f.area());
    }

    if let Some(notification) = &app.notification {
        render_notification(f, f.area(), notification);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let lines = vec![
        Line::from(Span::styled(
            " Today's tasks",
            Style::default()
                .fg(Color::Rgb(236, 239, 244))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" {}", app.motivation()),
            Style::default().fg(Color::Rgb(163, 190, 140)), // Nord green
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_progress(f: &mut Frame, area: Rect, app: &App) {
    let progress = app.stats.progress();
    let label = format!(
        "{}/{} done ({}%)",
        app.stats.completed,
        app.stats.total,
        (progress * 100.0).round() as u32
    );
    let gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(136, 192, 208)) // Nord frost
                .bg(Color::Rgb(59, 66, 82)),
        )
        .ratio(progress.clamp(0.0, 1.0))
        .label(label);
    f.render_widget(gauge, area);
}

/// 渲染通知栏
fn render_notification(f: &mut Frame, area: Rect, notification: &Notification) {
    // 通知栏占据顶部 3 行
    let notification_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 3.min(area.height),
    };

    // 根据级别选择颜色
    let (bg_color, fg_color, prefix) = match notification.level {
        NotificationLevel::Info => (Color::Blue, Color::White, "ℹ"),
        NotificationLevel::Success => (Color::Green, Color::White, "✓"),
        NotificationLevel::Warning => (Color::Yellow, Color::Black, "⚠"),
        NotificationLevel::Error => (Color::Red, Color::White, "✗"),
    };

    let content = Line::from(vec![
        Span::styled(
            format!(" {} ", prefix),
            Style::default()
                .fg(fg_color)
                .bg(bg_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(&notification.message, Style::default().fg(fg_color)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(bg_color))
        .style(Style::default().bg(bg_color));

    f.render_widget(Paragraph::new(content).block(block), notification_area);
}
