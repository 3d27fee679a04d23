use crate::app::{App, Mode};
use crate::models::TaskStatus;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// 渲染状态栏（Helix 风格）
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mode_text = match app.mode {
        Mode::Normal => ("NORMAL", Color::Green),
        Mode::Dialog => ("INPUT", Color::Magenta),
        Mode::Help => ("HELP", Color::Blue),
    };

    let status = match app.status_filter {
        None => "all",
        Some(TaskStatus::Active) => "active",
        Some(TaskStatus::Completed) => "completed",
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode_text.0),
            Style::default()
                .fg(Color::Black)
                .bg(mode_text.1)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} shown | status: {} | {} categories | ? help ",
            app.tasks.len(),
            status,
            app.categories.len()
        )),
    ]);

    let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));

    f.render_widget(paragraph, area);
}
