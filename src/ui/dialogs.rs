use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_textarea::TextArea;

use crate::app::Dialog;
use crate::models::FALLBACK_CATEGORY;

/// 渲染居中的对话框
pub fn render_dialog(f: &mut Frame, dialog: &Dialog) {
    let area = centered_rect(60, 30, f.area());

    // 清空对话框区域
    f.render_widget(Clear, area);

    match dialog {
        Dialog::Input {
            title,
            prompt,
            textarea,
            ..
        } => render_input_dialog(f, area, title, prompt, textarea),
        Dialog::ConfirmDelete { title, .. } => render_confirm_dialog(
            f,
            area,
            "Delete task",
            &format!("Delete 「{}」?", title),
        ),
        Dialog::ConfirmRemoveCategory { name } => render_confirm_dialog(
            f,
            area,
            "Remove category",
            &format!(
                "Remove category '{}'? Its tasks move to {}.",
                name, FALLBACK_CATEGORY
            ),
        ),
    }
}

/// 渲染输入对话框
fn render_input_dialog(
    f: &mut Frame,
    area: Rect,
    title: &str,
    prompt: &str,
    textarea: &TextArea<'static>,
) {
    let block = Block::default()
        .title(format!("  {}  ", title))
        .title_alignment(Alignment::Left)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(76, 86, 106))) // Nord border color
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(Color::Rgb(46, 52, 64))); // Nord background

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // 提示文本
            Constraint::Length(3), // 输入框
            Constraint::Min(0),
            Constraint::Length(1), // 按键提示
        ])
        .split(inner);

    let prompt_text = Paragraph::new(prompt).style(Style::default().fg(Color::Rgb(129, 161, 193)));
    f.render_widget(prompt_text, chunks[0]);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(136, 192, 208))) // Nord cyan
        .border_type(BorderType::Rounded);
    let input_inner = input_block.inner(chunks[1]);
    f.render_widget(input_block, chunks[1]);
    f.render_widget(textarea, input_inner);

    let hint = Paragraph::new("Enter submit · Esc cancel")
        .style(Style::default().fg(Color::Rgb(76, 86, 106)))
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[3]);
}

/// 渲染确认对话框
fn render_confirm_dialog(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let block = Block::default()
        .title(format!("  {}  ", title))
        .title_alignment(Alignment::Left)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(235, 203, 139))) // Nord yellow for warnings
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(Color::Rgb(46, 52, 64)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let message_text = Paragraph::new(message)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Rgb(216, 222, 233))); // Nord snow storm
    f.render_widget(message_text, chunks[0]);

    let buttons = Paragraph::new("[ y ] yes    [ n ] no")
        .style(
            Style::default()
                .fg(Color::Rgb(163, 190, 140))
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(buttons, chunks[1]);
}

/// 创建一个居中的矩形区域
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_inside_parent() {
        let parent = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(60, 50, parent);
        assert_eq!(rect.width, 60);
        assert_eq!(rect.height, 20);
        assert_eq!(rect.x, 20);
        assert_eq!(rect.y, 10);
    }
}
