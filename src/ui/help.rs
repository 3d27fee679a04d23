use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use super::dialogs::centered_rect;
use crate::input::keyboard::KEY_BINDINGS;

/// 渲染帮助面板
pub fn render(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keyboard shortcuts (any key to close) ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(Color::Black));

    let mut lines = vec![
        Line::from(Span::styled(
            "Keys",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(KEY_BINDINGS.iter().map(|(key, cmd)| {
        Line::from(vec![
            Span::styled(format!("{:<12}", key), Style::default().fg(Color::Cyan)),
            Span::raw(cmd.description()),
        ])
    }));

    f.render_widget(Paragraph::new(lines).block(block), popup_area);
}
