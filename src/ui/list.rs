use crate::app::App;
use crate::models::{Priority, Task};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// 渲染任务列表
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let title = match &app.category_filter {
        Some(category) => format!(" {} ", category),
        None => " All categories ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(76, 86, 106)));

    if app.tasks.is_empty() {
        let paragraph = Paragraph::new("No tasks here. Press 'a' to add one!")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app.tasks.iter().map(task_line).map(ListItem::new).collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(67, 76, 94))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Rgb(191, 97, 106),   // Nord red
        Priority::Medium => Color::Rgb(235, 203, 139), // Nord yellow
        Priority::Low => Color::Rgb(163, 190, 140),    // Nord green
    }
}

/// 单行任务：状态 优先级 标题 [分类] (⏰ 时间)
fn task_line(task: &Task) -> Line<'static> {
    let (marker, title_style) = if task.is_completed() {
        (
            "[✓]",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        ("[ ]", Style::default().fg(Color::Rgb(236, 239, 244)))
    };

    let mut spans = vec![
        Span::raw(format!("{} ", marker)),
        Span::styled(
            format!("{} ", task.priority.label()),
            Style::default().fg(priority_color(task.priority)),
        ),
        Span::styled(task.title.clone(), title_style),
        Span::styled(
            format!("  [{}]", task.category),
            Style::default().fg(Color::Rgb(129, 161, 193)),
        ),
    ];

    if let Some(at) = task.reminder_at {
        spans.push(Span::styled(
            format!("  (⏰ {})", at.format("%m-%d %H:%M")),
            Style::default().fg(Color::Rgb(208, 135, 112)),
        ));
    }

    Line::from(spans)
}
