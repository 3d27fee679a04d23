use crate::app::{App, Dialog, InputKind, Mode};
use crate::input::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::CursorMove;

/// 按键绑定表（帮助面板也从这里生成）
pub const KEY_BINDINGS: [(&str, Command); 14] = [
    ("j / ↓", Command::TaskDown),
    ("k / ↑", Command::TaskUp),
    ("a", Command::NewTask),
    ("space / x", Command::ToggleTask),
    ("d", Command::DeleteTask),
    ("r", Command::SetReminder),
    ("R", Command::ClearReminder),
    ("f", Command::CycleStatusFilter),
    ("c", Command::CycleCategoryFilter),
    ("C", Command::NewCategory),
    ("D", Command::RemoveCategory),
    ("?", Command::ShowHelp),
    ("q", Command::Quit),
    ("Ctrl+C", Command::Quit),
];

/// 处理键盘输入
/// 返回 false 表示应该退出应用
pub fn handle_key_input(app: &mut App, key: KeyEvent) -> bool {
    match app.mode {
        Mode::Normal => handle_normal_mode(app, key),
        Mode::Dialog => {
            handle_dialog_mode(app, key);
            true
        }
        Mode::Help => {
            // 任意键关闭帮助
            app.mode = Mode::Normal;
            true
        }
    }
}

/// 将按键映射为命令
pub fn match_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }

    let cmd = match key.code {
        KeyCode::Char('j') | KeyCode::Down => Command::TaskDown,
        KeyCode::Char('k') | KeyCode::Up => Command::TaskUp,
        KeyCode::Char('a') => Command::NewTask,
        KeyCode::Char(' ') | KeyCode::Char('x') => Command::ToggleTask,
        KeyCode::Char('d') => Command::DeleteTask,
        KeyCode::Char('r') => Command::SetReminder,
        KeyCode::Char('R') => Command::ClearReminder,
        KeyCode::Char('f') => Command::CycleStatusFilter,
        KeyCode::Char('c') => Command::CycleCategoryFilter,
        KeyCode::Char('C') => Command::NewCategory,
        KeyCode::Char('D') => Command::RemoveCategory,
        KeyCode::Char('?') => Command::ShowHelp,
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> bool {
    let Some(cmd) = match_key(key) else {
        return true;
    };

    if cmd == Command::Quit {
        return false;
    }

    execute_command(app, cmd);
    true
}

/// 执行命令
pub fn execute_command(app: &mut App, cmd: Command) {
    match cmd {
        Command::Quit => {}
        Command::TaskUp => app.select_prev(),
        Command::TaskDown => app.select_next(),
        Command::NewTask => app.open_input(InputKind::AddTask),
        Command::ToggleTask => app.toggle_selected(),
        Command::DeleteTask => app.request_delete(),
        Command::SetReminder => app.request_reminder(),
        Command::ClearReminder => app.clear_selected_reminder(),
        Command::CycleStatusFilter => app.cycle_status_filter(),
        Command::CycleCategoryFilter => app.cycle_category_filter(),
        Command::NewCategory => app.open_input(InputKind::AddCategory),
        Command::RemoveCategory => app.request_remove_category(),
        Command::ShowHelp => app.mode = Mode::Help,
    }
}

/// 处理对话框按键
fn handle_dialog_mode(app: &mut App, key: KeyEvent) {
    let Some(dialog) = app.dialog.as_mut() else {
        app.mode = Mode::Normal;
        return;
    };

    match dialog {
        Dialog::Input { kind, textarea, .. } => match key.code {
            KeyCode::Esc => app.close_dialog(),
            KeyCode::Enter => {
                let kind = *kind;
                let text = textarea.lines().join(" ");
                app.close_dialog();
                if !text.trim().is_empty() {
                    app.submit_input(kind, &text);
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                textarea.insert_char(c);
            }
            KeyCode::Backspace => {
                textarea.delete_char();
            }
            KeyCode::Delete => {
                textarea.delete_next_char();
            }
            KeyCode::Left => textarea.move_cursor(CursorMove::Back),
            KeyCode::Right => textarea.move_cursor(CursorMove::Forward),
            KeyCode::Home => textarea.move_cursor(CursorMove::Head),
            KeyCode::End => textarea.move_cursor(CursorMove::End),
            _ => {}
        },
        Dialog::ConfirmDelete { id, title } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let (id, title) = (*id, title.clone());
                app.close_dialog();
                app.delete_task(id, &title);
            }
            _ => app.close_dialog(),
        },
        Dialog::ConfirmRemoveCategory { name } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let name = name.clone();
                app.close_dialog();
                app.remove_category(&name);
            }
            _ => app.close_dialog(),
        },
    }
}
