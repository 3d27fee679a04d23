/// 应用命令枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,

    // ===== 导航 =====
    TaskUp,
    TaskDown,

    // ===== 任务操作 =====
    NewTask,
    ToggleTask,
    DeleteTask,
    SetReminder,
    ClearReminder,

    // ===== 过滤 =====
    CycleStatusFilter,
    CycleCategoryFilter,

    // ===== 分类 =====
    NewCategory,
    RemoveCategory,

    ShowHelp,
}

impl Command {
    /// 帮助面板中的说明
    pub fn description(self) -> &'static str {
        match self {
            Command::Quit => "Quit",
            Command::TaskUp => "Select previous task",
            Command::TaskDown => "Select next task",
            Command::NewTask => "Add task (title #category !priority)",
            Command::ToggleTask => "Toggle completed",
            Command::DeleteTask => "Delete task",
            Command::SetReminder => "Set reminder",
            Command::ClearReminder => "Clear reminder",
            Command::CycleStatusFilter => "Cycle status filter",
            Command::CycleCategoryFilter => "Cycle category filter",
            Command::NewCategory => "Add category",
            Command::RemoveCategory => "Remove filtered category",
            Command::ShowHelp => "Toggle this help",
        }
    }
}
