use thiserror::Error;

/// 任务存储的错误类型
///
/// 前四种同步返回给调用方；`Persistence` 在保存失败时返回，
/// 但内存中的修改不会回滚。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 空标题、时间格式错误等
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 任务或分类不存在
    #[error("not found: {0}")]
    NotFound(String),

    /// 当前状态不允许该操作（例如给已完成任务设置提醒）
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("category '{0}' already exists")]
    DuplicateCategory(String),

    /// 读写存储文件失败
    #[error("persistence failure: {0}")]
    Persistence(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub(crate) fn task_not_found(id: u32) -> Self {
        StoreError::NotFound(format!("task #{}", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::task_not_found(7).to_string(),
            "not found: task #7"
        );
        assert_eq!(
            StoreError::DuplicateCategory("Work".into()).to_string(),
            "category 'Work' already exists"
        );
    }
}
