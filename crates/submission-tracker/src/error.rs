use judge_watch_core::domain::{DomainError, JudgeApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("提交参数无效: {0}")]
    Validation(#[from] DomainError),

    #[error("提交失败: {0}")]
    Submit(#[source] JudgeApiError),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("跟踪器未找到: {0}")]
    TrackerNotFound(String),
}

impl TrackerError {
    /// 是否为本地参数校验失败（未发出任何网络请求）。
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
