use async_trait::async_trait;
use thiserror::Error;

use super::{SubmissionId, SubmissionRequest, SubmissionSnapshot, SubmitReceipt};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JudgeApiError {
    #[error("judge api unreachable: {0}")]
    Transport(String),
    #[error("judge api request timed out")]
    Timeout,
    #[error("judge api returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("judge api response could not be decoded: {0}")]
    Decode(String),
}

impl JudgeApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The two operations the tracker needs from the judge backend.
///
/// `submit` must be issued at most once per user-initiated submission;
/// `get_submission` is idempotent and may be called repeatedly.
#[async_trait]
pub trait JudgeApi: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmitReceipt, JudgeApiError>;

    async fn get_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<SubmissionSnapshot, JudgeApiError>;
}
