mod error;
mod ids;
mod judge_api;
mod language;
mod submission;
mod submission_request;
mod verdict;
mod view_state;

pub use error::DomainError;
pub use ids::{SubmissionId, TrackerId};
pub use judge_api::{JudgeApi, JudgeApiError};
pub use language::Language;
pub use submission::{SubmissionMetrics, SubmissionSnapshot, SubmitReceipt, TestCaseResult};
pub use submission_request::{ProblemSlug, SourceCode, SubmissionRequest};
pub use verdict::{Verdict, VerdictStage};
pub use view_state::{Observation, SubmissionViewState, TrackerFailure};
