use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("problem slug must not be empty")]
    EmptyProblemSlug,
    #[error("source code must not be empty")]
    EmptySourceCode,
    #[error("language must not be empty")]
    EmptyLanguage,
    #[error("submission id must not be empty")]
    EmptySubmissionId,
}
