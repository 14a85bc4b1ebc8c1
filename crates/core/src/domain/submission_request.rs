use serde::{Deserialize, Serialize};

use super::{DomainError, Language};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemSlug(String);

impl ProblemSlug {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(DomainError::EmptyProblemSlug);
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Source code of a submission. Stored exactly as given; only the
/// emptiness check ignores surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceCode(String);

impl SourceCode {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(DomainError::EmptySourceCode);
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated request to judge `source_code` against `problem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub problem: ProblemSlug,
    pub source_code: SourceCode,
    pub language: Language,
}

impl SubmissionRequest {
    /// Validates all three inputs. Source code is checked first so that the
    /// most common mistake is the one reported.
    pub fn new(
        problem: impl Into<String>,
        source_code: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let source_code = SourceCode::new(source_code)?;
        let problem = ProblemSlug::new(problem)?;
        let language = Language::new(language)?;

        Ok(Self {
            problem,
            source_code,
            language,
        })
    }
}
