use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome classification reported by the judge.
///
/// The taxonomy is open: labels this client does not know are kept verbatim
/// in [`Verdict::Other`] and count as terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Queued,
    Judging,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompileError,
    SystemError,
    Other(String),
}

/// Progress ordering used to reject stale updates: `Queued < Judging < Terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStage {
    Queued,
    Judging,
    Terminal,
}

impl Verdict {
    /// Parses a backend label. Matching is case-insensitive and accepts the
    /// short codes (`AC`, `WA`, ...) as well as the long names. A blank label
    /// is what a freshly created submission carries, so it maps to `Queued`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "" | "QUEUED" | "PENDING" | "IN_QUEUE" => Self::Queued,
            "JUDGING" | "RUNNING" | "COMPILING" => Self::Judging,
            "ACCEPTED" | "AC" => Self::Accepted,
            "WRONG_ANSWER" | "WA" => Self::WrongAnswer,
            "TIME_LIMIT_EXCEEDED" | "TLE" => Self::TimeLimitExceeded,
            "MEMORY_LIMIT_EXCEEDED" | "MLE" => Self::MemoryLimitExceeded,
            "RUNTIME_ERROR" | "RE" => Self::RuntimeError,
            "COMPILE_ERROR" | "COMPILATION_ERROR" | "CE" => Self::CompileError,
            "SYSTEM_ERROR" | "INTERNAL_ERROR" => Self::SystemError,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Judging => "JUDGING",
            Self::Accepted => "ACCEPTED",
            Self::WrongAnswer => "WRONG_ANSWER",
            Self::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Self::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::CompileError => "COMPILE_ERROR",
            Self::SystemError => "SYSTEM_ERROR",
            Self::Other(raw) => raw,
        }
    }

    pub fn stage(&self) -> VerdictStage {
        match self {
            Self::Queued => VerdictStage::Queued,
            Self::Judging => VerdictStage::Judging,
            _ => VerdictStage::Terminal,
        }
    }

    /// Returns true once judging is complete and the verdict will not change.
    pub fn is_terminal(&self) -> bool {
        self.stage() == VerdictStage::Terminal
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl From<&str> for Verdict {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for Verdict {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Verdict> for String {
    fn from(value: Verdict) -> Self {
        match value {
            Verdict::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
