//! Request/response bodies of the judge backend's `/submissions` REST surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /submissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub slug: String,
    pub code: String,
    pub language: String,
}

/// Body returned by `POST /submissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(deserialize_with = "wire_id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub verdict: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body returned by `GET /submissions/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    #[serde(deserialize_with = "wire_id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub verdict: String,
    #[serde(default)]
    pub execution_time: u64,
    #[serde(default)]
    pub memory_used: u64,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub tests_passed: u32,
    #[serde(default)]
    pub tests_failed: u32,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub judged_at: Option<DateTime<Utc>>,
    /// `null` until judging has produced per-test results.
    #[serde(default)]
    pub test_results: Option<Vec<TestCaseResultDto>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResultDto {
    #[serde(deserialize_with = "wire_id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub verdict: String,
    #[serde(default)]
    pub execution_time: u64,
    #[serde(default)]
    pub memory_used: u64,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error_message: String,
}

/// Error body, `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Ids are integers on some backends and strings on others.
mod wire_id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => value,
            RawId::Unsigned(value) => value.to_string(),
            RawId::Signed(value) => value.to_string(),
        })
    }
}
