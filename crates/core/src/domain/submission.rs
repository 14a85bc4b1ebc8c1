use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SubmissionId, Verdict};

/// Aggregate judging metrics. All zero until the verdict is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmissionMetrics {
    pub execution_time_ms: u64,
    pub memory_used_kb: u64,
    pub score: f64,
    pub tests_passed: u32,
    pub tests_failed: u32,
}

impl SubmissionMetrics {
    pub fn tests_total(&self) -> u32 {
        self.tests_passed.saturating_add(self.tests_failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub id: String,
    pub verdict: Verdict,
    pub execution_time_ms: u64,
    pub memory_used_kb: u64,
    pub output: String,
    pub error_message: String,
}

/// One observation of the backend's submission resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSnapshot {
    pub id: SubmissionId,
    pub verdict: Verdict,
    pub metrics: SubmissionMetrics,
    pub test_results: Vec<TestCaseResult>,
    pub language: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub judged_at: Option<DateTime<Utc>>,
}

impl SubmissionSnapshot {
    /// A bare snapshot carrying only id and verdict.
    pub fn new(id: SubmissionId, verdict: Verdict) -> Self {
        Self {
            id,
            verdict,
            metrics: SubmissionMetrics::default(),
            test_results: Vec::new(),
            language: None,
            submitted_at: None,
            judged_at: None,
        }
    }

    pub fn with_metrics(mut self, metrics: SubmissionMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_test_results(mut self, test_results: Vec<TestCaseResult>) -> Self {
        self.test_results = test_results;
        self
    }
}

/// What the backend answers to a submit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub id: SubmissionId,
    pub verdict: Verdict,
    pub message: Option<String>,
}
