#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use judge_watch_core::domain::{
    JudgeApi, JudgeApiError, SubmissionId, SubmissionMetrics, SubmissionRequest,
    SubmissionSnapshot, SubmitReceipt, Verdict,
};
use submission_tracker::{PollingConfig, TrackerConfig};

pub const SUBMISSION_ID: &str = "42";

/// One scripted answer to `get_submission`.
#[derive(Clone)]
pub struct PollReply {
    pub delay: Option<Duration>,
    pub result: Result<SubmissionSnapshot, JudgeApiError>,
}

impl PollReply {
    pub fn verdict(verdict: &str) -> Self {
        Self::snapshot(snapshot(verdict))
    }

    pub fn snapshot(snapshot: SubmissionSnapshot) -> Self {
        Self {
            delay: None,
            result: Ok(snapshot),
        }
    }

    pub fn error(err: JudgeApiError) -> Self {
        Self {
            delay: None,
            result: Err(err),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub fn snapshot(verdict: &str) -> SubmissionSnapshot {
    SubmissionSnapshot::new(submission_id(), Verdict::parse(verdict))
}

pub fn accepted_snapshot(tests_passed: u32) -> SubmissionSnapshot {
    snapshot("AC").with_metrics(SubmissionMetrics {
        execution_time_ms: 15,
        memory_used_kb: 1024,
        score: 100.0,
        tests_passed,
        tests_failed: 0,
    })
}

pub fn submission_id() -> SubmissionId {
    SubmissionId::new(SUBMISSION_ID).expect("fixture id is valid")
}

/// In-memory judge backend with scripted poll replies.
///
/// Replies are consumed in order; once the script runs out the fallback is
/// returned for every further poll.
#[derive(Clone)]
pub struct FakeJudge {
    submit_result: Arc<Mutex<Result<SubmitReceipt, JudgeApiError>>>,
    replies: Arc<Mutex<VecDeque<PollReply>>>,
    fallback: Arc<Mutex<PollReply>>,
    submit_calls: Arc<AtomicU32>,
    poll_calls: Arc<AtomicU32>,
    last_request: Arc<Mutex<Option<SubmissionRequest>>>,
}

impl FakeJudge {
    pub fn new() -> Self {
        Self {
            submit_result: Arc::new(Mutex::new(Ok(SubmitReceipt {
                id: submission_id(),
                verdict: Verdict::Queued,
                message: Some("submission queued for judging".to_string()),
            }))),
            replies: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(PollReply::verdict("QUEUED"))),
            submit_calls: Arc::new(AtomicU32::new(0)),
            poll_calls: Arc::new(AtomicU32::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_replies(self, replies: impl IntoIterator<Item = PollReply>) -> Self {
        self.replies.lock().expect("replies lock").extend(replies);
        self
    }

    pub fn with_fallback(self, fallback: PollReply) -> Self {
        *self.fallback.lock().expect("fallback lock") = fallback;
        self
    }

    pub fn with_submit_result(self, result: Result<SubmitReceipt, JudgeApiError>) -> Self {
        *self.submit_result.lock().expect("submit lock") = result;
        self
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SubmissionRequest> {
        self.last_request.lock().expect("request lock").clone()
    }

    pub fn into_api(self) -> Arc<dyn JudgeApi> {
        Arc::new(self)
    }
}

#[async_trait]
impl JudgeApi for FakeJudge {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmitReceipt, JudgeApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().expect("request lock") = Some(request.clone());
        self.submit_result.lock().expect("submit lock").clone()
    }

    async fn get_submission(
        &self,
        _id: &SubmissionId,
    ) -> Result<SubmissionSnapshot, JudgeApiError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| self.fallback.lock().expect("fallback lock").clone());

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.result
    }
}

pub fn test_config() -> TrackerConfig {
    TrackerConfig::with_base_url("http://judge.test")
}

pub fn fast_polling() -> PollingConfig {
    PollingConfig {
        interval_ms: 10,
        max_duration_secs: 1,
        request_timeout_ms: 100,
    }
}
