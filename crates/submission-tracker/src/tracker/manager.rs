use std::collections::HashMap;
use std::sync::Arc;

use judge_watch_core::domain::{JudgeApi, SubmissionRequest, TrackerId};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{info, warn};

use super::{TrackerHandle, poller};
use crate::client::HttpJudgeClient;
use crate::{EventBroadcaster, EventStream, Result, TrackerConfig, TrackerError, TrackerEvent};

/// 提交跟踪器：负责发起提交并为每次提交启动独立的轮询任务。
pub struct SubmissionTracker {
    config: Arc<TrackerConfig>,
    api: Arc<dyn JudgeApi>,
    event_broadcaster: Arc<EventBroadcaster>,
    trackers: Arc<RwLock<HashMap<TrackerId, TrackerHandle>>>,
}

impl SubmissionTracker {
    /// 使用给定的判题 API 实现创建跟踪器。
    pub fn new(config: TrackerConfig, api: Arc<dyn JudgeApi>) -> Result<Self> {
        config.validate()?;

        info!(
            base_url = %config.api.base_url,
            poll_interval_ms = config.polling.interval_ms,
            max_poll_duration_secs = config.polling.max_duration_secs,
            "initializing submission tracker"
        );

        let event_broadcaster = Arc::new(EventBroadcaster::new(config.event_buffer_size));

        Ok(Self {
            config: Arc::new(config),
            api,
            event_broadcaster,
            trackers: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// 使用基于 HTTP 的判题 API 客户端创建跟踪器。
    pub fn from_config(config: TrackerConfig) -> Result<Self> {
        let client = HttpJudgeClient::new(&config.api)?;
        Self::new(config, Arc::new(client))
    }

    /// 校验参数并提交代码，成功后开始轮询。
    ///
    /// 参数无效时不会发出任何网络请求；提交请求只发出一次，失败不会重试。
    #[tracing::instrument(skip(self, code), fields(code_len = code.len()))]
    pub async fn start(
        &self,
        problem_slug: &str,
        code: &str,
        language: &str,
    ) -> Result<TrackerHandle> {
        let request = SubmissionRequest::new(problem_slug, code, language)?;
        self.start_request(request).await
    }

    /// 提交已校验的请求，成功后开始轮询。
    #[tracing::instrument(skip_all, fields(problem = %request.problem.as_str()))]
    pub async fn start_request(&self, request: SubmissionRequest) -> Result<TrackerHandle> {
        info!(language = %request.language, "submitting solution");

        let receipt = self.api.submit(&request).await.map_err(|err| {
            warn!(error = %err, "submit failed");
            TrackerError::Submit(err)
        })?;

        let handle = TrackerHandle::new(
            receipt.id.clone(),
            &receipt.verdict,
            self.event_broadcaster.clone(),
        );
        let started = Instant::now();

        info!(
            tracker_id = %handle.id(),
            submission_id = %receipt.id,
            verdict = %receipt.verdict,
            "submission accepted, polling for verdict"
        );

        self.trackers.write().await.insert(handle.id(), handle.clone());
        self.event_broadcaster.emit(TrackerEvent::Submitted {
            tracker_id: handle.id(),
            submission_id: receipt.id,
            message: receipt.message,
        });

        let shared = handle.shared();
        let api = Arc::clone(&self.api);
        let event_broadcaster = Arc::clone(&self.event_broadcaster);
        let trackers = Arc::clone(&self.trackers);
        let polling = self.config.polling;
        tokio::spawn(async move {
            let tracker_id = shared.tracker_id;
            poller::run(shared, api, event_broadcaster, polling, started).await;
            trackers.write().await.remove(&tracker_id);
        });

        Ok(handle)
    }

    /// 取消指定跟踪器，返回本次调用是否真正执行了取消。
    pub fn cancel(&self, handle: &TrackerHandle) -> bool {
        handle.cancel()
    }

    /// 按 ID 取消仍在轮询中的跟踪器。
    pub async fn cancel_by_id(&self, tracker_id: &TrackerId) -> Result<bool> {
        let handle = self
            .get(tracker_id)
            .await
            .ok_or_else(|| TrackerError::TrackerNotFound(tracker_id.to_string()))?;
        Ok(handle.cancel())
    }

    /// 取消所有仍在轮询中的跟踪器（例如页面离开时），返回取消的数量。
    pub async fn cancel_all(&self) -> usize {
        let handles = self.active_trackers().await;
        let cancelled = handles.iter().filter(|handle| handle.cancel()).count();
        if cancelled > 0 {
            info!(cancelled, "cancelled active trackers");
        }
        cancelled
    }

    /// 查询仍在轮询中的跟踪器。
    pub async fn get(&self, tracker_id: &TrackerId) -> Option<TrackerHandle> {
        let trackers = self.trackers.read().await;
        trackers.get(tracker_id).cloned()
    }

    /// 列出仍在轮询中的跟踪器。
    pub async fn active_trackers(&self) -> Vec<TrackerHandle> {
        let trackers = self.trackers.read().await;
        trackers.values().cloned().collect()
    }

    /// 订阅事件流。
    pub fn subscribe_events(&self) -> EventStream {
        self.event_broadcaster.subscribe()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
