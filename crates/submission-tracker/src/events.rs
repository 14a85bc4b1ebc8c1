use anyhow::Result;
use judge_watch_core::domain::{SubmissionId, SubmissionViewState, TrackerId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::tracker::TrackerPhase;

/// 跟踪器对外广播的事件类型。
///
/// 单次轮询失败不会产生事件，只有累计超时才以 `Finished` 的形式对外可见。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// 提交成功，开始轮询。
    Submitted {
        /// 跟踪器 ID。
        tracker_id: TrackerId,
        /// 后端分配的提交 ID。
        submission_id: SubmissionId,
        /// 后端返回的提示信息。
        message: Option<String>,
    },
    /// 展示状态发生变化。
    StateChanged {
        /// 跟踪器 ID。
        tracker_id: TrackerId,
        /// 提交 ID。
        submission_id: SubmissionId,
        /// 新的展示状态。
        state: SubmissionViewState,
    },
    /// 跟踪结束（判题完成、取消或超时）。
    Finished {
        /// 跟踪器 ID。
        tracker_id: TrackerId,
        /// 提交 ID。
        submission_id: SubmissionId,
        /// 最终阶段。
        phase: TrackerPhase,
        /// 最终展示状态。
        state: SubmissionViewState,
    },
}

impl TrackerEvent {
    pub fn tracker_id(&self) -> TrackerId {
        match self {
            Self::Submitted { tracker_id, .. }
            | Self::StateChanged { tracker_id, .. }
            | Self::Finished { tracker_id, .. } => *tracker_id,
        }
    }
}

/// 基于 `tokio::broadcast` 的事件广播器。
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<TrackerEvent>,
}

impl EventBroadcaster {
    /// 创建事件广播器。
    ///
    /// `capacity` 表示内部广播队列容量。
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 广播一个事件，没有订阅者时直接丢弃。
    pub fn emit(&self, event: TrackerEvent) {
        let _ = self.sender.send(event);
    }

    /// 订阅事件流。
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 事件接收流包装器。
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<TrackerEvent>,
}

impl EventStream {
    /// 异步接收下一条事件。
    pub async fn recv(&mut self) -> Result<TrackerEvent> {
        Ok(self.receiver.recv().await?)
    }

    /// 非阻塞尝试接收一条事件。
    pub fn try_recv(&mut self) -> Result<TrackerEvent> {
        Ok(self.receiver.try_recv()?)
    }
}
