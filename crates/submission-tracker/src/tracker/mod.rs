//! 提交跟踪模型与跟踪器管理模块。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use judge_watch_core::domain::{
    SubmissionId, SubmissionViewState, TrackerId, Verdict, VerdictStage,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::info;

use crate::events::{EventBroadcaster, TrackerEvent};

/// 跟踪器管理器实现。
pub mod manager;
mod poller;

/// 导出跟踪器管理器类型。
pub use manager::SubmissionTracker;

/// 跟踪器生命周期阶段。
///
/// 提交请求进行中的阶段即 `SubmissionTracker::start` 本身，
/// 句柄只在提交成功后返回，因此句柄的阶段从 `Polling` 开始。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPhase {
    /// 正在轮询判题结果。
    Polling,
    /// 已获得最终判题结果。
    Terminal,
    /// 已被调用方取消。
    Cancelled,
    /// 超过最长轮询时间仍未出结果。
    Failed,
}

impl TrackerPhase {
    /// 是否为吸收态（不再发生任何轮询）。
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Polling)
    }
}

/// 跟踪结束时的阶段与展示状态。
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerOutcome {
    /// 最终阶段。
    pub phase: TrackerPhase,
    /// 最终展示状态。
    pub state: SubmissionViewState,
}

#[derive(Debug)]
pub(crate) struct TrackerState {
    pub(crate) phase: TrackerPhase,
    pub(crate) view: SubmissionViewState,
    /// 提交回执已给出的阶段，轮询结果不得低于它。
    pub(crate) floor: VerdictStage,
    /// 通过锁内检查、已计为发出的轮询数。
    pub(crate) polls: u32,
}

/// 单个跟踪器的共享状态，由轮询任务与句柄持有。
#[derive(Debug)]
pub(crate) struct TrackerShared {
    pub(crate) tracker_id: TrackerId,
    pub(crate) submission_id: SubmissionId,
    state: Mutex<TrackerState>,
    /// 取消时唤醒正在等待下一次轮询的任务。
    pub(crate) wake: Notify,
    /// 进入吸收态时通知 `wait()` 的调用方。
    pub(crate) finished: Notify,
}

impl TrackerShared {
    fn new(submission_id: SubmissionId, receipt_verdict: &Verdict) -> Self {
        Self {
            tracker_id: TrackerId::new(),
            submission_id,
            state: Mutex::new(TrackerState {
                phase: TrackerPhase::Polling,
                view: SubmissionViewState::from_receipt_verdict(receipt_verdict),
                floor: receipt_verdict.stage(),
                polls: 0,
            }),
            wake: Notify::new(),
            finished: Notify::new(),
        }
    }

    /// 状态锁从不跨越 `.await` 持有。
    pub(crate) fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 单次提交的跟踪句柄。
///
/// 句柄可以自由克隆并在任意任务中使用；`current_state()` 与 `cancel()`
/// 都是同步调用，不会触发网络请求。
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    shared: Arc<TrackerShared>,
    event_broadcaster: Arc<EventBroadcaster>,
}

impl TrackerHandle {
    pub(crate) fn new(
        submission_id: SubmissionId,
        receipt_verdict: &Verdict,
        event_broadcaster: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            shared: Arc::new(TrackerShared::new(submission_id, receipt_verdict)),
            event_broadcaster,
        }
    }

    pub(crate) fn shared(&self) -> Arc<TrackerShared> {
        Arc::clone(&self.shared)
    }

    /// 跟踪器 ID。
    pub fn id(&self) -> TrackerId {
        self.shared.tracker_id
    }

    /// 后端分配的提交 ID。
    pub fn submission_id(&self) -> &SubmissionId {
        &self.shared.submission_id
    }

    /// 最近一次观测到的展示状态。
    pub fn current_state(&self) -> SubmissionViewState {
        self.shared.lock().view.clone()
    }

    /// 当前生命周期阶段。
    pub fn phase(&self) -> TrackerPhase {
        self.shared.lock().phase
    }

    /// 已发出的轮询请求数。
    ///
    /// 轮询在锁内通过阶段检查时即计为发出，请求随后在锁外发送。
    pub fn polls_dispatched(&self) -> u32 {
        self.shared.lock().polls
    }

    /// 已进入吸收态时返回最终结果。
    pub fn outcome(&self) -> Option<TrackerOutcome> {
        let state = self.shared.lock();
        state.phase.is_finished().then(|| TrackerOutcome {
            phase: state.phase,
            state: state.view.clone(),
        })
    }

    /// 取消跟踪。
    ///
    /// 幂等；返回本次调用是否真正执行了取消。返回后不会再有轮询通过锁内检查。
    /// 已通过检查的轮询（计入 `polls_dispatched()`）即使请求尚未发出也会继续完成，
    /// 但其结果会被丢弃。
    pub fn cancel(&self) -> bool {
        let last_state = {
            let mut state = self.shared.lock();
            if state.phase.is_finished() {
                return false;
            }
            state.phase = TrackerPhase::Cancelled;
            state.view.clone()
        };

        self.shared.wake.notify_one();
        self.shared.finished.notify_waiters();

        info!(
            tracker_id = %self.shared.tracker_id,
            submission_id = %self.shared.submission_id,
            "tracker cancelled"
        );
        self.event_broadcaster.emit(TrackerEvent::Finished {
            tracker_id: self.shared.tracker_id,
            submission_id: self.shared.submission_id.clone(),
            phase: TrackerPhase::Cancelled,
            state: last_state,
        });
        true
    }

    /// 等待跟踪进入吸收态（判题完成、取消或超时）。
    pub async fn wait(&self) -> TrackerOutcome {
        loop {
            let notified = self.shared.finished.notified();
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            notified.await;
        }
    }
}
