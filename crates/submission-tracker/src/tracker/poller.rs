use std::sync::Arc;
use std::time::Duration;

use judge_watch_core::domain::{
    JudgeApi, JudgeApiError, Observation, SubmissionSnapshot, TrackerFailure,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{TrackerPhase, TrackerShared};
use crate::config::PollingConfig;
use crate::events::{EventBroadcaster, TrackerEvent};

/// 轮询循环：每个跟踪器一个任务，同一时刻最多一个在途请求。
///
/// 下一次轮询只在上一次请求结束后才开始计时；`started` 为提交成功的时刻，
/// 超过 `max_duration` 仍未得到最终结果时以超时结束。
#[tracing::instrument(
    skip_all,
    fields(tracker_id = %shared.tracker_id, submission_id = %shared.submission_id)
)]
pub(crate) async fn run(
    shared: Arc<TrackerShared>,
    api: Arc<dyn JudgeApi>,
    event_broadcaster: Arc<EventBroadcaster>,
    polling: PollingConfig,
    started: Instant,
) {
    let Some(deadline) = started.checked_add(polling.max_duration()) else {
        warn!("poll deadline is out of range, stopping tracker");
        fail_with_timeout(&shared, &event_broadcaster, started.elapsed());
        return;
    };

    loop {
        let wake_at = Instant::now()
            .checked_add(polling.interval())
            .map_or(deadline, |next| next.min(deadline));
        tokio::select! {
            _ = tokio::time::sleep_until(wake_at) => {}
            _ = shared.wake.notified() => {}
        }

        // 锁内检查通过即视为已发出；之后返回的 cancel() 不会阻止本次请求，只会丢弃其结果。
        let attempt = {
            let mut state = shared.lock();
            if state.phase != TrackerPhase::Polling {
                break;
            }
            state.polls += 1;
            state.polls
        };

        debug!(attempt, "polling submission");
        let result = tokio::time::timeout(
            polling.request_timeout(),
            api.get_submission(&shared.submission_id),
        )
        .await
        .unwrap_or(Err(JudgeApiError::Timeout));

        match result {
            Ok(snapshot) => {
                if !apply_snapshot(&shared, &event_broadcaster, &snapshot) {
                    break;
                }
            }
            Err(err) => {
                warn!(attempt, error = %err, "poll failed, retrying on next tick");
                if shared.lock().phase != TrackerPhase::Polling {
                    break;
                }
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= polling.max_duration() {
            fail_with_timeout(&shared, &event_broadcaster, elapsed);
            break;
        }
    }

    debug!("poll loop stopped");
}

/// 应用一次轮询结果，返回是否需要继续轮询。
fn apply_snapshot(
    shared: &TrackerShared,
    event_broadcaster: &EventBroadcaster,
    snapshot: &SubmissionSnapshot,
) -> bool {
    if snapshot.id != shared.submission_id {
        warn!(
            returned_id = %snapshot.id,
            "ignoring response for a different submission"
        );
        return true;
    }

    let (observation, phase, view) = {
        let mut state = shared.lock();
        if state.phase != TrackerPhase::Polling {
            debug!(phase = ?state.phase, "discarding response that arrived after tracking stopped");
            return false;
        }

        let floor = state.floor;
        let observation = state.view.observe_from(snapshot, floor);
        if state.view.is_terminal() {
            state.phase = TrackerPhase::Terminal;
        }
        (observation, state.phase, state.view.clone())
    };

    match observation {
        Observation::Changed => {
            debug!(verdict = %snapshot.verdict, "submission state changed");
            event_broadcaster.emit(TrackerEvent::StateChanged {
                tracker_id: shared.tracker_id,
                submission_id: shared.submission_id.clone(),
                state: view.clone(),
            });
        }
        Observation::Rejected => {
            debug!(verdict = %snapshot.verdict, "ignoring stale response");
        }
        Observation::Unchanged => {}
    }

    if phase != TrackerPhase::Terminal {
        return true;
    }

    info!(verdict = %snapshot.verdict, "judging finished");
    event_broadcaster.emit(TrackerEvent::Finished {
        tracker_id: shared.tracker_id,
        submission_id: shared.submission_id.clone(),
        phase,
        state: view,
    });
    shared.finished.notify_waiters();
    false
}

fn fail_with_timeout(
    shared: &TrackerShared,
    event_broadcaster: &EventBroadcaster,
    elapsed: Duration,
) {
    let (failure, view) = {
        let mut state = shared.lock();
        if state.phase != TrackerPhase::Polling {
            return;
        }
        let failure = TrackerFailure::timeout(elapsed, state.polls);
        state.view.fail(failure.clone());
        state.phase = TrackerPhase::Failed;
        (failure, state.view.clone())
    };

    warn!(error = %failure, "judging did not finish in time");
    event_broadcaster.emit(TrackerEvent::Finished {
        tracker_id: shared.tracker_id,
        submission_id: shared.submission_id.clone(),
        phase: TrackerPhase::Failed,
        state: view,
    });
    shared.finished.notify_waiters();
}
