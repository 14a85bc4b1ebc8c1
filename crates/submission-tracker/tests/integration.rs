mod common;

use std::time::Duration;

use common::{FakeJudge, PollReply};
use judge_watch_core::domain::{
    JudgeApiError, SubmissionId, SubmissionViewState, SubmitReceipt, TrackerFailure, TrackerId,
    Verdict,
};
use submission_tracker::{
    EventStream, SubmissionTracker, TrackerConfig, TrackerError, TrackerEvent, TrackerPhase,
};

fn tracker(judge: &FakeJudge) -> SubmissionTracker {
    SubmissionTracker::new(common::test_config(), judge.clone().into_api())
        .expect("tracker should initialize")
}

fn drain(events: &mut EventStream) -> Vec<TrackerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[test]
fn test_config_parsing() {
    let config = TrackerConfig::from_str(
        r#"
event_buffer_size = 32

[api]
base_url = "http://localhost:8080/api"
access_token = "secret"

[polling]
interval_ms = 500
"#,
    )
    .expect("config should parse");

    assert_eq!(config.event_buffer_size, 32);
    assert_eq!(config.api.access_token.as_deref(), Some("secret"));
    assert_eq!(config.polling.interval(), Duration::from_millis(500));
    assert_eq!(config.polling.max_duration(), Duration::from_secs(300));
}

#[test]
fn test_invalid_config_is_rejected_by_tracker() {
    let mut config = common::test_config();
    config.polling.max_duration_secs = 0;

    let result = SubmissionTracker::new(config, FakeJudge::new().into_api());
    assert!(matches!(result, Err(TrackerError::Config(_))));
}

#[test]
fn test_out_of_range_poll_duration_is_rejected_by_tracker() {
    let mut config = common::test_config();
    config.polling.interval_ms = 10;
    config.polling.max_duration_secs = u64::MAX;

    let result = SubmissionTracker::new(config, FakeJudge::new().into_api());
    assert!(matches!(result, Err(TrackerError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_tracks_submission_until_accepted() {
    let judge = FakeJudge::new().with_replies([
        PollReply::verdict("QUEUED"),
        PollReply::verdict("QUEUED"),
        PollReply::verdict("JUDGING"),
        PollReply::snapshot(common::accepted_snapshot(5)),
    ]);
    let tracker = tracker(&judge);
    let mut events = tracker.subscribe_events();

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");
    assert_eq!(handle.submission_id().as_str(), common::SUBMISSION_ID);

    let outcome = handle.wait().await;
    assert_eq!(outcome.phase, TrackerPhase::Terminal);
    assert!(outcome.state.is_accepted());
    match &outcome.state {
        SubmissionViewState::Terminal { metrics, .. } => assert_eq!(metrics.tests_passed, 5),
        other => panic!("expected terminal state, got {other:?}"),
    }

    assert_eq!(judge.submit_calls(), 1);
    assert_eq!(judge.poll_calls(), 4);
    assert_eq!(handle.polls_dispatched(), 4);

    let request = judge.last_request().expect("submit should record request");
    assert_eq!(request.problem.as_str(), "two-sum");
    assert_eq!(request.language.as_str(), "python");

    let events = drain(&mut events);
    assert!(matches!(events[0], TrackerEvent::Submitted { .. }));
    let changes: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            TrackerEvent::StateChanged { state, .. } => state.verdict().cloned(),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![Verdict::Judging, Verdict::Accepted]);
    assert!(matches!(
        events.last(),
        Some(TrackerEvent::Finished {
            phase: TrackerPhase::Terminal,
            ..
        })
    ));

    advance(Duration::from_secs(5)).await;
    assert_eq!(judge.poll_calls(), 4, "no polls after a terminal verdict");
}

#[tokio::test(start_paused = true)]
async fn test_blank_code_is_rejected_without_network_calls() {
    let judge = FakeJudge::new();
    let tracker = tracker(&judge);

    let err = tracker
        .start("two-sum", "   \n", "python")
        .await
        .expect_err("blank code should be rejected");
    assert!(err.is_validation());

    let err = tracker
        .start("", "print(1)", "python")
        .await
        .expect_err("blank problem should be rejected");
    assert!(err.is_validation());

    advance(Duration::from_secs(3)).await;
    assert_eq!(judge.submit_calls(), 0);
    assert_eq!(judge.poll_calls(), 0);
    assert!(tracker.active_trackers().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_submit_failure_is_not_retried() {
    let judge = FakeJudge::new().with_submit_result(Err(JudgeApiError::Status {
        status: 500,
        message: "database unavailable".to_string(),
    }));
    let tracker = tracker(&judge);

    let err = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect_err("submit should fail");
    match err {
        TrackerError::Submit(source) => assert_eq!(source.status(), Some(500)),
        other => panic!("expected submit error, got {other:?}"),
    }

    advance(Duration::from_secs(3)).await;
    assert_eq!(judge.submit_calls(), 1);
    assert_eq!(judge.poll_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_verdict_does_not_regress_state() {
    let judge = FakeJudge::new()
        .with_replies([PollReply::verdict("JUDGING"), PollReply::verdict("QUEUED")])
        .with_fallback(PollReply::verdict("QUEUED"));
    let tracker = tracker(&judge);

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    advance(Duration::from_millis(3500)).await;
    assert_eq!(judge.poll_calls(), 3);
    assert_eq!(handle.current_state().verdict(), Some(&Verdict::Judging));
    assert_eq!(handle.phase(), TrackerPhase::Polling);

    assert!(handle.cancel());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_first_poll_issues_no_requests() {
    let judge = FakeJudge::new();
    let tracker = tracker(&judge);

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");
    assert!(handle.cancel());

    advance(Duration::from_secs(10)).await;
    assert_eq!(judge.poll_calls(), 0);
    assert_eq!(handle.polls_dispatched(), 0);

    let outcome = handle.wait().await;
    assert_eq!(outcome.phase, TrackerPhase::Cancelled);
    assert_eq!(outcome.state.verdict(), Some(&Verdict::Queued));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling_and_is_idempotent() {
    let judge = FakeJudge::new().with_fallback(PollReply::verdict("JUDGING"));
    let tracker = tracker(&judge);
    let mut events = tracker.subscribe_events();

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    advance(Duration::from_millis(2500)).await;
    let polls_at_cancel = judge.poll_calls();
    assert_eq!(polls_at_cancel, 2);

    assert!(tracker.cancel(&handle));
    assert!(!tracker.cancel(&handle));
    assert!(!handle.cancel());

    advance(Duration::from_secs(10)).await;
    assert_eq!(judge.poll_calls(), polls_at_cancel);
    assert_eq!(handle.current_state().verdict(), Some(&Verdict::Judging));

    let finished = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, TrackerEvent::Finished { .. }))
        .count();
    assert_eq!(finished, 1);
}

#[tokio::test(start_paused = true)]
async fn test_response_in_flight_during_cancel_is_discarded() {
    let judge = FakeJudge::new().with_replies([PollReply::snapshot(common::accepted_snapshot(3))
        .delayed(Duration::from_millis(500))]);
    let tracker = tracker(&judge);

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    advance(Duration::from_millis(1200)).await;
    assert_eq!(judge.poll_calls(), 1, "first poll should be in flight");
    assert!(handle.cancel());

    advance(Duration::from_secs(2)).await;
    assert_eq!(handle.phase(), TrackerPhase::Cancelled);
    assert_eq!(handle.current_state().verdict(), Some(&Verdict::Queued));
    assert_eq!(judge.poll_calls(), 1);
    assert_eq!(handle.polls_dispatched(), judge.poll_calls());
}

#[tokio::test(start_paused = true)]
async fn test_times_out_after_max_duration_of_failed_polls() {
    let judge = FakeJudge::new()
        .with_fallback(PollReply::error(JudgeApiError::Transport("connection refused".into())));
    let tracker = tracker(&judge);
    let mut events = tracker.subscribe_events();

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    let outcome = handle.wait().await;
    assert_eq!(outcome.phase, TrackerPhase::Failed);
    match &outcome.state {
        SubmissionViewState::Failed(TrackerFailure::Timeout { polls, elapsed_ms }) => {
            assert_eq!(*polls, 300);
            assert!(*elapsed_ms >= 300_000);
        }
        other => panic!("expected timeout failure, got {other:?}"),
    }
    assert_eq!(judge.poll_calls(), 300);

    advance(Duration::from_secs(10)).await;
    assert_eq!(judge.poll_calls(), 300);

    let events = drain(&mut events);
    let finished: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, TrackerEvent::Finished { .. }))
        .collect();
    assert_eq!(finished.len(), 1);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, TrackerEvent::StateChanged { .. })),
        "failed polls should not emit state changes"
    );
    assert!(!handle.cancel(), "cancel after timeout is a no-op");
}

#[tokio::test(start_paused = true)]
async fn test_transient_poll_failures_are_retried() {
    let judge = FakeJudge::new().with_replies([
        PollReply::error(JudgeApiError::Transport("connection reset".into())),
        PollReply::verdict("JUDGING"),
        PollReply::error(JudgeApiError::Status {
            status: 502,
            message: "bad gateway".into(),
        }),
        PollReply::snapshot(common::accepted_snapshot(2)),
    ]);
    let tracker = tracker(&judge);

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    let outcome = handle.wait().await;
    assert_eq!(outcome.phase, TrackerPhase::Terminal);
    assert_eq!(judge.poll_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_slow_poll_counts_as_missed_tick() {
    let judge = FakeJudge::new().with_replies([
        PollReply::verdict("JUDGING").delayed(Duration::from_secs(30)),
        PollReply::snapshot(common::accepted_snapshot(1)),
    ]);
    let tracker = tracker(&judge);

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    let outcome = handle.wait().await;
    assert_eq!(outcome.phase, TrackerPhase::Terminal);
    assert_eq!(handle.polls_dispatched(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_receipt_still_fetches_full_result() {
    let judge = FakeJudge::new()
        .with_submit_result(Ok(SubmitReceipt {
            id: common::submission_id(),
            verdict: Verdict::CompileError,
            message: None,
        }))
        .with_fallback(PollReply::verdict("CE"));
    let tracker = tracker(&judge);

    let handle = tracker
        .start("two-sum", "print(", "python")
        .await
        .expect("submission should be accepted");
    assert_eq!(handle.current_state(), SubmissionViewState::Pending);

    let outcome = handle.wait().await;
    assert_eq!(outcome.phase, TrackerPhase::Terminal);
    assert_eq!(outcome.state.verdict(), Some(&Verdict::CompileError));
    assert!(!outcome.state.is_accepted());
    assert_eq!(judge.poll_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_response_for_other_submission_is_ignored() {
    let mut foreign = common::accepted_snapshot(5);
    foreign.id = SubmissionId::new("99").expect("id should be valid");
    let judge = FakeJudge::new()
        .with_replies([PollReply::snapshot(foreign)])
        .with_fallback(PollReply::verdict("JUDGING"));
    let tracker = tracker(&judge);

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    advance(Duration::from_millis(2500)).await;
    assert_eq!(handle.phase(), TrackerPhase::Polling);
    assert_eq!(handle.current_state().verdict(), Some(&Verdict::Judging));
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_registry_tracks_active_trackers() {
    let judge = FakeJudge::new();
    let tracker = tracker(&judge);

    let first = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");
    let second = tracker
        .start("three-sum", "print(2)", "rust")
        .await
        .expect("submission should be accepted");

    assert_eq!(tracker.active_trackers().await.len(), 2);
    assert!(tracker.get(&first.id()).await.is_some());

    let cancelled = tracker
        .cancel_by_id(&first.id())
        .await
        .expect("tracker should be registered");
    assert!(cancelled);

    assert_eq!(tracker.cancel_all().await, 1);
    assert_eq!(second.phase(), TrackerPhase::Cancelled);

    advance(Duration::from_millis(10)).await;
    assert!(tracker.active_trackers().await.is_empty());

    let err = tracker
        .cancel_by_id(&TrackerId::new())
        .await
        .expect_err("unknown tracker should be reported");
    assert!(matches!(err, TrackerError::TrackerNotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_fast_polling_config_is_honored() {
    let judge = FakeJudge::new().with_fallback(PollReply::verdict("JUDGING"));
    let mut config = common::test_config();
    config.polling = common::fast_polling();
    let tracker = SubmissionTracker::new(config, judge.clone().into_api())
        .expect("tracker should initialize");

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    let outcome = handle.wait().await;
    assert_eq!(outcome.phase, TrackerPhase::Failed);
    assert_eq!(judge.poll_calls(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_receipt_is_not_regressed_by_stale_poll() {
    let judge = FakeJudge::new()
        .with_submit_result(Ok(SubmitReceipt {
            id: common::submission_id(),
            verdict: Verdict::Accepted,
            message: None,
        }))
        .with_replies([PollReply::verdict("QUEUED"), PollReply::verdict("JUDGING")])
        .with_fallback(PollReply::snapshot(common::accepted_snapshot(4)));
    let tracker = tracker(&judge);
    let mut events = tracker.subscribe_events();

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    advance(Duration::from_millis(2500)).await;
    assert_eq!(judge.poll_calls(), 2);
    assert_eq!(handle.current_state(), SubmissionViewState::Pending);

    let outcome = handle.wait().await;
    assert_eq!(outcome.phase, TrackerPhase::Terminal);
    assert!(outcome.state.is_accepted());
    assert_eq!(judge.poll_calls(), 3);

    let changes = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, TrackerEvent::StateChanged { .. }))
        .count();
    assert_eq!(changes, 1, "only the terminal snapshot changes the view");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_racing_dispatch_only_discards_result() {
    let judge = FakeJudge::new().with_fallback(
        PollReply::snapshot(common::accepted_snapshot(1)).delayed(Duration::from_millis(1)),
    );
    let tracker = tracker(&judge);

    let handle = tracker
        .start("two-sum", "print(1)", "python")
        .await
        .expect("submission should be accepted");

    advance(Duration::from_millis(1000)).await;
    tokio::task::yield_now().await;
    assert!(handle.cancel());
    let dispatched = handle.polls_dispatched();

    advance(Duration::from_secs(5)).await;
    assert_eq!(judge.poll_calls(), dispatched);
    assert_eq!(handle.phase(), TrackerPhase::Cancelled);
    assert!(!handle.current_state().is_terminal());
}
