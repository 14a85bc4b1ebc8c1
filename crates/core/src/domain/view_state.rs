use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{SubmissionMetrics, SubmissionSnapshot, TestCaseResult, Verdict, VerdictStage};

/// Why tracking stopped without a verdict.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackerFailure {
    #[error("still processing after {elapsed_ms} ms ({polls} polls), check back later")]
    Timeout { elapsed_ms: u64, polls: u32 },
}

impl TrackerFailure {
    pub fn timeout(elapsed: Duration, polls: u32) -> Self {
        Self::Timeout {
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            polls,
        }
    }
}

/// The latest known state of a tracked submission, as shown to a user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionViewState {
    /// Submitted, no usable verdict observed yet.
    #[default]
    Pending,
    InProgress {
        verdict: Verdict,
        metrics: SubmissionMetrics,
    },
    Terminal {
        verdict: Verdict,
        metrics: SubmissionMetrics,
        test_results: Vec<TestCaseResult>,
    },
    Failed(TrackerFailure),
}

/// Outcome of offering a snapshot to [`SubmissionViewState::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Changed,
    Unchanged,
    /// Stale (less advanced than what is held) or arrived after a final state.
    Rejected,
}

impl SubmissionViewState {
    /// Initial state from the verdict returned by the submit call.
    ///
    /// A terminal verdict on the receipt carries no metrics or test results,
    /// so it is left `Pending` and the first poll fetches the full resource.
    pub fn from_receipt_verdict(verdict: &Verdict) -> Self {
        if verdict.is_terminal() {
            Self::Pending
        } else {
            Self::InProgress {
                verdict: verdict.clone(),
                metrics: SubmissionMetrics::default(),
            }
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Self::InProgress { verdict, .. } | Self::Terminal { verdict, .. } => Some(verdict),
            Self::Pending | Self::Failed(_) => None,
        }
    }

    pub fn stage(&self) -> Option<VerdictStage> {
        self.verdict().map(Verdict::stage)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }

    /// Terminal or failed: nothing will change this state any more.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Terminal { .. } | Self::Failed(_))
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Terminal { verdict, .. } if verdict.is_accepted())
    }

    /// Applies `snapshot` unless it would move the verdict backwards.
    ///
    /// Equal-stage snapshots are applied so in-progress metrics stay fresh.
    /// Final states absorb every later snapshot.
    pub fn observe(&mut self, snapshot: &SubmissionSnapshot) -> Observation {
        if self.is_final() {
            return Observation::Rejected;
        }

        if let Some(current) = self.stage() {
            if snapshot.verdict.stage() < current {
                return Observation::Rejected;
            }
        }

        let next = if snapshot.verdict.is_terminal() {
            Self::Terminal {
                verdict: snapshot.verdict.clone(),
                metrics: snapshot.metrics,
                test_results: snapshot.test_results.clone(),
            }
        } else {
            Self::InProgress {
                verdict: snapshot.verdict.clone(),
                metrics: snapshot.metrics,
            }
        };

        if *self == next {
            Observation::Unchanged
        } else {
            *self = next;
            Observation::Changed
        }
    }

    /// Like [`observe`](Self::observe), but also rejects snapshots below `floor`.
    ///
    /// `floor` is the stage already known from outside the view, such as a
    /// terminal verdict on the submit receipt while the view is still `Pending`.
    pub fn observe_from(
        &mut self,
        snapshot: &SubmissionSnapshot,
        floor: VerdictStage,
    ) -> Observation {
        if snapshot.verdict.stage() < floor {
            return Observation::Rejected;
        }
        self.observe(snapshot)
    }

    /// Moves to `Failed` unless already final. Returns whether it did.
    pub fn fail(&mut self, failure: TrackerFailure) -> bool {
        if self.is_final() {
            return false;
        }
        *self = Self::Failed(failure);
        true
    }
}
