pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod tracker;

pub use client::HttpJudgeClient;
pub use config::{ApiConfig, PollingConfig, TrackerConfig};
pub use error::{Result, TrackerError};
pub use events::{EventBroadcaster, EventStream, TrackerEvent};
pub use tracker::{SubmissionTracker, TrackerHandle, TrackerOutcome, TrackerPhase};
