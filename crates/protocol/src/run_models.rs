//! Runtime run state models.
//!
//! This module defines the structures for tracking the state of in-flight
//! and finished pipeline runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Represents the current lifecycle status of a pipeline run.
///
/// The status progresses through these states during normal execution:
/// Pending -> Running -> Completed
///
/// Terminal alternatives:
/// - Failed: a stage raised an error
/// - Cancelled: the run's cancellation token fired
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Run has been registered but its task has not emitted anything yet.
    Pending,

    /// Run is executing its stages.
    Running,

    /// Run published an artifact.
    Completed,

    /// Run stopped on a stage error.
    Failed,

    /// Run was cancelled before finishing.
    Cancelled,
}

impl RunStatus {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// Point-in-time view of one pipeline run.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    /// Unique identifier for this run.
    #[ts(type = "string")]
    pub id: Uuid,

    /// Current execution status.
    pub status: RunStatus,

    /// Last progress value observed.
    pub progress: u8,

    /// Last status text observed.
    pub status_text: String,

    /// Published artifact, once completed.
    #[ts(optional)]
    pub video_id: Option<String>,

    /// Failure message, once failed or cancelled.
    #[ts(optional)]
    pub error: Option<String>,

    #[ts(type = "string")]
    pub started_at: DateTime<Utc>,

    #[ts(optional, type = "string")]
    pub finished_at: Option<DateTime<Utc>>,
}
