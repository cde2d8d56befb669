//! Run state machine.
//!
//! A run's snapshot is derived entirely from the events it emits, plus the
//! cancellation outcome that only the task driving the run can observe.

use chrono::Utc;
use rf_protocol::{EventKind, RunSnapshot, RunStatus, StageEvent};
use uuid::Uuid;

/// Create a snapshot for a run that has not emitted anything yet.
pub fn create_run(id: Uuid) -> RunSnapshot {
    RunSnapshot {
        id,
        status: RunStatus::Pending,
        progress: 0,
        status_text: String::new(),
        video_id: None,
        error: None,
        started_at: Utc::now(),
        finished_at: None,
    }
}

/// Fold one progress event into the snapshot.
///
/// Events arriving after the run finished are ignored.
pub fn apply_event(run: &mut RunSnapshot, event: &StageEvent) {
    if run.status.is_finished() {
        return;
    }

    run.progress = run.progress.max(event.progress);
    run.status_text = event.status.clone();

    match &event.kind {
        EventKind::InProgress => run.status = RunStatus::Running,
        EventKind::Complete { video_id } => {
            run.status = RunStatus::Completed;
            run.video_id = Some(video_id.to_string());
            run.finished_at = Some(Utc::now());
        }
        EventKind::Error { message } => {
            run.status = RunStatus::Failed;
            run.error = Some(message.clone());
            run.finished_at = Some(Utc::now());
        }
    }
}

/// Record that the run ended because it was cancelled.
pub fn mark_cancelled(run: &mut RunSnapshot) {
    if run.status == RunStatus::Completed {
        return;
    }
    run.status = RunStatus::Cancelled;
    if run.finished_at.is_none() {
        run.finished_at = Some(Utc::now());
    }
}
