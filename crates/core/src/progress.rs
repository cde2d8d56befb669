//! Per-run progress feed.
//!
//! One producer (the run) and at most one consumer (the client stream).
//! The producer never waits on the consumer: the buffer is sized to hold
//! every event a run can emit, and once the consumer is gone events are
//! dropped so the run can finish its work regardless.

use rf_protocol::{ArtifactId, Stage, StageEvent};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Upper bound on events from a single run: one per stage, including the
/// terminal one.
pub const MAX_EVENTS_PER_RUN: usize = Stage::ALL.len();

/// Create a progress feed.
///
/// `capacity` is raised to [`MAX_EVENTS_PER_RUN`] if smaller.
pub fn progress_channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(MAX_EVENTS_PER_RUN));
    (
        ProgressSender {
            tx,
            last_progress: 0,
            finished: false,
            consumer_gone: false,
        },
        ProgressReceiver { rx },
    )
}

/// Producer half, owned by exactly one run.
#[derive(Debug)]
pub struct ProgressSender {
    tx: mpsc::Sender<StageEvent>,
    last_progress: u8,
    finished: bool,
    consumer_gone: bool,
}

impl ProgressSender {
    /// Emit `event`.
    ///
    /// Progress is raised to the last value emitted so the feed never goes
    /// backwards. Returns `false` if the event was ignored because a terminal
    /// event was already emitted.
    pub fn emit(&mut self, mut event: StageEvent) -> bool {
        if self.finished {
            debug!(status = %event.status, "Ignoring event after terminal event");
            return false;
        }

        event.progress = event.progress.clamp(self.last_progress, 100);
        self.last_progress = event.progress;
        self.finished = event.is_terminal();

        if self.consumer_gone {
            return true;
        }

        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Closed(_)) => {
                debug!("Progress consumer disconnected; continuing without it");
                self.consumer_gone = true;
            }
            Err(TrySendError::Full(event)) => {
                warn!(status = %event.status, "Progress buffer full; dropping event");
            }
        }
        true
    }

    /// Announce that `stage` is starting.
    pub fn stage(&mut self, stage: Stage) -> bool {
        self.emit(StageEvent::stage(stage))
    }

    /// Terminal failure at the last progress reached.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        self.emit(StageEvent::error(self.last_progress, message))
    }

    /// Terminal success.
    pub fn complete(&mut self, video_id: ArtifactId) -> bool {
        self.emit(StageEvent::complete(video_id))
    }

    pub fn last_progress(&self) -> u8 {
        self.last_progress
    }

    /// Whether a terminal event has been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.consumer_gone || self.tx.is_closed()
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::Receiver<StageEvent>,
}

impl ProgressReceiver {
    /// Next event, or `None` once the producer is gone and the buffer drained.
    pub async fn recv(&mut self) -> Option<StageEvent> {
        self.rx.recv().await
    }

    /// Every event until the producer is gone.
    pub async fn collect(mut self) -> Vec<StageEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }

    pub fn into_stream(self) -> ReceiverStream<StageEvent> {
        ReceiverStream::new(self.rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_protocol::EventKind;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (mut tx, rx) = progress_channel(4);
        tx.stage(Stage::Voiceover);
        tx.stage(Stage::SourceSearch);
        tx.complete(ArtifactId::generate());
        drop(tx);

        let events = rx.collect().await;
        let progress: Vec<u8> = events.iter().map(|e| e.progress).collect();
        assert_eq!(progress, vec![10, 30, 100]);
        assert!(events[2].is_terminal());
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let (mut tx, rx) = progress_channel(8);
        tx.stage(Stage::SubtitleGeneration);
        tx.stage(Stage::Voiceover);
        drop(tx);

        let events = rx.collect().await;
        assert_eq!(events[1].progress, 60);
    }

    #[tokio::test]
    async fn test_failure_repeats_last_progress() {
        let (mut tx, rx) = progress_channel(8);
        tx.stage(Stage::Voiceover);
        tx.stage(Stage::SourceSearch);
        tx.fail("No videos found for that query.");
        drop(tx);

        let events = rx.collect().await;
        let last = events.last().unwrap();
        assert_eq!(last.progress, 30);
        assert_eq!(last.status, "Failed");
        assert!(matches!(last.kind, EventKind::Error { .. }));
    }

    #[tokio::test]
    async fn test_nothing_after_terminal_event() {
        let (mut tx, rx) = progress_channel(8);
        assert!(tx.fail("boom"));
        assert!(!tx.stage(Stage::Composition));
        assert!(!tx.complete(ArtifactId::generate()));
        assert!(tx.is_finished());
        drop(tx);

        assert_eq!(rx.collect().await.len(), 1);
    }

    #[test]
    fn test_dropped_consumer_does_not_block() {
        let (mut tx, rx) = progress_channel(1);
        drop(rx);

        for stage in Stage::ALL {
            tx.stage(stage);
        }
        assert!(tx.is_closed());
        assert_eq!(tx.last_progress(), 100);
    }

    #[tokio::test]
    async fn test_capacity_covers_a_full_run() {
        let (mut tx, rx) = progress_channel(1);
        for stage in &Stage::ALL[..Stage::ALL.len() - 1] {
            tx.stage(*stage);
        }
        tx.complete(ArtifactId::generate());
        drop(tx);

        assert_eq!(rx.collect().await.len(), MAX_EVENTS_PER_RUN);
    }
}
