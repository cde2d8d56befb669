//! Custom assertion helpers for progress feeds.

use rf_protocol::{EventKind, StageEvent};

/// Assert the feed ends in exactly one terminal event, and only at the end.
pub fn assert_single_terminal(events: &[StageEvent]) {
    assert!(!events.is_empty(), "Event sequence is empty");

    let terminal: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_terminal())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(
        terminal,
        vec![events.len() - 1],
        "Expected a single terminal event at the end, got: {events:?}"
    );
}

/// Assert progress stays within 0..=100 and never decreases.
pub fn assert_monotonic_progress(events: &[StageEvent]) {
    let mut last = 0;
    for event in events {
        assert!(event.progress <= 100, "Progress out of range: {event:?}");
        assert!(
            event.progress >= last,
            "Progress went backwards from {last}: {event:?}"
        );
        last = event.progress;
    }
}

pub fn progress_values(events: &[StageEvent]) -> Vec<u8> {
    events.iter().map(|e| e.progress).collect()
}

pub fn statuses(events: &[StageEvent]) -> Vec<&str> {
    events.iter().map(|e| e.status.as_str()).collect()
}

/// Message of the terminal error event, if the feed ended in failure.
pub fn terminal_error(events: &[StageEvent]) -> Option<&str> {
    match &events.last()?.kind {
        EventKind::Error { message } => Some(message),
        _ => None,
    }
}
