//! Structured progress events.
//!
//! The retry engine and queue report progress on a plain channel instead of
//! threading status callbacks through every layer. Callers that do not care
//! simply pass no sender; callers that do get both a human-readable line and
//! a 0–100 figure for progress bars.

use std::time::Duration;

use tokio::sync::mpsc;

/// Where progress events are delivered. Send errors are ignored: a caller
/// that dropped its receiver has opted out of progress.
pub type ProgressSink = mpsc::UnboundedSender<ProgressEvent>;

/// One step in the life of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Waiting in a class queue behind `position` earlier submissions.
    Queued { class: String, position: usize },
    /// About to perform attempt `attempt` of `max_attempts`.
    Attempting { attempt: u32, max_attempts: u32, endpoint: String },
    /// Attempt failed retryably; sleeping `delay` before the next one.
    Backoff { attempt: u32, max_attempts: u32, delay: Duration },
    /// Terminal success.
    Completed,
    /// Terminal failure, after classification.
    Failed { message: String },
}

impl ProgressEvent {
    /// Rough completion figure, 0–100.
    pub fn percent(&self) -> u8 {
        match self {
            Self::Queued { .. } => 0,
            Self::Attempting { attempt, max_attempts, .. }
            | Self::Backoff { attempt, max_attempts, .. } => {
                if *max_attempts == 0 {
                    0
                } else {
                    ((attempt * 100) / max_attempts).min(99) as u8
                }
            }
            Self::Completed | Self::Failed { .. } => 100,
        }
    }
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued { class, position } => {
                write!(f, "queued in '{class}' behind {position} operation(s)")
            }
            Self::Attempting { attempt, max_attempts, endpoint } => {
                write!(f, "attempt {}/{max_attempts} via {endpoint}", attempt + 1)
            }
            Self::Backoff { attempt, max_attempts, delay } => {
                write!(
                    f,
                    "attempt {}/{max_attempts} failed, retrying in {}s",
                    attempt + 1,
                    delay.as_secs()
                )
            }
            Self::Completed => write!(f, "completed"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// Emit an event if the caller supplied a sink.
pub(crate) fn emit(sink: Option<&ProgressSink>, event: ProgressEvent) {
    if let Some(sink) = sink {
        let _ = sink.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_tracks_attempts() {
        let e = ProgressEvent::Attempting { attempt: 6, max_attempts: 12, endpoint: "x".into() };
        assert_eq!(e.percent(), 50);
        assert_eq!(ProgressEvent::Completed.percent(), 100);
        assert_eq!(ProgressEvent::Queued { class: "c".into(), position: 2 }.percent(), 0);
    }

    #[test]
    fn percent_never_reports_done_early() {
        let e = ProgressEvent::Backoff {
            attempt: 11,
            max_attempts: 12,
            delay: Duration::from_secs(8),
        };
        assert!(e.percent() < 100);
    }

    #[test]
    fn display_is_human_readable() {
        let e = ProgressEvent::Backoff {
            attempt: 1,
            max_attempts: 12,
            delay: Duration::from_secs(16),
        };
        assert_eq!(e.to_string(), "attempt 2/12 failed, retrying in 16s");
    }
}
