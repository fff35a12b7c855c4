use thiserror::Error;

use super::ExtractionError;

/// Something the pipeline tells the outside world while a run advances.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started {
        index: usize,
        total: usize,
        name: String,
    },
    Finished {
        index: usize,
        total: usize,
        output_name: String,
    },
    Failed {
        index: usize,
        total: usize,
        name: String,
        reason: ExtractionError,
    },
    /// Terminal success: every document was attempted.
    Completed { written: usize, failed: usize },
    /// Terminal failure: the run stopped early.
    Aborted { message: String },
}

impl ProgressEvent {
    /// Share of the run done once this event has been handled, if the event moves it.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            ProgressEvent::Finished { index, total, .. }
            | ProgressEvent::Failed { index, total, .. } => {
                Some((index + 1) as f64 / (*total).max(1) as f64)
            }
            ProgressEvent::Completed { .. } => Some(1.0),
            _ => None,
        }
    }

    /// Human-readable status line.
    pub fn status_text(&self) -> String {
        match self {
            ProgressEvent::Started { index, total, name } => {
                format!("Processing {} ({} of {})", name, index + 1, total)
            }
            ProgressEvent::Finished { output_name, .. } => format!("Wrote {}", output_name),
            ProgressEvent::Failed { name, reason, .. } => format!("{}: {}", name, reason),
            ProgressEvent::Completed { written, failed: 0 } => {
                format!("Done: {} document(s) written", written)
            }
            ProgressEvent::Completed { written, failed } => {
                format!("Done: {} document(s) written, {} failed", written, failed)
            }
            ProgressEvent::Aborted { message } => format!("Run failed: {}", message),
        }
    }
}

/// Receives progress for a run, in order.
pub trait ProgressReporter {
    fn report(&mut self, event: ProgressEvent);
}

/// Why a sink did not take a file.
#[derive(Debug, Error)]
pub enum SinkError {
    /// This file was turned away; the sink still accepts others.
    #[error("{0}")]
    Refused(String),

    /// The sink can no longer persist anything.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Takes finished output and persists or delivers it.
pub trait ByteSink {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let finished = ProgressEvent::Finished {
            index: 1,
            total: 4,
            output_name: "a_recortado.pdf".into(),
        };
        assert_eq!(finished.fraction(), Some(0.5));

        let failed = ProgressEvent::Failed {
            index: 3,
            total: 4,
            name: "d.pdf".into(),
            reason: ExtractionError::NoValidPages,
        };
        assert_eq!(failed.fraction(), Some(1.0));

        let started = ProgressEvent::Started {
            index: 0,
            total: 4,
            name: "a.pdf".into(),
        };
        assert_eq!(started.fraction(), None);
    }

    #[test]
    fn test_status_text() {
        let started = ProgressEvent::Started {
            index: 0,
            total: 3,
            name: "a.pdf".into(),
        };
        assert_eq!(started.status_text(), "Processing a.pdf (1 of 3)");

        let done = ProgressEvent::Completed {
            written: 2,
            failed: 1,
        };
        assert_eq!(done.status_text(), "Done: 2 document(s) written, 1 failed");
    }
}
