//! Sequential page extraction over a batch of ingested documents.
//!
//! Each document is loaded, trimmed to its resolved page set and re-serialized before
//! the next one starts. A document that fails, or whose output the [`ByteSink`] refuses,
//! is recorded and the run moves on. Only a sink that has stopped working ends the run.

pub mod events;
pub mod guard;

use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

pub use events::{ByteSink, ProgressEvent, ProgressReporter, SinkError};
pub use guard::SingleFlight;

use crate::page_range::resolve_page_set;
use crate::pdf::{CompressionProfile, PdfDocument};
use crate::registry::UploadedDocument;

/// Appended in place of a trailing `.pdf` when naming output.
pub const OUTPUT_SUFFIX: &str = "_recortado.pdf";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("document is password protected")]
    ProtectedDocument,

    #[error("range expression selects no valid pages")]
    NoValidPages,

    #[error("document could not be read: {0}")]
    Unreadable(String),

    #[error("failed to save output: {0}")]
    SaveFailed(String),

    #[error("output was not written: {0}")]
    WriteRefused(String),
}

impl ExtractionError {
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionError::ProtectedDocument => "protected-document",
            ExtractionError::NoValidPages => "no-valid-pages",
            ExtractionError::Unreadable(_) => "unreadable",
            ExtractionError::SaveFailed(_) => "save-failed",
            ExtractionError::WriteRefused(_) => "write-refused",
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("an extraction run is already in progress")]
    AlreadyRunning,

    #[error("extraction run aborted after {} document(s): {cause:#}", completed.len())]
    Aborted {
        completed: Vec<ExtractionResult>,
        cause: anyhow::Error,
    },
}

/// A trimmed document ready to hand to a sink.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub output_name: String,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

/// Outcome for one document of a run.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub index: usize,
    pub source_name: String,
    pub outcome: Result<ExtractedDocument, ExtractionError>,
}

impl ExtractionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// How long the pipeline stays busy after a run has finished emitting.
    pub release_delay: Duration,
}

pub struct ExtractionPipeline {
    config: PipelineConfig,
    flight: SingleFlight,
}

impl ExtractionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        ExtractionPipeline {
            config,
            flight: SingleFlight::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.flight.is_running()
    }

    /// Process `documents` in order.
    ///
    /// Returns one result per document. Fails with [`RunError::AlreadyRunning`] without
    /// side effects if another run holds this pipeline.
    pub async fn run<P, S>(
        &self,
        documents: &[UploadedDocument],
        profile: CompressionProfile,
        progress: &mut P,
        sink: &mut S,
    ) -> Result<Vec<ExtractionResult>, RunError>
    where
        P: ProgressReporter + ?Sized,
        S: ByteSink + ?Sized,
    {
        let Some(_guard) = self.flight.try_acquire(self.config.release_delay) else {
            debug!("Extraction run requested while another is in progress");
            return Err(RunError::AlreadyRunning);
        };

        let total = documents.len();
        let mut results = Vec::with_capacity(total);

        for (index, doc) in documents.iter().enumerate() {
            progress.report(ProgressEvent::Started {
                index,
                total,
                name: doc.name().to_string(),
            });

            let outcome = match extract_document(doc, profile).await {
                Ok(extracted) => match sink.write(&extracted.output_name, &extracted.bytes) {
                    Ok(()) => Ok(extracted),
                    Err(SinkError::Refused(reason)) => Err(ExtractionError::WriteRefused(reason)),
                    Err(SinkError::Failed(e)) => {
                        let cause = e.context(format!("Failed to write {}", extracted.output_name));
                        progress.report(ProgressEvent::Aborted {
                            message: format!("{:#}", cause),
                        });
                        return Err(RunError::Aborted {
                            completed: results,
                            cause,
                        });
                    }
                },
                Err(reason) => Err(reason),
            };

            match &outcome {
                Ok(extracted) => {
                    info!(
                        "Wrote {} ({} page(s)) from {}",
                        extracted.output_name,
                        extracted.page_count,
                        doc.name()
                    );
                    progress.report(ProgressEvent::Finished {
                        index,
                        total,
                        output_name: extracted.output_name.clone(),
                    });
                }
                Err(reason) => {
                    warn!("Skipping {}: {}", doc.name(), reason);
                    progress.report(ProgressEvent::Failed {
                        index,
                        total,
                        name: doc.name().to_string(),
                        reason: reason.clone(),
                    });
                }
            }

            results.push(ExtractionResult {
                index,
                source_name: doc.name().to_string(),
                outcome,
            });
        }

        let written = results.iter().filter(|r| r.is_success()).count();
        progress.report(ProgressEvent::Completed {
            written,
            failed: results.len() - written,
        });

        Ok(results)
    }
}

/// Load, trim and serialize one document off the async runtime. The run waits for it
/// to finish before moving to the next document.
async fn extract_document(
    doc: &UploadedDocument,
    profile: CompressionProfile,
) -> Result<ExtractedDocument, ExtractionError> {
    let source = doc.shared_bytes();
    let expression = doc.page_range_expression.clone();
    let total_pages = doc.total_pages();

    let (bytes, page_count) = tokio::task::spawn_blocking(move || {
        trim_bytes(&source, &expression, total_pages, profile)
    })
    .await
    .map_err(|e| ExtractionError::Unreadable(format!("extraction task failed: {}", e)))??;

    Ok(ExtractedDocument {
        output_name: output_name(doc.name()),
        page_count,
        bytes,
    })
}

fn trim_bytes(
    bytes: &[u8],
    expression: &str,
    total_pages: u32,
    profile: CompressionProfile,
) -> Result<(Vec<u8>, usize), ExtractionError> {
    let source = PdfDocument::load_mem(bytes)
        .map_err(|e| ExtractionError::Unreadable(format!("{:#}", e)))?;

    let (mut output, page_count) = select_output_pages(&source, expression, total_pages)?;
    drop(source);

    let bytes = output
        .save_to_vec(profile)
        .map_err(|e| ExtractionError::SaveFailed(format!("{:#}", e)))?;

    Ok((bytes, page_count))
}

/// Build the output document for `expression`, pages in ascending order with
/// duplicates collapsed.
fn select_output_pages(
    source: &PdfDocument,
    expression: &str,
    total_pages: u32,
) -> Result<(PdfDocument, usize), ExtractionError> {
    if source.is_encrypted() {
        return Err(ExtractionError::ProtectedDocument);
    }

    let pages = resolve_page_set(expression, total_pages);
    if pages.is_empty() {
        return Err(ExtractionError::NoValidPages);
    }

    let output = source
        .select_pages(&pages)
        .map_err(|e| ExtractionError::Unreadable(format!("{:#}", e)))?;

    Ok((output, pages.len()))
}

/// `report.pdf` becomes `report_recortado.pdf`. Names without that exact suffix are
/// returned unchanged.
pub fn output_name(source_name: &str) -> String {
    match source_name.strip_suffix(".pdf") {
        Some(stem) => format!("{}{}", stem, OUTPUT_SUFFIX),
        None => source_name.to_string(),
    }
}
