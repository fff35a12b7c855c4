use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::pipeline::{ByteSink, ExtractionResult, ProgressEvent, ProgressReporter, SinkError};

/// Progress bar on stderr, scaled to 100 so partial documents could be shown later.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return ConsoleProgress {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        ConsoleProgress { bar }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&mut self, event: ProgressEvent) {
        if let Some(fraction) = event.fraction() {
            self.bar.set_position((fraction * 100.0).round() as u64);
        }

        match &event {
            ProgressEvent::Failed { .. } => {
                self.bar.println(format!("error: {}", event.status_text()));
            }
            ProgressEvent::Completed { .. } => self.bar.finish_with_message(event.status_text()),
            ProgressEvent::Aborted { .. } => self.bar.abandon_with_message(event.status_text()),
            _ => self.bar.set_message(event.status_text()),
        }
    }
}

/// Keeps status lines in memory, for surfaces that answer once the run is over.
#[derive(Debug, Default)]
pub struct StatusLog {
    pub lines: Vec<String>,
}

impl ProgressReporter for StatusLog {
    fn report(&mut self, event: ProgressEvent) {
        self.lines.push(event.status_text());
    }
}

/// Writes each output file into a directory. Without `overwrite`, an existing file is
/// left alone and that one output is refused.
pub struct DirectorySink {
    dir: PathBuf,
    overwrite: bool,
}

impl DirectorySink {
    pub fn create<P: AsRef<Path>>(dir: P, overwrite: bool) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        Ok(DirectorySink {
            dir: dir.to_path_buf(),
            overwrite,
        })
    }
}

impl ByteSink for DirectorySink {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), SinkError> {
        // only the final component; a name never escapes the output directory
        let Some(file_name) = Path::new(name).file_name() else {
            return Err(SinkError::Refused(format!("invalid output name: {}", name)));
        };
        let path = self.dir.join(file_name);

        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = match options.open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SinkError::Refused(format!(
                    "{} already exists",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to create {}", path.display()))
                    .into())
            }
        };
        file.write_all(bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}

/// Serializable view of one document's outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentReport {
    pub index: usize,
    pub source: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn new(result: &ExtractionResult, output_dir: &Path) -> Self {
        match &result.outcome {
            Ok(extracted) => DocumentReport {
                index: result.index,
                source: result.source_name.clone(),
                status: "written".to_string(),
                output: Some(output_dir.join(&extracted.output_name).display().to_string()),
                page_count: Some(extracted.page_count),
                error_code: None,
                error: None,
            },
            Err(e) => DocumentReport {
                index: result.index,
                source: result.source_name.clone(),
                status: "failed".to_string(),
                output: None,
                page_count: None,
                error_code: Some(e.code().to_string()),
                error: Some(e.to_string()),
            },
        }
    }
}
