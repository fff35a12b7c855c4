use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use crate::page_range::default_expression;
use crate::pdf::{has_pdf_header, PdfDocument};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("{name} is not a PDF file (declared type {declared_type})")]
    NotAPdf { name: String, declared_type: String },

    #[error("{name} is not a valid PDF document")]
    InvalidPdf { name: String },

    #[error("{name} could not be opened; it may be encrypted or corrupt: {detail}")]
    EncryptedOrCorrupt { name: String, detail: String },
}

impl IngestError {
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::NotAPdf { .. } => "not-a-pdf",
            IngestError::InvalidPdf { .. } => "invalid-pdf",
            IngestError::EncryptedOrCorrupt { .. } => "encrypted-or-corrupt",
        }
    }
}

/// A file accepted into the registry along with the pages the user wants from it.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    name: String,
    raw_bytes: Arc<[u8]>,
    total_pages: u32,
    pub page_range_expression: String,
}

impl UploadedDocument {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    /// Cheap handle on the original bytes for work moved off the async runtime.
    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.raw_bytes)
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }
}

/// Ordered, session-local collection of ingested documents.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: Vec<UploadedDocument>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `bytes` as a PDF and append it. Nothing is added on error.
    pub fn ingest(
        &mut self,
        bytes: Vec<u8>,
        name: &str,
        declared_type: &str,
    ) -> Result<&UploadedDocument, IngestError> {
        check_declared_type(name, declared_type)?;

        if !has_pdf_header(&bytes) {
            return Err(IngestError::InvalidPdf {
                name: name.to_string(),
            });
        }

        let total_pages = match PdfDocument::load_mem(&bytes) {
            Ok(doc) => doc.page_count(),
            Err(e) => {
                warn!("Rejecting {}: {:#}", name, e);
                return Err(IngestError::EncryptedOrCorrupt {
                    name: name.to_string(),
                    detail: format!("{:#}", e),
                });
            }
        };

        if total_pages == 0 {
            return Err(IngestError::InvalidPdf {
                name: name.to_string(),
            });
        }

        debug!("Ingested {} ({} pages)", name, total_pages);
        self.documents.push(UploadedDocument {
            name: name.to_string(),
            raw_bytes: Arc::from(bytes),
            total_pages,
            page_range_expression: default_expression(total_pages),
        });

        Ok(&self.documents[self.documents.len() - 1])
    }

    /// Replace the range expression at `index`. No validation happens here; bad
    /// expressions surface when the document is extracted.
    pub fn update_range(&mut self, index: usize, expression: &str) {
        match self.documents.get_mut(index) {
            Some(doc) => doc.page_range_expression = expression.to_string(),
            None => debug!(
                "Ignoring range update for index {} ({} documents)",
                index,
                self.documents.len()
            ),
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<UploadedDocument> {
        if index < self.documents.len() {
            Some(self.documents.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&UploadedDocument> {
        self.documents.get(index)
    }

    pub fn documents(&self) -> &[UploadedDocument] {
        &self.documents
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedDocument> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Reject anything not declared as a PDF, before its bytes are looked at.
pub fn check_declared_type(name: &str, declared_type: &str) -> Result<(), IngestError> {
    if declared_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(IngestError::NotAPdf {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
        })
    }
}

/// Content type a file is declared as, judged from its extension the way a browser
/// labels a picked file.
pub fn declared_type_for<P: AsRef<Path>>(path: P) -> &'static str {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_CONTENT_TYPE,
        _ => FALLBACK_CONTENT_TYPE,
    }
}
