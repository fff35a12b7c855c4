use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::ingest_file;
use crate::output::{DirectorySink, DocumentReport, StatusLog};
use crate::page_range::{format_page_set, resolve_page_set};
use crate::pdf::{CompressionProfile, PdfDocument};
use crate::pipeline::{ExtractionPipeline, PipelineConfig, RunError};
use crate::registry::{DocumentRegistry, IngestError};

const TRIM_BUSY: &str = "Error: another trim is still in progress; try again shortly";

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolvePagesRequest {
    #[schemars(description = "Page ranges (e.g., '1-5, 8, 11-13')")]
    pub pages: String,
    #[schemars(description = "Total number of pages in the document")]
    pub total_pages: u32,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TrimDocumentRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges to keep (default: all pages)")]
    #[serde(default)]
    pub pages: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfTrimRequest {
    #[schemars(description = "Documents to trim, processed in order")]
    pub documents: Vec<TrimDocumentRequest>,
    #[schemars(description = "Compression profile: low, medium or high (default: medium)")]
    #[serde(default)]
    pub compression: Option<String>,
    #[schemars(description = "Directory to write trimmed files into")]
    pub output_dir: String,
    #[schemars(description = "Replace existing output files (default: false)")]
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
    pipeline: Arc<ExtractionPipeline>,
}

impl PdfServer {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            pipeline: Arc::new(ExtractionPipeline::new(config)),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get the page count, default page range and basic metadata of a PDF")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let mut registry = DocumentRegistry::new();
        if let Err(e) = ingest_file(&mut registry, Path::new(&path)) {
            return format!("Error: {:#}", e);
        }
        let Some(doc) = registry.get(0) else {
            return "Error: document was not registered".to_string();
        };

        let info = match PdfDocument::load_mem(doc.raw_bytes()) {
            Ok(pdf) => pdf.get_info(),
            Err(e) => return format!("Error: {:#}", e),
        };

        let result = PdfInfoResult {
            path,
            page_count: doc.total_pages(),
            default_range: doc.page_range_expression.clone(),
            title: info.title,
            author: info.author,
            producer: info.producer,
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Resolve a page range expression like '1-5, 8, 11-13' into the sorted, de-duplicated pages it selects. Invalid or out-of-range parts are ignored.")]
    fn pdf_resolve_pages(&self, Parameters(req): Parameters<ResolvePagesRequest>) -> String {
        let pages = resolve_page_set(&req.pages, req.total_pages);
        let result = ResolvePagesResult {
            compact: format_page_set(&pages),
            count: pages.len(),
            pages,
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Trim PDFs to the given page ranges and write each as <name>_recortado.pdf into output_dir. Documents are processed one at a time; a failing document does not stop the others.")]
    async fn pdf_trim(&self, Parameters(req): Parameters<PdfTrimRequest>) -> String {
        let profile = match req.compression.as_deref() {
            Some(name) => match name.parse::<CompressionProfile>() {
                Ok(p) => p,
                Err(e) => return format!("Error: {}", e),
            },
            None => CompressionProfile::default(),
        };

        if self.pipeline.is_running() {
            return TRIM_BUSY.to_string();
        }

        let mut registry = DocumentRegistry::new();
        let mut rejected = Vec::new();
        for doc in &req.documents {
            match ingest_file(&mut registry, Path::new(&doc.path)) {
                Ok(index) => {
                    if let Some(pages) = &doc.pages {
                        registry.update_range(index, pages);
                    }
                }
                Err(e) => rejected.push(RejectedFile {
                    path: doc.path.clone(),
                    code: e.downcast_ref::<IngestError>().map(|e| e.code().to_string()),
                    error: format!("{:#}", e),
                }),
            }
        }

        let output_dir = PathBuf::from(&req.output_dir);
        let mut sink = match DirectorySink::create(&output_dir, req.overwrite) {
            Ok(s) => s,
            Err(e) => return format!("Error: {:#}", e),
        };
        let mut status = StatusLog::default();

        let results = match self
            .pipeline
            .run(registry.documents(), profile, &mut status, &mut sink)
            .await
        {
            Ok(results) => results,
            Err(RunError::AlreadyRunning) => return TRIM_BUSY.to_string(),
            Err(e) => return format!("Error: {}", e),
        };

        let result = PdfTrimResult {
            documents: results
                .iter()
                .map(|r| DocumentReport::new(r, &output_dir))
                .collect(),
            rejected,
            log: status.lines,
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub default_range: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ResolvePagesResult {
    pub pages: Vec<u32>,
    pub compact: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RejectedFile {
    pub path: String,
    pub code: Option<String>,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PdfTrimResult {
    pub documents: Vec<DocumentReport>,
    pub rejected: Vec<RejectedFile>,
    pub log: Vec<String>,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page trimming tools. Use pdf_info to get a document's page count, \
                 pdf_resolve_pages to preview which pages a range expression selects, and \
                 pdf_trim to write trimmed copies of one or more PDFs."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(config: PipelineConfig) -> Result<()> {
    let server = PdfServer::new(config);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{page_widths, sample_pdf};

    #[test]
    fn test_pdf_resolve_pages() {
        let server = PdfServer::default();
        let out = server.pdf_resolve_pages(Parameters(ResolvePagesRequest {
            pages: "5,1-3,x,40".into(),
            total_pages: 10,
        }));
        let result: ResolvePagesResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.pages, vec![1, 2, 3, 5]);
        assert_eq!(result.compact, "1-3,5");
        assert_eq!(result.count, 4);
    }

    #[test]
    fn test_pdf_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, sample_pdf(3)).unwrap();

        let server = PdfServer::default();
        let out = server.pdf_info(Parameters(PathRequest {
            path: path.display().to_string(),
        }));
        let result: PdfInfoResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.page_count, 3);
        assert_eq!(result.default_range, "1-3");
        assert_eq!(result.title.as_deref(), Some("Sample 3"));
    }

    #[tokio::test]
    async fn test_pdf_trim() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        std::fs::write(&a, sample_pdf(4)).unwrap();
        std::fs::write(&b, sample_pdf(4)).unwrap();
        let out = dir.path().join("out");

        let server = PdfServer::default();
        let response = server
            .pdf_trim(Parameters(PdfTrimRequest {
                documents: vec![
                    TrimDocumentRequest {
                        path: a.display().to_string(),
                        pages: Some("4,2".into()),
                    },
                    TrimDocumentRequest {
                        path: dir.path().join("missing.pdf").display().to_string(),
                        pages: None,
                    },
                    TrimDocumentRequest {
                        path: b.display().to_string(),
                        pages: Some("0".into()),
                    },
                ],
                compression: Some("high".into()),
                output_dir: out.display().to_string(),
                overwrite: false,
            }))
            .await;

        let result: PdfTrimResult = serde_json::from_str(&response).unwrap();
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].code, None);
        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.documents[0].status, "written");
        assert_eq!(result.documents[1].error_code.as_deref(), Some("no-valid-pages"));
        assert_eq!(
            page_widths(&std::fs::read(out.join("a_recortado.pdf")).unwrap()),
            vec![602, 604]
        );
    }

    #[tokio::test]
    async fn test_pdf_trim_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        std::fs::write(&a, sample_pdf(2)).unwrap();
        let out = dir.path().join("out");
        let request = || PdfTrimRequest {
            documents: vec![TrimDocumentRequest {
                path: a.display().to_string(),
                pages: None,
            }],
            compression: None,
            output_dir: out.display().to_string(),
            overwrite: true,
        };

        let server = PdfServer::new(PipelineConfig {
            release_delay: std::time::Duration::from_secs(60),
        });
        let first = server.pdf_trim(Parameters(request())).await;
        let result: PdfTrimResult = serde_json::from_str(&first).unwrap();
        assert_eq!(result.documents[0].status, "written");

        let second = server.pdf_trim(Parameters(request())).await;
        assert_eq!(second, TRIM_BUSY);
    }

    #[tokio::test]
    async fn test_pdf_trim_rejects_unknown_profile() {
        let server = PdfServer::default();
        let response = server
            .pdf_trim(Parameters(PdfTrimRequest {
                documents: Vec::new(),
                compression: Some("extreme".into()),
                output_dir: ".".into(),
                overwrite: false,
            }))
            .await;
        assert!(response.starts_with("Error:"));
    }
}
