//! Table extraction: turn PDF bytes or a PDF file into a [`TableCollection`].
//!
//! Extraction is modelled as an injected capability, [`TableExtractor`], so
//! the HTTP layer and the pipelines can run against deterministic fakes.
//! The production implementation, [`PdfiumTableExtractor`], reads the text
//! runs of every page through pdfium and hands them to
//! [`crate::pipeline::layout::detect_tables`].
//!
//! ## Threading
//!
//! pdfium is a C++ library with thread-local state and no async API. Every
//! extraction runs through [`extract_tables`], which moves the work onto
//! tokio's blocking pool so request-handling workers never stall on it.

use crate::config::{LayoutConfig, ServiceConfig};
use crate::error::PdfTableError;
use crate::pipeline::layout::{detect_tables, TextSpan};
use crate::table::TableCollection;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Where the document to extract from lives.
#[derive(Debug, Clone)]
pub enum PdfSource {
    /// Document held in memory (fetched from a URL).
    Bytes(Vec<u8>),
    /// Document on disk (a persisted upload).
    File(PathBuf),
}

impl PdfSource {
    fn describe(&self) -> String {
        match self {
            PdfSource::Bytes(b) => format!("<{} bytes in memory>", b.len()),
            PdfSource::File(p) => p.display().to_string(),
        }
    }
}

/// Capability: detect the tables in a PDF.
///
/// Implementations are blocking; call them through [`extract_tables`].
/// An empty collection is a valid result, not an error.
pub trait TableExtractor: Send + Sync {
    fn extract(&self, source: &PdfSource) -> Result<TableCollection, PdfTableError>;
}

/// Run `extractor` on the blocking pool.
pub async fn extract_tables(
    extractor: Arc<dyn TableExtractor>,
    source: PdfSource,
) -> Result<TableCollection, PdfTableError> {
    tokio::task::spawn_blocking(move || extractor.extract(&source))
        .await
        .map_err(|e| PdfTableError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// pdfium-backed extractor.
///
/// Binds the pdfium library per call; binding is cheap next to parsing and
/// keeps the extractor free of non-`Send` state.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTableExtractor {
    library_path: Option<PathBuf>,
    layout: LayoutConfig,
}

impl PdfiumTableExtractor {
    pub fn new(library_path: Option<PathBuf>, layout: LayoutConfig) -> Self {
        Self {
            library_path,
            layout,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.pdfium_library_path.clone(), config.layout.clone())
    }

    /// Bind pdfium: explicit path first, else next to the binary, else the system library.
    pub fn bind(&self) -> Result<Pdfium, PdfTableError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| PdfTableError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl TableExtractor for PdfiumTableExtractor {
    fn extract(&self, source: &PdfSource) -> Result<TableCollection, PdfTableError> {
        let pdfium = self.bind()?;

        let document = match source {
            PdfSource::Bytes(bytes) => pdfium.load_pdf_from_byte_slice(bytes, None),
            PdfSource::File(path) => pdfium.load_pdf_from_file(path, None),
        }
        .map_err(|e| PdfTableError::CorruptPdf {
            detail: format!("{:?}", e),
        })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages from {}", pages.len(), source.describe());

        let mut tables = TableCollection::default();
        for (index, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| PdfTableError::ExtractionFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

            let page_tables = detect_tables(&page_spans(&text), &self.layout);
            debug!("Page {}: {} table(s)", index + 1, page_tables.len());
            tables.extend_page(page_tables);
        }

        info!(
            "Extracted {} table(s), {} row(s) total",
            tables.len(),
            tables.total_rows()
        );
        Ok(tables)
    }
}

/// Text runs of one page with their bounding boxes.
#[allow(deprecated)]
fn page_spans(text: &PdfPageText<'_>) -> Vec<TextSpan> {
    text.segments()
        .iter()
        .map(|segment| {
            let bounds = segment.bounds();
            TextSpan::new(
                segment.text(),
                bounds.left.value,
                bounds.right.value,
                bounds.top.value,
                bounds.bottom.value,
            )
        })
        .collect()
}
