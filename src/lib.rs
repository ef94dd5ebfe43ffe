//! # lender-pdf-parse
//!
//! Extract tables from lender PDF documents and hand them back either as a
//! rent-roll summary restructured by an LLM, or as one merged CSV file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! rent roll (POST /extracttable)          tables CSV (POST /extract-tables/)
//!  │                                       │
//!  ├─ 1. Auth     x-internal-token check   ├─ 1. Input   persist upload to a temp file
//!  ├─ 2. Input    download pdf_url         ├─ 2. Extract pdfium text runs → grids
//!  ├─ 3. Extract  pdfium text runs → grids ├─ 3. Merge   positional concatenation
//!  ├─ 4. LLM      tables → rentRollSummary └─ 4. Output  tables.csv attachment
//!  └─ 5. Polish   fence stripping, schema validation, cell types
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lender_pdf_parse::{
//!     rent_roll_from_url, PdfiumTableExtractor, ProviderTextGenerator, ServiceConfig,
//!     TableExtractor,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder()
//!         .openai_api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!     let extractor: Arc<dyn TableExtractor> =
//!         Arc::new(PdfiumTableExtractor::from_config(&config));
//!     let generator = ProviderTextGenerator::from_config(&config)?;
//!
//!     let summary = rent_roll_from_url(
//!         "https://example.com/rent-roll.pdf",
//!         &extractor,
//!         &generator,
//!         &config,
//!     )
//!     .await?;
//!     println!("{}", serde_json::to_string_pretty(&summary)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Builds the binary (clap, anyhow, dotenvy, tracing-subscriber) |
//!
//! Disable `cli` when embedding the routers or pipelines in another service:
//! ```toml
//! lender-pdf-parse = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{LayoutConfig, ServiceConfig, ServiceConfigBuilder};
pub use convert::{rent_roll_from_bytes, rent_roll_from_url, tables_csv_from_upload};
pub use error::{AuthError, PdfTableError};
pub use output::{CellType, CsvOutcome, MergedTable, RentRollCell, RentRollSummary};
pub use pipeline::extract::{PdfSource, PdfiumTableExtractor, TableExtractor};
pub use pipeline::llm::{Completion, ProviderTextGenerator, TextGenerator};
pub use server::{csv_router, rent_roll_router, CsvState, RentRollState};
pub use table::{Cell, ExtractedTable, TableCollection};
