//! Eager end-to-end pipeline entry points.
//!
//! Each function runs one request's worth of work start to finish and
//! returns the final output; nothing is shared between calls besides the
//! injected capabilities and the read-only config.
//!
//! ```text
//! rent_roll_from_url     fetch ─▶ extract ─▶ restructure (LLM) ─▶ RentRollSummary
//! tables_csv_from_upload persist ─▶ extract ─▶ merge ─▶ CsvOutcome
//! ```

use crate::config::ServiceConfig;
use crate::error::PdfTableError;
use crate::output::{CsvOutcome, RentRollSummary};
use crate::pipeline::extract::{extract_tables, PdfSource, TableExtractor};
use crate::pipeline::llm::{restructure_rent_roll, TextGenerator};
use crate::pipeline::{input, merge};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Fetch a PDF from `pdf_url` and restructure its tables into a rent roll.
///
/// # Errors
/// - a fetch error ([`PdfTableError::is_fetch_error`]) when the download
///   fails; extraction is never attempted in that case
/// - extraction errors from the [`TableExtractor`]
/// - [`PdfTableError::MalformedReply`] / [`PdfTableError::LlmApiError`]
///   from the generation stage
pub async fn rent_roll_from_url(
    pdf_url: &str,
    extractor: &Arc<dyn TableExtractor>,
    generator: &dyn TextGenerator,
    config: &ServiceConfig,
) -> Result<RentRollSummary, PdfTableError> {
    let start = Instant::now();
    info!("Starting rent-roll extraction: {}", pdf_url);

    // ── Step 1: Fetch ────────────────────────────────────────────────────
    let bytes = input::fetch_pdf(pdf_url, config.download_timeout_secs).await?;

    // ── Step 2+3: Extract and restructure ────────────────────────────────
    let summary = rent_roll_from_bytes(bytes, extractor, generator, config).await?;

    info!(
        "Rent-roll extraction complete: {} row(s), {}ms",
        summary.row_count(),
        start.elapsed().as_millis()
    );
    Ok(summary)
}

/// Restructure the tables of an in-memory PDF into a rent roll.
pub async fn rent_roll_from_bytes(
    bytes: Vec<u8>,
    extractor: &Arc<dyn TableExtractor>,
    generator: &dyn TextGenerator,
    config: &ServiceConfig,
) -> Result<RentRollSummary, PdfTableError> {
    let tables = extract_tables(Arc::clone(extractor), PdfSource::Bytes(bytes)).await?;
    restructure_rent_roll(generator, &tables, config).await
}

/// Extract every table of an uploaded PDF and merge them into one CSV.
///
/// The upload is persisted to a scoped temporary file which is removed
/// before this function returns, on success and on failure alike.
pub async fn tables_csv_from_upload(
    bytes: &[u8],
    extractor: &Arc<dyn TableExtractor>,
) -> Result<CsvOutcome, PdfTableError> {
    let start = Instant::now();
    info!("Starting CSV extraction: {} upload bytes", bytes.len());

    let scoped = input::persist_upload(bytes)?;
    let extracted = extract_tables(
        Arc::clone(extractor),
        PdfSource::File(scoped.path().to_path_buf()),
    )
    .await;
    drop(scoped);

    let outcome = merge::tables_to_csv(&extracted?)?;

    match &outcome {
        CsvOutcome::NoTables => info!("CSV extraction complete: no tables found"),
        CsvOutcome::Csv {
            tables, data_rows, ..
        } => info!(
            "CSV extraction complete: {} table(s), {} row(s), {}ms",
            tables,
            data_rows,
            start.elapsed().as_millis()
        ),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::Completion;
    use crate::table::{table_of, TableCollection};
    use futures::future::BoxFuture;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records the file it was pointed at, checks it exists, returns fixed tables.
    struct FileProbe {
        seen: Mutex<Option<PathBuf>>,
        tables: TableCollection,
        fail: bool,
    }

    impl TableExtractor for FileProbe {
        fn extract(&self, source: &PdfSource) -> Result<TableCollection, PdfTableError> {
            let PdfSource::File(path) = source else {
                panic!("uploads must be extracted from a file");
            };
            assert!(path.exists());
            *self.seen.lock().unwrap() = Some(path.clone());
            if self.fail {
                return Err(PdfTableError::CorruptPdf {
                    detail: "not a PDF".into(),
                });
            }
            Ok(self.tables.clone())
        }
    }

    fn probe(tables: TableCollection, fail: bool) -> Arc<FileProbe> {
        Arc::new(FileProbe {
            seen: Mutex::new(None),
            tables,
            fail,
        })
    }

    #[tokio::test]
    async fn upload_file_is_removed_after_success() {
        let p = probe(TableCollection::new(vec![table_of(&[&["a", "b"]])]), false);
        let extractor: Arc<dyn TableExtractor> = p.clone();
        let outcome = tables_csv_from_upload(b"%PDF-1.4", &extractor).await.unwrap();
        assert!(matches!(outcome, CsvOutcome::Csv { data_rows: 1, .. }));
        let path = p.seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn upload_file_is_removed_after_failure() {
        let p = probe(TableCollection::default(), true);
        let extractor: Arc<dyn TableExtractor> = p.clone();
        let err = tables_csv_from_upload(b"garbage", &extractor).await.unwrap_err();
        assert!(matches!(err, PdfTableError::CorruptPdf { .. }));
        let path = p.seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn empty_upload_yields_no_tables() {
        let extractor: Arc<dyn TableExtractor> = probe(TableCollection::default(), false);
        let outcome = tables_csv_from_upload(b"", &extractor).await.unwrap();
        assert_eq!(outcome, CsvOutcome::NoTables);
    }

    struct Echo;

    impl TextGenerator for Echo {
        fn complete<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> BoxFuture<'a, Result<Completion, PdfTableError>> {
            Box::pin(async {
                Ok(Completion::text(
                    r#"{"rentRollSummary":[[{"key":"Unit","value":"101","type":"string"}]]}"#,
                ))
            })
        }
    }

    struct BytesOnly;

    impl TableExtractor for BytesOnly {
        fn extract(&self, source: &PdfSource) -> Result<TableCollection, PdfTableError> {
            assert!(matches!(source, PdfSource::Bytes(b) if b == b"%PDF-1.7"));
            Ok(TableCollection::default())
        }
    }

    #[tokio::test]
    async fn rent_roll_from_bytes_extracts_in_memory() {
        let extractor: Arc<dyn TableExtractor> = Arc::new(BytesOnly);
        let config = ServiceConfig::builder().max_retries(0).build().unwrap();
        let summary = rent_roll_from_bytes(b"%PDF-1.7".to_vec(), &extractor, &Echo, &config)
            .await
            .unwrap();
        assert_eq!(summary.row_count(), 1);
    }
}
