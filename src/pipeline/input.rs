//! Source acquisition: obtain the raw PDF bytes for one request.
//!
//! Two shapes of input exist:
//!
//! * a `pdf_url` that is fetched with a single GET ([`fetch_pdf`]); any
//!   failure here is a fetch error and extraction never starts;
//! * an uploaded file, which is persisted to a [`ScopedPdfFile`] for the
//!   duration of extraction. The file lives in a `NamedTempFile`, so it is
//!   removed when the handle drops, whether extraction succeeded or not.
//!
//! Neither path validates size, content type or the `%PDF` magic bytes;
//! a non-PDF surfaces later as an extraction error.

use crate::error::PdfTableError;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Download `url` and return the body.
///
/// Fails with a fetch error (see [`PdfTableError::is_fetch_error`]) when the
/// URL is malformed, the request cannot complete, it times out, or the
/// remote answers with a non-success status. No retry.
pub async fn fetch_pdf(url: &str, timeout_secs: u64) -> Result<Vec<u8>, PdfTableError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| PdfTableError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PdfTableError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PdfTableError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|e| map_request_error(url, timeout_secs, e))?;

    if !response.status().is_success() {
        return Err(PdfTableError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| map_request_error(url, timeout_secs, e))?;

    debug!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

fn map_request_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> PdfTableError {
    if e.is_timeout() {
        PdfTableError::DownloadTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        PdfTableError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// An uploaded document persisted for the length of one extraction.
///
/// The backing file is deleted when this value is dropped.
#[derive(Debug)]
pub struct ScopedPdfFile {
    file: NamedTempFile,
    len: usize,
}

impl ScopedPdfFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Write upload bytes to a fresh temporary file.
pub fn persist_upload(bytes: &[u8]) -> Result<ScopedPdfFile, PdfTableError> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|source| PdfTableError::TempFile { source })?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|source| PdfTableError::TempFile { source })?;

    debug!("Persisted {} upload bytes to {}", bytes.len(), file.path().display());
    Ok(ScopedPdfFile {
        file,
        len: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    async fn spawn_origin() -> String {
        let app = Router::new()
            .route("/doc.pdf", get(|| async { b"%PDF-1.7 fake".to_vec() }))
            .route("/missing.pdf", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn malformed_url_is_a_fetch_error() {
        let err = fetch_pdf("not a url", 5).await.unwrap_err();
        assert!(matches!(err, PdfTableError::InvalidUrl { .. }));
        assert!(err.is_fetch_error());
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let err = fetch_pdf("file:///etc/passwd", 5).await.unwrap_err();
        assert!(matches!(err, PdfTableError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_error() {
        let base = spawn_origin().await;
        let err = fetch_pdf(&format!("{base}/missing.pdf"), 5).await.unwrap_err();
        assert!(err.is_fetch_error());
        assert!(err.to_string().contains("404"), "got: {err}");
    }

    #[tokio::test]
    async fn success_returns_body_verbatim() {
        let base = spawn_origin().await;
        let bytes = fetch_pdf(&format!("{base}/doc.pdf"), 5).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7 fake");
    }

    #[test]
    fn upload_file_is_removed_on_drop() {
        let scoped = persist_upload(b"not even a pdf").unwrap();
        let path = scoped.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"not even a pdf");
        assert_eq!(scoped.len(), 14);
        drop(scoped);
        assert!(!path.exists());
    }
}
