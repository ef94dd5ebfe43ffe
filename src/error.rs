//! Error types for the lender-pdf-parse library.
//!
//! Two error types cover two different gates a request passes through:
//!
//! * [`AuthError`]: the shared-secret check in front of the rent-roll
//!   endpoint. It runs before any byte of the document is touched.
//!
//! * [`PdfTableError`]: **Fatal** pipeline errors: the document could not be
//!   fetched, parsed, restructured or serialised. Every pipeline entry point
//!   in [`crate::convert`] returns `Err(PdfTableError)`.
//!
//! The HTTP layer ([`crate::server`]) maps both onto status codes; the
//! library itself never decides what a client sees.

use thiserror::Error;

/// All fatal errors returned by the extraction pipelines.
#[derive(Debug, Error)]
pub enum PdfTableError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The `pdf_url` could not be parsed as an absolute HTTP/HTTPS URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request could not complete or the remote answered with an error status.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// pdfium refused to open the document.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// Table detection failed on a specific page.
    #[error("Table extraction failed on page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be constructed (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API call itself failed.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The generated reply is not a rent-roll summary.
    #[error("Model reply is not valid rent-roll JSON after {attempts} attempt(s): {detail}")]
    MalformedReply { attempts: u32, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The scoped temporary file for an upload could not be created or written.
    #[error("Temporary file error: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },

    /// CSV serialisation of the merged table failed.
    #[error("Failed to write CSV: {0}")]
    CsvWrite(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfTableError {
    /// `true` for every failure to obtain the remote document.
    ///
    /// The rent-roll endpoint reports these as a client error (400) and
    /// everything else as a server error.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            PdfTableError::InvalidUrl { .. }
                | PdfTableError::DownloadFailed { .. }
                | PdfTableError::DownloadTimeout { .. }
        )
    }
}

/// Rejections produced by the internal-token check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The server has no shared secret to compare against.
    #[error("Internal Token not found in environment variables")]
    SecretNotConfigured,

    /// The `x-internal-token` header is absent or empty.
    #[error("Provide the internal token")]
    MissingToken,

    /// The header does not match the shared secret.
    #[error("Invalid token")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_are_grouped() {
        let e = PdfTableError::DownloadFailed {
            url: "https://example.com/a.pdf".into(),
            reason: "HTTP 404 Not Found".into(),
        };
        assert!(e.is_fetch_error());
        assert!(e.to_string().contains("404"), "got: {e}");

        let e = PdfTableError::DownloadTimeout {
            url: "https://example.com/a.pdf".into(),
            secs: 5,
        };
        assert!(e.is_fetch_error());
        assert!(e.to_string().contains("5s"));
    }

    #[test]
    fn non_fetch_errors_are_not_grouped() {
        let e = PdfTableError::MalformedReply {
            attempts: 2,
            detail: "expected value at line 1 column 1".into(),
        };
        assert!(!e.is_fetch_error());
        assert!(e.to_string().contains("2 attempt"));

        let e = PdfTableError::CorruptPdf {
            detail: "FormatError".into(),
        };
        assert!(!e.is_fetch_error());
    }

    #[test]
    fn auth_error_messages() {
        assert_eq!(
            AuthError::SecretNotConfigured.to_string(),
            "Internal Token not found in environment variables"
        );
        assert_eq!(AuthError::MissingToken.to_string(), "Provide the internal token");
        assert_eq!(AuthError::InvalidToken.to_string(), "Invalid token");
    }
}
