//! Configuration types for both extraction services.
//!
//! Every knob lives in [`ServiceConfig`], built via its
//! [`ServiceConfigBuilder`]. The config is constructed once at startup and
//! shared read-only across requests, so credentials are handed to the LLM
//! adapter explicitly instead of being assigned to any process-wide state.

use crate::error::PdfTableError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Upper bound accepted for [`ServiceConfig::max_retries`].
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Configuration for the rent-roll and CSV pipelines.
///
/// # Example
/// ```rust
/// use lender_pdf_parse::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .internal_token("s3cret")
///     .model("gpt-4.1-mini")
///     .max_retries(0)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_retries, 0);
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// Shared secret expected in the `x-internal-token` header.
    ///
    /// `None` is a valid state: the rent-roll endpoint then answers every
    /// request with a 500 explaining that the secret is missing.
    pub internal_token: Option<String>,

    /// API key handed to the LLM provider at construction time.
    pub openai_api_key: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama"). Default: "openai".
    pub provider_name: String,

    /// LLM model identifier. Default: "gpt-3.5-turbo".
    pub model: String,

    /// Sampling temperature. Default: 0.1.
    ///
    /// The reply must be parseable JSON, so low temperature is preferred.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// Large rent rolls produce long replies; a low cap truncates the JSON
    /// and the reply then fails to parse.
    pub max_tokens: usize,

    /// Extra attempts after a malformed or failed model reply. Default: 0.
    ///
    /// At most [`MAX_RETRIES_LIMIT`]. With the default every request makes
    /// exactly one model call.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles per attempt). Default: 500.
    pub retry_backoff_ms: u64,

    /// Download timeout for `pdf_url` fetches in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Explicit path to the pdfium shared library. Default: None.
    ///
    /// When unset the library is looked up next to the executable and then
    /// in the system library path.
    pub pdfium_library_path: Option<PathBuf>,

    /// Table-detection tolerances.
    pub layout: LayoutConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            internal_token: None,
            openai_api_key: None,
            provider_name: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 0,
            retry_backoff_ms: 500,
            download_timeout_secs: 120,
            pdfium_library_path: None,
            layout: LayoutConfig::default(),
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("internal_token", &self.internal_token.as_ref().map(|_| "<redacted>"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("layout", &self.layout)
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn internal_token(mut self, token: impl Into<String>) -> Self {
        self.config.internal_token = Some(token.into());
        self
    }

    /// Set or clear the shared secret; empty strings count as unset.
    pub fn internal_token_opt(mut self, token: Option<String>) -> Self {
        self.config.internal_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.openai_api_key = Some(key.into());
        self
    }

    pub fn openai_api_key_opt(mut self, key: Option<String>) -> Self {
        self.config.openai_api_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.config.layout = layout;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, PdfTableError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(PdfTableError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(PdfTableError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_retries > MAX_RETRIES_LIMIT {
            return Err(PdfTableError::InvalidConfig(format!(
                "max_retries must be ≤ {}, got {}",
                MAX_RETRIES_LIMIT, c.max_retries
            )));
        }
        if c.model.trim().is_empty() {
            return Err(PdfTableError::InvalidConfig("model must not be empty".into()));
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

/// Tolerances for turning positioned text into table grids.
///
/// All distances are in PDF points (1/72 inch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Maximum vertical distance between span centres on the same line. Default: 3.0.
    pub y_tolerance: f32,
    /// Horizontal gaps narrower than this join two spans into one cell. Default: 4.0.
    pub min_column_gap: f32,
    /// Minimum consecutive multi-cell lines that form a table. Default: 2.
    pub min_rows: usize,
    /// Minimum cells per line for the line to count as a table row. Default: 2.
    pub min_columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            y_tolerance: 3.0,
            min_column_gap: 4.0,
            min_rows: 2,
            min_columns: 2,
        }
    }
}

impl LayoutConfig {
    fn validate(&self) -> Result<(), PdfTableError> {
        if !(self.y_tolerance > 0.0) {
            return Err(PdfTableError::InvalidConfig(format!(
                "y_tolerance must be positive, got {}",
                self.y_tolerance
            )));
        }
        if self.min_column_gap < 0.0 {
            return Err(PdfTableError::InvalidConfig(format!(
                "min_column_gap must not be negative, got {}",
                self.min_column_gap
            )));
        }
        if self.min_rows == 0 || self.min_columns == 0 {
            return Err(PdfTableError::InvalidConfig(
                "min_rows and min_columns must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}
