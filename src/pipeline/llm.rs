//! Text generation: restructure extracted tables into a rent-roll summary.
//!
//! The model is reached through the [`TextGenerator`] capability so tests
//! can substitute a deterministic fake. [`ProviderTextGenerator`] adapts an
//! `edgequake_llm` provider; its credential comes from [`ServiceConfig`] at
//! construction time, never from shared mutable state.
//!
//! ## Retry Strategy
//!
//! The reply contract is defined only by the prompt, so a model can return
//! commentary, a truncated object or an ellipsis. [`restructure_rent_roll`]
//! validates every reply. By default (`max_retries = 0`) it makes exactly
//! one call; when retries are enabled it makes up to `max_retries` extra
//! calls with exponential backoff (`retry_backoff_ms * 2^(n-1)`, saturating).
//! A retry after a malformed reply appends a reminder naming the parse
//! failure.

use crate::config::ServiceConfig;
use crate::error::PdfTableError;
use crate::output::RentRollSummary;
use crate::pipeline::postprocess;
use crate::prompts::{malformed_reply_reminder, rent_roll_prompt};
use crate::table::TableCollection;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// A single model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Capability: complete a prompt with generated text.
pub trait TextGenerator: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, PdfTableError>>;
}

/// [`TextGenerator`] backed by an `edgequake_llm` provider.
///
/// The prompt is sent as a single system message.
pub struct ProviderTextGenerator {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderTextGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ServiceConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Construct the provider named in `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, PdfTableError> {
        let provider = resolve_provider(config)?;
        info!(
            "LLM provider ready: {} / {}",
            config.provider_name, config.model
        );
        Ok(Self::new(provider, config))
    }
}

impl TextGenerator for ProviderTextGenerator {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, PdfTableError>> {
        Box::pin(async move {
            let messages = vec![ChatMessage::system(prompt)];
            let response = self
                .provider
                .chat(&messages, Some(&self.options))
                .await
                .map_err(|e| PdfTableError::LlmApiError {
                    message: e.to_string(),
                })?;

            Ok(Completion {
                content: response.content.trim().to_string(),
                prompt_tokens: response.prompt_tokens,
                completion_tokens: response.completion_tokens,
            })
        })
    }
}

/// Resolve the provider from explicit configuration.
///
/// OpenAI is constructed directly from the configured key; other providers
/// go through [`ProviderFactory`], which reads their own key variables.
fn resolve_provider(config: &ServiceConfig) -> Result<Arc<dyn LLMProvider>, PdfTableError> {
    match config.provider_name.as_str() {
        "openai" => {
            let key = config.openai_api_key.as_deref().ok_or_else(|| {
                PdfTableError::ProviderNotConfigured {
                    provider: "openai".to_string(),
                    hint: "Set OPENAI_API_KEY or pass --openai-api-key.".to_string(),
                }
            })?;
            Ok(Arc::new(
                OpenAIProvider::new(key.to_string()).with_model(config.model.clone()),
            ))
        }
        name => ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
            PdfTableError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        }),
    }
}

/// Build `CompletionOptions` from the service config.
fn build_options(config: &ServiceConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Delay before retry number `retry` (1-based).
fn backoff_ms(base_ms: u64, retry: u32) -> u64 {
    let factor = 2u64
        .checked_pow(retry.saturating_sub(1))
        .unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

enum Failure {
    Api(PdfTableError),
    Malformed(String),
}

/// Ask the generator to turn `tables` into a [`RentRollSummary`].
///
/// Makes at most `config.max_retries + 1` calls. Fails with
/// [`PdfTableError::MalformedReply`] when no reply validates, or with the
/// provider error when the last attempt failed at the API level.
pub async fn restructure_rent_roll(
    generator: &dyn TextGenerator,
    tables: &TableCollection,
    config: &ServiceConfig,
) -> Result<RentRollSummary, PdfTableError> {
    let start = Instant::now();
    let prompt = rent_roll_prompt(&tables.to_json_text());
    let attempts = config.max_retries.saturating_add(1);
    let mut last: Option<Failure> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Rent roll: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let attempt_prompt = match &last {
            Some(Failure::Malformed(detail)) => {
                format!("{prompt}\n\n{}", malformed_reply_reminder(detail))
            }
            _ => prompt.clone(),
        };

        match generator.complete(&attempt_prompt).await {
            Ok(completion) => {
                debug!(
                    "Rent roll: {} input tokens, {} output tokens, {:?}",
                    completion.prompt_tokens,
                    completion.completion_tokens,
                    start.elapsed()
                );
                match postprocess::parse_rent_roll(&completion.content) {
                    Ok(summary) => {
                        info!("Rent roll: {} row(s)", summary.row_count());
                        return Ok(summary);
                    }
                    Err(detail) => {
                        warn!("Rent roll: attempt {} reply rejected: {}", attempt + 1, detail);
                        last = Some(Failure::Malformed(detail));
                    }
                }
            }
            Err(e) => {
                warn!("Rent roll: attempt {} failed: {}", attempt + 1, e);
                last = Some(Failure::Api(e));
            }
        }
    }

    Err(match last {
        Some(Failure::Api(e)) => e,
        Some(Failure::Malformed(detail)) => PdfTableError::MalformedReply { attempts, detail },
        None => PdfTableError::Internal("no generation attempt was made".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::table_of;
    use std::sync::Mutex;

    /// Replies from a script, recording every prompt it receives.
    struct ScriptedGenerator {
        replies: Mutex<Vec<Result<Completion, PdfTableError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(mut replies: Vec<Result<Completion, PdfTableError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn complete<'a>(
            &'a self,
            prompt: &'a str,
        ) -> BoxFuture<'a, Result<Completion, PdfTableError>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(Completion::text("")));
            Box::pin(async move { reply })
        }
    }

    const GOOD: &str = r#"{"rentRollSummary":[[{"key":"Unit","value":"101","type":"string"}]]}"#;

    fn config(retries: u32) -> ServiceConfig {
        ServiceConfig::builder()
            .max_retries(retries)
            .retry_backoff_ms(0)
            .build()
            .unwrap()
    }

    fn tables() -> TableCollection {
        TableCollection::new(vec![table_of(&[&["Unit"], &["101"]])])
    }

    #[tokio::test]
    async fn valid_reply_is_returned() {
        let generator = ScriptedGenerator::new(vec![Ok(Completion::text(GOOD))]);
        let summary = restructure_rent_roll(&generator, &tables(), &config(0)).await.unwrap();
        assert_eq!(summary.row_count(), 1);
        assert_eq!(generator.calls(), 1);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains(r#"[[["Unit"],["101"]]]"#));
    }

    #[tokio::test]
    async fn malformed_reply_without_retry_fails() {
        let generator = ScriptedGenerator::new(vec![Ok(Completion::text("Here you go: ..."))]);
        let err = restructure_rent_roll(&generator, &tables(), &config(0)).await.unwrap_err();
        assert!(matches!(err, PdfTableError::MalformedReply { attempts: 1, .. }));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_reply_is_retried_with_reminder() {
        let generator = ScriptedGenerator::new(vec![
            Ok(Completion::text(r#"{"rentRollSummary": [[{"key": "Unit", ...]]"#)),
            Ok(Completion::text(GOOD)),
        ]);
        let summary = restructure_rent_roll(&generator, &tables(), &config(1)).await.unwrap();
        assert_eq!(summary.row_count(), 1);
        assert_eq!(generator.calls(), 2);
        let prompts = generator.prompts.lock().unwrap();
        assert!(!prompts[0].contains("previous reply"));
        assert!(prompts[1].contains("previous reply could not be parsed"));
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let generator = ScriptedGenerator::new(vec![
            Ok(Completion::text("nope")),
            Ok(Completion::text("still nope")),
            Ok(Completion::text("never")),
            Ok(Completion::text(GOOD)),
        ]);
        let err = restructure_rent_roll(&generator, &tables(), &config(2)).await.unwrap_err();
        assert!(matches!(err, PdfTableError::MalformedReply { attempts: 3, .. }));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn api_error_on_last_attempt_is_propagated() {
        let generator = ScriptedGenerator::new(vec![Err(PdfTableError::LlmApiError {
            message: "429 Too Many Requests".into(),
        })]);
        let err = restructure_rent_roll(&generator, &tables(), &config(0)).await.unwrap_err();
        assert!(matches!(err, PdfTableError::LlmApiError { .. }));
    }

    #[tokio::test]
    async fn unchecked_retry_count_does_not_overflow() {
        let generator = ScriptedGenerator::new(vec![Ok(Completion::text(GOOD))]);
        let config = ServiceConfig {
            max_retries: u32::MAX,
            ..ServiceConfig::default()
        };
        let summary = restructure_rent_roll(&generator, &tables(), &config).await.unwrap();
        assert_eq!(summary.row_count(), 1);
        assert_eq!(generator.calls(), 1);
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 4), 4000);
        assert_eq!(backoff_ms(500, 65), u64::MAX);
        assert_eq!(backoff_ms(u64::MAX, 3), u64::MAX);
        assert_eq!(backoff_ms(0, 100), 0);
    }

    #[tokio::test]
    async fn default_config_makes_a_single_call() {
        let generator = ScriptedGenerator::new(vec![
            Ok(Completion::text("not json")),
            Ok(Completion::text(GOOD)),
        ]);
        let err = restructure_rent_roll(&generator, &tables(), &ServiceConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfTableError::MalformedReply { attempts: 1, .. }));
        assert_eq!(generator.calls(), 1);
    }

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&ServiceConfig::default());
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn openai_without_key_is_not_configured() {
        let err = resolve_provider(&ServiceConfig::default()).err().unwrap();
        assert!(matches!(err, PdfTableError::ProviderNotConfigured { .. }));
    }
}
