/*!
 * Translation backends.
 *
 * This module contains client implementations for the LLM services used to
 * machine-translate lesson sentences:
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic API integration
 * - Mock: scripted behaviours for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::language_utils;

pub mod anthropic;
pub mod mock;
pub mod ollama;

/// Default system prompt; `{source_language}` and `{target_language}` are substituted
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a translator for language learners. \
Translate the {source_language} sentence you are given into natural {target_language}. \
Reply with the translation only, without notes, quotes or romanization.";

/// Common trait for all translation backends
///
/// Implementations report failures as `ProviderError` values; the caller
/// decides whether a failure is retried or absorbed.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate one sentence
    ///
    /// # Arguments
    /// * `text` - The sentence to translate
    /// * `source_language` - Normalized code of the sentence language
    /// * `target_language` - Normalized code of the requested language
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Fill the language placeholders of a system prompt with English language names
pub fn render_system_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    let name = |code: &str| language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());
    template
        .replace("{source_language}", &name(source_language))
        .replace("{target_language}", &name(target_language))
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        code => ProviderError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

/// Map a transport error to a provider error
pub(crate) fn transport_error(error: reqwest::Error, timeout_ms: u64) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout_ms)
    } else if error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}
