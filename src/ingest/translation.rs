/*!
 * Best-effort sentence translation.
 *
 * Each sentence is translated independently with bounded parallelism. A
 * failed, empty or timed out call only affects its own sentence; the
 * orchestrator never returns an error. Cancellation stops new calls and
 * abandons in-flight ones.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::lesson::{Translation, TranslationSource};
use crate::providers::Translator;

/// Bounded retry of transient failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Delay before retry n is `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOptions {
    pub max_concurrent_requests: usize,
    /// Per-call timeout; an expired call is a failure
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Result for one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(Translation),
    /// The backend failed; the message is kept for logs and stats
    Failed(String),
    /// No call was made: translation disabled or ingestion cancelled
    Skipped,
}

impl TranslationOutcome {
    pub fn into_translation(self) -> Option<Translation> {
        match self {
            Self::Translated(translation) => Some(translation),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

pub struct TranslationOrchestrator {
    translator: Arc<dyn Translator>,
    options: TranslationOptions,
}

impl TranslationOrchestrator {
    pub fn new(translator: Arc<dyn Translator>, options: TranslationOptions) -> Self {
        Self { translator, options }
    }

    /// Translate every sentence, returning outcomes in input order
    pub async fn translate_all(
        &self,
        sentences: &[String],
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Vec<TranslationOutcome> {
        let max_concurrent = self.options.max_concurrent_requests.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let start_time = Instant::now();

        let mut results: Vec<(usize, TranslationOutcome)> = stream::iter(sentences.iter().enumerate())
            .map(|(index, text)| {
                let semaphore = semaphore.clone();
                async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return (index, TranslationOutcome::Skipped);
                    };
                    if cancel.is_cancelled() {
                        return (index, TranslationOutcome::Skipped);
                    }
                    let outcome = self.translate_one(text, source_language, target_language, cancel).await;
                    (index, outcome)
                }
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

        // Restore sentence order
        results.sort_by_key(|(index, _)| *index);

        let failed = results.iter().filter(|(_, o)| o.is_failed()).count();
        debug!(
            "Translated {} sentences with {} in {:?} ({} failed)",
            sentences.len(),
            self.translator.name(),
            start_time.elapsed(),
            failed
        );

        results.into_iter().map(|(_, outcome)| outcome).collect()
    }

    async fn translate_one(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> TranslationOutcome {
        let mut attempt = 0;

        loop {
            let call = tokio::time::timeout(
                self.options.timeout,
                self.translator.translate(text, source_language, target_language),
            );
            let result = tokio::select! {
                _ = cancel.cancelled() => return TranslationOutcome::Skipped,
                result = call => result,
            };

            let error = match result {
                Ok(Ok(translated)) if !translated.trim().is_empty() => {
                    return TranslationOutcome::Translated(Translation {
                        language: target_language.to_string(),
                        text: translated.trim().to_string(),
                        source: TranslationSource::Machine,
                    });
                }
                Ok(Ok(_)) => ProviderError::ParseError("empty translation".to_string()),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(self.options.timeout.as_millis() as u64),
            };

            if attempt < self.options.retry.max_retries && error.is_transient() {
                attempt += 1;
                let delay = self.options.retry.backoff * attempt;
                debug!("Retrying translation in {:?} (attempt {}): {}", delay, attempt + 1, error);
                tokio::select! {
                    _ = cancel.cancelled() => return TranslationOutcome::Skipped,
                    _ = tokio::time::sleep(delay) => {}
                }
                continue;
            }

            warn!("Translation failed for '{}': {}", preview(text), error);
            return TranslationOutcome::Failed(error.to_string());
        }
    }
}

fn preview(text: &str) -> String {
    let mut shown: String = text.chars().take(20).collect();
    if text.chars().count() > 20 {
        shown.push('…');
    }
    shown
}
