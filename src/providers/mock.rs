/*!
 * Mock translator implementations for testing.
 *
 * This module provides a mock translator that simulates different behaviors:
 * - `MockTranslator::working()` - Always succeeds with a tagged translation
 * - `MockTranslator::intermittent(n)` - Fails every nth request
 * - `MockTranslator::failing()` - Always fails with an error
 * - `MockTranslator::slow(ms)` - Succeeds after a delay (timeout testing)
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Translator;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with a server error
    Failing,
    /// Returns empty text
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
    /// Fails with a transient error for the first N requests, then succeeds
    TransientThenSuccess { failures: usize },
    /// Fails only for sentences containing the given text
    FailOn { needle: &'static str },
}

/// Mock translator for testing the orchestrator and the pipeline
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    /// Shared between clones
    request_count: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn transient_then_success(failures: usize) -> Self {
        Self::new(MockBehavior::TransientThenSuccess { failures })
    }

    pub fn fail_on(needle: &'static str) -> Self {
        Self::new(MockBehavior::FailOn { needle })
    }

    /// Number of translate calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Text a working mock returns for `text`
    pub fn expected_translation(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let translated = Self::expected_translation(text, target_language);

        match self.behavior {
            MockBehavior::Working => Ok(translated),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(translated)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(translated)
            }

            MockBehavior::TransientThenSuccess { failures } => {
                if count < failures {
                    Err(ProviderError::RateLimitExceeded(format!("Simulated quota hit #{}", count + 1)))
                } else {
                    Ok(translated)
                }
            }

            MockBehavior::FailOn { needle } => {
                if text.contains(needle) {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated failure for '{}'", text),
                        status_code: 400,
                    })
                } else {
                    Ok(translated)
                }
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
