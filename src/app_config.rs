use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::database::DatabaseConnection;
use crate::ingest::segmenter::DEFAULT_TERMINAL_MARKS;
use crate::ingest::{IngestOptions, RetryPolicy, SegmenterConfig, TranslationOptions};
use crate::language_utils;
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::{DEFAULT_SYSTEM_PROMPT, Translator};

/// Application configuration module
/// This module handles loading, validating and saving configuration settings
/// and turns them into pipeline options and translation backends.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO); must be Chinese
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// SQLite database file; platform data dir when absent
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub dictionary: DictionaryConfig,

    #[serde(default)]
    pub segmentation: SegmentationConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    #[default]
    Ollama,
    Anthropic,
}

impl TranslationProvider {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
        }
    }

    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: String,

    #[serde(default = "String::new")]
    pub model: String,

    #[serde(default = "String::new")]
    pub api_key: String,

    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Per-sentence timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
        }
    }
}

/// Dictionary settings
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DictionaryConfig {
    /// Upper bound on dictionary match length in characters
    #[serde(default)]
    pub max_lemma_chars: Option<usize>,

    /// CC-CEDICT file used by `import-cedict` when no path is given
    #[serde(default)]
    pub cedict_path: Option<PathBuf>,
}

/// Sentence segmentation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Characters that end a sentence
    #[serde(default = "default_terminal_marks")]
    pub terminal_marks: String,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            terminal_marks: default_terminal_marks(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Machine translation on ingest
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub provider: TranslationProvider,

    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Extra attempts for transient failures
    #[serde(default)]
    pub retry_count: u32,

    /// Retry n waits `retry_backoff_ms * n`
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<&LogLevel> for log::LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "zh".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_terminal_marks() -> String {
    DEFAULT_TERMINAL_MARKS.to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Config {
    /// Load the configuration file, writing a default one when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader).with_context(|| format!("Failed to parse config file: {:?}", path));
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json).with_context(|| format!("Failed to write config to file: {:?}", path))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let source = language_utils::normalize_language_code(&self.source_language)?;
        if !language_utils::is_chinese(&source) {
            return Err(anyhow!(
                "Source language must be Chinese, got '{}'",
                self.source_language
            ));
        }
        language_utils::normalize_language_code(&self.target_language)?;

        if self.dictionary.max_lemma_chars == Some(0) {
            return Err(anyhow!("dictionary.max_lemma_chars must be at least 1"));
        }

        if self.segmentation.terminal_marks.trim().is_empty() {
            return Err(anyhow!("segmentation.terminal_marks must not be empty"));
        }

        if self.translation.enabled {
            if self.translation.concurrent_requests() == 0 {
                return Err(anyhow!("concurrent_requests must be at least 1"));
            }
            if self.translation.provider == TranslationProvider::Anthropic && self.translation.get_api_key().is_empty() {
                return Err(anyhow!("Translation API key is required for Anthropic provider"));
            }

            // Ollama endpoints may omit the scheme
            let endpoint = self.translation.get_endpoint();
            let absolute = if endpoint.contains("://") {
                endpoint.clone()
            } else {
                format!("http://{}", endpoint)
            };
            url::Url::parse(&absolute).with_context(|| format!("Invalid translation endpoint: {}", endpoint))?;
        }

        Ok(())
    }

    /// Configured database path, or the platform default
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => DatabaseConnection::default_database_path(),
        }
    }

    /// Pipeline options derived from this configuration
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            segmenter: SegmenterConfig::from_marks(&self.segmentation.terminal_marks),
            max_lemma_chars: self.dictionary.max_lemma_chars,
            translation: TranslationOptions {
                max_concurrent_requests: self.translation.concurrent_requests(),
                timeout: Duration::from_secs(self.translation.timeout_secs()),
                retry: RetryPolicy {
                    max_retries: self.translation.common.retry_count,
                    backoff: Duration::from_millis(self.translation.common.retry_backoff_ms),
                },
            },
        }
    }

    /// Translation backend for the active provider, `None` when disabled
    pub fn build_translator(&self) -> Option<Arc<dyn Translator>> {
        if !self.translation.enabled {
            return None;
        }

        let translation = &self.translation;
        let common = &translation.common;
        let timeout = Duration::from_secs(translation.timeout_secs());

        let translator: Arc<dyn Translator> = match translation.provider {
            TranslationProvider::Ollama => Arc::new(
                Ollama::new(translation.get_endpoint(), translation.get_model())
                    .with_system_prompt(&common.system_prompt)
                    .with_temperature(common.temperature)
                    .with_timeout(timeout),
            ),
            TranslationProvider::Anthropic => Arc::new(
                Anthropic::new(translation.get_api_key(), translation.get_endpoint(), translation.get_model())
                    .with_system_prompt(&common.system_prompt)
                    .with_temperature(common.temperature)
                    .with_timeout(timeout),
            ),
        };
        Some(translator)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            database_path: None,
            dictionary: DictionaryConfig::default(),
            segmentation: SegmentationConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type.eq_ignore_ascii_case(&provider_str))
    }

    pub fn concurrent_requests(&self) -> usize {
        self.get_active_provider_config()
            .map(|p| p.concurrent_requests)
            .unwrap_or_else(default_concurrent_requests)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            TranslationProvider::Ollama => default_ollama_model(),
            TranslationProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            TranslationProvider::Ollama => default_ollama_endpoint(),
            TranslationProvider::Anthropic => default_anthropic_endpoint(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::Anthropic),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
