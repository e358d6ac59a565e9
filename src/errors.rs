/*!
 * Error types for the zhlesson library.
 *
 * This module contains the typed errors crossing component boundaries,
 * using the thiserror crate for ergonomic error definitions. Internal
 * plumbing (database, config files) uses `anyhow` and is wrapped into
 * `IngestError::Persistence` where it reaches the pipeline.
 */

use thiserror::Error;

/// Errors that can occur when calling a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting or quota
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not complete within the configured timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),
}

impl ProviderError {
    /// Whether a retry of the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::RequestFailed(_) | Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that can occur while parsing an SRT upload.
///
/// `cue_index` is the numeric index written in the file when it could be read,
/// otherwise the 1-based position of the block. `line` is 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    /// The first line of a block is not a cue number
    #[error("cue {cue_index}: invalid index line {line}: {content:?}")]
    InvalidIndex {
        cue_index: usize,
        line: usize,
        content: String,
    },

    /// The timestamp line is missing or does not follow `HH:MM:SS,mmm --> HH:MM:SS,mmm`
    #[error("cue {cue_index}: invalid timestamp line {line}: {content:?}")]
    InvalidTimestamp {
        cue_index: usize,
        line: usize,
        content: String,
    },

    /// A cue ends before (or when) it starts
    #[error("cue {cue_index}: end time {end_ms} ms is not after start time {start_ms} ms")]
    InvalidTimeRange {
        cue_index: usize,
        start_ms: u64,
        end_ms: u64,
    },

    /// A cue starts before the previous cue
    #[error("cue {cue_index}: start time {start_ms} ms precedes previous cue start {previous_start_ms} ms")]
    NonMonotonicStart {
        cue_index: usize,
        start_ms: u64,
        previous_start_ms: u64,
    },

    /// The upload contains no cue with text
    #[error("subtitle file contains no cues with text")]
    NoCues,
}

impl SubtitleError {
    /// Cue the error refers to, when there is one
    pub fn cue_index(&self) -> Option<usize> {
        match self {
            Self::InvalidIndex { cue_index, .. }
            | Self::InvalidTimestamp { cue_index, .. }
            | Self::InvalidTimeRange { cue_index, .. }
            | Self::NonMonotonicStart { cue_index, .. } => Some(*cue_index),
            Self::NoCues => None,
        }
    }
}

/// Coarse classification of an ingestion failure, for the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestErrorKind {
    Validation,
    MalformedInput,
    Persistence,
    Cancelled,
}

/// Errors that abort an ingestion. Nothing is persisted when one is returned.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A request field is missing or invalid
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending request field
        field: &'static str,
        /// Human readable reason
        message: String,
    },

    /// The SRT upload could not be parsed
    #[error("malformed subtitle input: {0}")]
    MalformedInput(#[from] SubtitleError),

    /// The store rejected the lesson
    #[error("failed to persist lesson: {0:#}")]
    Persistence(#[source] anyhow::Error),

    /// The caller cancelled the ingestion before it was persisted
    #[error("ingestion cancelled")]
    Cancelled,
}

impl IngestError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> IngestErrorKind {
        match self {
            Self::Validation { .. } => IngestErrorKind::Validation,
            Self::MalformedInput(_) => IngestErrorKind::MalformedInput,
            Self::Persistence(_) => IngestErrorKind::Persistence,
            Self::Cancelled => IngestErrorKind::Cancelled,
        }
    }
}
