/*!
 * # zhlesson - Chinese lesson ingestion
 *
 * Turns Chinese text and SRT subtitle uploads into persisted lessons:
 * sentences segmented on terminal punctuation, tokens matched against a
 * CC-CEDICT dictionary, optional machine translations per sentence.
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT decoding and parsing
 * - `dictionary`: Lemma lookup capability, in-memory snapshot, CEDICT parser
 * - `ingest`: The ingestion pipeline:
 *   - `ingest::normalizer`, `ingest::segmenter`, `ingest::tokenizer`
 *   - `ingest::resolver`, `ingest::translation`, `ingest::assembler`
 *   - `ingest::pipeline`: `Ingestor` entry points
 * - `lesson`: Lesson aggregate types
 * - `database`: SQLite persistence (`LessonStore`, dictionary import)
 * - `providers`: Translation backends (Ollama, Anthropic, mock)
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod database;
pub mod dictionary;
pub mod errors;
pub mod ingest;
pub mod language_utils;
pub mod lesson;
pub mod providers;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{LessonStore, Repository};
pub use dictionary::{DictionaryLookup, InMemoryDictionary};
pub use errors::{IngestError, IngestErrorKind, ProviderError, SubtitleError};
pub use ingest::{Ingestor, SrtIngestRequest, TextIngestRequest};
pub use lesson::{IngestOutcome, Lesson};
