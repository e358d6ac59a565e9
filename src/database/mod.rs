/*!
 * Database module for persistent storage of lessons and the dictionary.
 *
 * This module provides SQLite-based persistence for:
 * - Dictionary lemmas and senses imported from CC-CEDICT
 * - Lesson aggregates (sources, sentences, tokens, translations)
 */

pub mod connection;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use repository::{ImportSummary, LessonStore, Repository};
