/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access:
 * - lesson aggregates, saved in one transaction and read back whole
 * - dictionary maintenance (CEDICT import, snapshot loading)
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::collections::HashMap;
use uuid::Uuid;

use super::connection::DatabaseConnection;
use crate::dictionary::{CedictEntry, InMemoryDictionary, Lemma, Sense};
use crate::lesson::{
    Lesson, LessonMeta, LessonSummary, Sentence, SourceUnit, TimingWindow, Token, Translation,
};

/// Durable storage of lesson aggregates
#[async_trait]
pub trait LessonStore: Send + Sync {
    /// Save the whole lesson atomically; on failure nothing is visible
    async fn save_lesson(&self, lesson: &Lesson) -> Result<Uuid>;

    /// Load a lesson with its sources, sentences, tokens and translations
    async fn get_lesson(&self, id: Uuid) -> Result<Option<Lesson>>;

    /// Lesson summaries, newest first
    async fn list_lessons(&self) -> Result<Vec<LessonSummary>>;

    /// Delete a lesson and everything it owns. Returns false if it did not exist.
    async fn delete_lesson(&self, id: Uuid) -> Result<bool>;
}

/// Result of a dictionary import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub senses: usize,
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Dictionary Operations
    // =========================================================================

    /// Insert or update lemmas keyed on (traditional, simplified, pinyin).
    ///
    /// Senses of an existing lemma are replaced. The whole import is one
    /// transaction.
    pub async fn import_lemmas(&self, entries: Vec<CedictEntry>) -> Result<ImportSummary> {
        let total = entries.len();

        let summary = self
            .db
            .transaction_async(move |tx| {
                let mut summary = ImportSummary::default();
                for entry in &entries {
                    let existed = Self::upsert_lemma(tx, entry)?;
                    if existed {
                        summary.updated += 1;
                    } else {
                        summary.inserted += 1;
                    }
                    summary.senses += entry.glosses.len();
                }
                Ok(summary)
            })
            .await
            .context("Dictionary import failed")?;

        info!(
            "Imported {} dictionary entries ({} new, {} updated, {} senses)",
            total, summary.inserted, summary.updated, summary.senses
        );
        Ok(summary)
    }

    /// Returns whether the lemma already existed
    fn upsert_lemma(tx: &Transaction, entry: &CedictEntry) -> Result<bool> {
        let existing: Option<i64> = tx
            .prepare_cached(
                "SELECT id FROM lemmas WHERE traditional = ?1 AND simplified = ?2 AND pinyin_numbers = ?3",
            )?
            .query_row(
                params![entry.traditional, entry.simplified, entry.pinyin_numbers],
                |row| row.get(0),
            )
            .optional()?;

        let lemma_id = match existing {
            Some(id) => {
                tx.prepare_cached("DELETE FROM senses WHERE lemma_id = ?1")?.execute([id])?;
                id
            }
            None => {
                tx.prepare_cached(
                    "INSERT INTO lemmas (traditional, simplified, pinyin_numbers) VALUES (?1, ?2, ?3)",
                )?
                .execute(params![entry.traditional, entry.simplified, entry.pinyin_numbers])?;
                tx.last_insert_rowid()
            }
        };

        let mut insert_sense =
            tx.prepare_cached("INSERT INTO senses (lemma_id, sense_index, gloss) VALUES (?1, ?2, ?3)")?;
        for (i, gloss) in entry.glosses.iter().enumerate() {
            insert_sense.execute(params![lemma_id, i as i64 + 1, gloss])?;
        }

        Ok(existing.is_some())
    }

    /// Load the whole dictionary into an in-memory snapshot
    pub async fn load_dictionary(&self) -> Result<InMemoryDictionary> {
        let dictionary = self
            .db
            .execute_async(|conn| {
                let mut senses: HashMap<i64, Vec<Sense>> = HashMap::new();
                let mut stmt =
                    conn.prepare("SELECT id, lemma_id, sense_index, gloss FROM senses ORDER BY lemma_id, sense_index")?;
                let rows = stmt.query_map([], |row| {
                    Ok(Sense {
                        id: row.get(0)?,
                        lemma_id: row.get(1)?,
                        sense_index: row.get(2)?,
                        gloss: row.get(3)?,
                    })
                })?;
                for sense in rows {
                    let sense = sense?;
                    senses.entry(sense.lemma_id).or_default().push(sense);
                }

                let mut stmt = conn.prepare("SELECT id, traditional, simplified, pinyin_numbers FROM lemmas")?;
                let lemmas = stmt
                    .query_map([], |row| {
                        let id: i64 = row.get(0)?;
                        Ok(Lemma {
                            id,
                            traditional: row.get(1)?,
                            simplified: row.get(2)?,
                            pinyin_numbers: row.get(3)?,
                            senses: Vec::new(),
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(InMemoryDictionary::from_lemmas(lemmas.into_iter().map(|mut lemma| {
                    lemma.senses = senses.remove(&lemma.id).unwrap_or_default();
                    lemma
                })))
            })
            .await?;

        debug!("Loaded dictionary snapshot with {} lemmas", dictionary.len());
        Ok(dictionary)
    }

    /// Number of lemmas in the store
    pub async fn lemma_count(&self) -> Result<i64> {
        self.db
            .execute_async(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM lemmas", [], |row| row.get(0))?))
            .await
    }

    // =========================================================================
    // Lesson Operations
    // =========================================================================

    fn insert_lesson(tx: &Transaction, lesson: &Lesson) -> Result<()> {
        let lesson_id = lesson.id.to_string();
        let meta = serde_json::to_string(&lesson.meta).context("Failed to serialize lesson meta")?;

        tx.execute(
            r#"
            INSERT INTO lessons (id, title, source_language, target_language, meta, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                lesson_id,
                lesson.title,
                lesson.source_language,
                lesson.target_language,
                meta,
                lesson.created_at.to_rfc3339(),
            ],
        )?;

        let mut insert_source = tx.prepare_cached(
            r#"
            INSERT INTO source_texts (lesson_id, unit_order, name, text, cue_index, start_ms, end_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;
        for source in &lesson.sources {
            let window = source.timing_window.as_ref();
            insert_source.execute(params![
                lesson_id,
                source.order,
                source.name,
                source.text,
                window.map(|w| w.cue_index as i64),
                window.map(|w| w.start_ms as i64),
                window.map(|w| w.end_ms as i64),
            ])?;
        }

        let mut insert_sentence = tx.prepare_cached(
            r#"
            INSERT INTO sentences (lesson_id, sentence_index, source_order, text, start_char, end_char, start_ms, end_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;
        let mut insert_token = tx.prepare_cached(
            r#"
            INSERT INTO sentence_tokens (sentence_id, token_index, text, kind, lemma_id, start_char, end_char)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;
        let mut insert_translation = tx.prepare_cached(
            "INSERT INTO sentence_translations (sentence_id, language, text, source) VALUES (?1, ?2, ?3, ?4)",
        )?;

        for sentence in &lesson.sentences {
            insert_sentence.execute(params![
                lesson_id,
                sentence.index,
                sentence.source_order,
                sentence.text,
                sentence.start_char as i64,
                sentence.end_char as i64,
                sentence.start_ms.map(|v| v as i64),
                sentence.end_ms.map(|v| v as i64),
            ])?;
            let sentence_id = tx.last_insert_rowid();

            for token in &sentence.tokens {
                insert_token.execute(params![
                    sentence_id,
                    token.index,
                    token.text,
                    token.kind.as_str(),
                    token.lemma_id,
                    token.start_char as i64,
                    token.end_char as i64,
                ])?;
            }

            for translation in &sentence.translations {
                insert_translation.execute(params![
                    sentence_id,
                    translation.language,
                    translation.text,
                    translation.source.as_str(),
                ])?;
            }
        }

        Ok(())
    }

    fn load_lesson(conn: &Connection, id: Uuid) -> Result<Option<Lesson>> {
        let lesson_id = id.to_string();

        let header = conn
            .query_row(
                "SELECT title, source_language, target_language, meta, created_at FROM lessons WHERE id = ?1",
                [&lesson_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((title, source_language, target_language, meta, created_at)) = header else {
            return Ok(None);
        };
        let meta: LessonMeta = serde_json::from_str(&meta).context("Corrupt lesson meta")?;

        let sources = conn
            .prepare(
                r#"
                SELECT unit_order, name, text, cue_index, start_ms, end_ms
                FROM source_texts WHERE lesson_id = ?1 ORDER BY unit_order
                "#,
            )?
            .query_map([&lesson_id], |row| {
                let cue_index: Option<i64> = row.get(3)?;
                let start_ms: Option<i64> = row.get(4)?;
                let end_ms: Option<i64> = row.get(5)?;
                let timing_window = match (cue_index, start_ms, end_ms) {
                    (Some(cue_index), Some(start_ms), Some(end_ms)) => Some(TimingWindow {
                        cue_index: cue_index as usize,
                        start_ms: start_ms as u64,
                        end_ms: end_ms as u64,
                    }),
                    _ => None,
                };
                Ok(SourceUnit {
                    order: row.get(0)?,
                    name: row.get(1)?,
                    text: row.get(2)?,
                    timing_window,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut tokens: HashMap<i64, Vec<Token>> = HashMap::new();
        let mut stmt = conn.prepare(
            r#"
            SELECT t.sentence_id, t.token_index, t.text, t.kind, t.lemma_id, t.start_char, t.end_char
            FROM sentence_tokens t JOIN sentences s ON s.id = t.sentence_id
            WHERE s.lesson_id = ?1 ORDER BY t.sentence_id, t.token_index
            "#,
        )?;
        let mut rows = stmt.query([&lesson_id])?;
        while let Some(row) = rows.next()? {
            let kind: String = row.get(3)?;
            tokens.entry(row.get(0)?).or_default().push(Token {
                index: row.get(1)?,
                text: row.get(2)?,
                kind: kind.parse()?,
                lemma_id: row.get(4)?,
                start_char: row.get::<_, i64>(5)? as usize,
                end_char: row.get::<_, i64>(6)? as usize,
            });
        }

        let mut translations: HashMap<i64, Vec<Translation>> = HashMap::new();
        let mut stmt = conn.prepare(
            r#"
            SELECT t.sentence_id, t.language, t.text, t.source
            FROM sentence_translations t JOIN sentences s ON s.id = t.sentence_id
            WHERE s.lesson_id = ?1 ORDER BY t.id
            "#,
        )?;
        let mut rows = stmt.query([&lesson_id])?;
        while let Some(row) = rows.next()? {
            let source: String = row.get(3)?;
            translations.entry(row.get(0)?).or_default().push(Translation {
                language: row.get(1)?,
                text: row.get(2)?,
                source: source.parse()?,
            });
        }

        let sentences = conn
            .prepare(
                r#"
                SELECT id, sentence_index, source_order, text, start_char, end_char, start_ms, end_ms
                FROM sentences WHERE lesson_id = ?1 ORDER BY sentence_index
                "#,
            )?
            .query_map([&lesson_id], |row| {
                let sentence_id: i64 = row.get(0)?;
                Ok(Sentence {
                    index: row.get(1)?,
                    source_order: row.get(2)?,
                    text: row.get(3)?,
                    start_char: row.get::<_, i64>(4)? as usize,
                    end_char: row.get::<_, i64>(5)? as usize,
                    start_ms: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
                    end_ms: row.get::<_, Option<i64>>(7)?.map(|v| v as u64),
                    tokens: tokens.remove(&sentence_id).unwrap_or_default(),
                    translations: translations.remove(&sentence_id).unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(Lesson {
            id,
            title,
            source_language,
            target_language,
            meta,
            sources,
            sentences,
            created_at: parse_timestamp(&created_at)?,
        }))
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp: {}", value))?
        .with_timezone(&Utc))
}

#[async_trait]
impl LessonStore for Repository {
    async fn save_lesson(&self, lesson: &Lesson) -> Result<Uuid> {
        let lesson = lesson.clone();
        let id = lesson.id;

        self.db
            .transaction_async(move |tx| Self::insert_lesson(tx, &lesson))
            .await
            .with_context(|| format!("Failed to save lesson {}", id))?;

        debug!("Lesson {} committed", id);
        Ok(id)
    }

    async fn get_lesson(&self, id: Uuid) -> Result<Option<Lesson>> {
        self.db.execute_async(move |conn| Self::load_lesson(conn, id)).await
    }

    async fn list_lessons(&self) -> Result<Vec<LessonSummary>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT l.id, l.title, l.source_language, l.target_language, l.created_at,
                           (SELECT COUNT(*) FROM sentences s WHERE s.lesson_id = l.id)
                    FROM lessons l ORDER BY l.created_at DESC, l.id
                    "#,
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, i64>(5)?,
                        ))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                rows.into_iter()
                    .map(|(id, title, source_language, target_language, created_at, count)| {
                        Ok(LessonSummary {
                            id: Uuid::parse_str(&id).with_context(|| format!("Invalid lesson id: {}", id))?,
                            title,
                            source_language,
                            target_language,
                            sentence_count: count as usize,
                            created_at: parse_timestamp(&created_at)?,
                        })
                    })
                    .collect()
            })
            .await
    }

    async fn delete_lesson(&self, id: Uuid) -> Result<bool> {
        let deleted = self
            .db
            .execute_async(move |conn| {
                Ok(conn.execute("DELETE FROM lessons WHERE id = ?1", [id.to_string()])?)
            })
            .await?;

        if deleted > 0 {
            info!("Deleted lesson {}", id);
        }
        Ok(deleted > 0)
    }
}
