/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the dictionary and lesson tables
 * and handles schema migrations for version upgrades. Everything a lesson
 * owns cascades on lesson delete; token lemma ids are plain integers so a
 * dictionary re-import never touches stored lessons.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Database schema v{} is newer than supported v{}",
            current_version,
            SCHEMA_VERSION
        ));
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // Dictionary
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS lemmas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            traditional TEXT NOT NULL,
            simplified TEXT NOT NULL,
            pinyin_numbers TEXT NOT NULL,
            UNIQUE(traditional, simplified, pinyin_numbers)
        );

        CREATE INDEX IF NOT EXISTS idx_lemmas_simplified ON lemmas(simplified);
        CREATE INDEX IF NOT EXISTS idx_lemmas_traditional ON lemmas(traditional);

        CREATE TABLE IF NOT EXISTS senses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lemma_id INTEGER NOT NULL REFERENCES lemmas(id) ON DELETE CASCADE,
            sense_index INTEGER NOT NULL,
            gloss TEXT NOT NULL,
            UNIQUE(lemma_id, sense_index)
        );
        "#,
    )?;

    // Lessons
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            source_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            meta TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_lessons_created ON lessons(created_at);

        CREATE TABLE IF NOT EXISTS source_texts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lesson_id TEXT NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
            unit_order INTEGER NOT NULL,
            name TEXT NOT NULL,
            text TEXT NOT NULL,
            cue_index INTEGER,
            start_ms INTEGER,
            end_ms INTEGER,
            UNIQUE(lesson_id, unit_order)
        );

        CREATE TABLE IF NOT EXISTS sentences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lesson_id TEXT NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
            sentence_index INTEGER NOT NULL,
            source_order INTEGER NOT NULL,
            text TEXT NOT NULL,
            start_char INTEGER NOT NULL,
            end_char INTEGER NOT NULL,
            start_ms INTEGER,
            end_ms INTEGER,
            UNIQUE(lesson_id, sentence_index)
        );

        CREATE TABLE IF NOT EXISTS sentence_tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sentence_id INTEGER NOT NULL REFERENCES sentences(id) ON DELETE CASCADE,
            token_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('word', 'punctuation', 'whitespace', 'unknown')),
            lemma_id INTEGER,
            start_char INTEGER NOT NULL,
            end_char INTEGER NOT NULL,
            UNIQUE(sentence_id, token_index)
        );

        CREATE INDEX IF NOT EXISTS idx_tokens_lemma ON sentence_tokens(lemma_id);

        CREATE TABLE IF NOT EXISTS sentence_translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sentence_id INTEGER NOT NULL REFERENCES sentences(id) ON DELETE CASCADE,
            language TEXT NOT NULL,
            text TEXT NOT NULL,
            source TEXT NOT NULL CHECK (source IN ('machine', 'human'))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_translations_machine
            ON sentence_translations(sentence_id, language) WHERE source = 'machine';
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    let current = from_version;

    if current < SCHEMA_VERSION {
        // No released version precedes v1 yet
        return Err(anyhow::anyhow!(
            "Unknown schema version: {}. Cannot migrate.",
            current
        ));
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}
