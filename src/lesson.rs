/*!
 * Lesson aggregate and the entities it owns.
 *
 * A `Lesson` is built in memory by one ingestion and handed to the store as
 * a whole. Nothing in here is mutated after assembly; tokens refer to
 * dictionary lemmas by id only.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::dictionary::{DictionaryLookup, Lemma, LemmaId};

/// Timing window of a subtitle cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingWindow {
    /// Cue number as written in the SRT file
    pub cue_index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TimingWindow {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// One block of source text: a whole text upload or one subtitle cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub name: String,
    pub text: String,
    /// 1-based position within the lesson
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_window: Option<TimingWindow>,
}

/// Classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Dictionary hit
    Word,
    Punctuation,
    Whitespace,
    /// Single character with no dictionary entry
    Unknown,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Punctuation => "punctuation",
            Self::Whitespace => "whitespace",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "word" => Ok(Self::Word),
            "punctuation" => Ok(Self::Punctuation),
            "whitespace" => Ok(Self::Whitespace),
            "unknown" => Ok(Self::Unknown),
            _ => Err(anyhow::anyhow!("Invalid token kind: {}", s)),
        }
    }
}

/// Smallest segmented unit of a sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// 1-based position within the sentence
    pub index: u32,
    pub text: String,
    pub kind: TokenKind,
    /// Weak reference into the dictionary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lemma_id: Option<LemmaId>,
    /// Character offsets relative to the sentence text
    pub start_char: usize,
    pub end_char: usize,
}

impl Token {
    /// Resolve the referenced lemma through a dictionary lookup
    pub fn lemma(&self, dictionary: &dyn DictionaryLookup) -> Option<Lemma> {
        self.lemma_id.and_then(|id| dictionary.lemma(id))
    }

    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }
}

/// Who produced a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationSource {
    Machine,
    /// Reserved for manual editing
    Human,
}

impl TranslationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::Human => "human",
        }
    }
}

impl FromStr for TranslationSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "machine" => Ok(Self::Machine),
            "human" => Ok(Self::Human),
            _ => Err(anyhow::anyhow!("Invalid translation source: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub language: String,
    pub text: String,
    pub source: TranslationSource,
}

/// A sentence with its tokens and translations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// 1-based position within the lesson
    pub index: u32,
    /// `order` of the owning source unit
    pub source_order: u32,
    pub text: String,
    /// Character offsets into the source unit text
    pub start_char: usize,
    pub end_char: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_ms: Option<u64>,
    pub tokens: Vec<Token>,
    pub translations: Vec<Translation>,
}

impl Sentence {
    /// Machine or human translation into `language`, machine first
    pub fn translation(&self, language: &str) -> Option<&Translation> {
        self.translations
            .iter()
            .filter(|t| t.language == language)
            .min_by_key(|t| t.source == TranslationSource::Human)
    }
}

/// How the lesson content was supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestKind {
    Text,
    Srt,
}

/// Summary statistics computed at assembly time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonStats {
    pub sentence_count: usize,
    pub token_count: usize,
    pub word_count: usize,
    pub unknown_token_count: usize,
    pub translated_sentence_count: usize,
    pub failed_translation_count: usize,
    /// Longest dictionary match attempted by the tokenizer
    pub max_lemma_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonMeta {
    pub ingest: IngestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub stats: LessonStats,
    pub missing_characters: Vec<char>,
}

/// Aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub source_language: String,
    pub target_language: String,
    pub meta: LessonMeta,
    pub sources: Vec<SourceUnit>,
    pub sentences: Vec<Sentence>,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    pub fn missing_characters(&self) -> &[char] {
        &self.meta.missing_characters
    }

    pub fn source(&self, order: u32) -> Option<&SourceUnit> {
        self.sources.iter().find(|s| s.order == order)
    }

    /// Sentences cut from the given source unit, in order
    pub fn sentences_of(&self, order: u32) -> impl Iterator<Item = &Sentence> {
        self.sentences.iter().filter(move |s| s.source_order == order)
    }
}

/// Result handed to the HTTP boundary after a successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub lesson: Lesson,
    pub created: bool,
    pub sentence_count: usize,
    pub missing_characters: Vec<char>,
}

impl IngestOutcome {
    pub fn created(lesson: Lesson) -> Self {
        Self {
            sentence_count: lesson.sentence_count(),
            missing_characters: lesson.meta.missing_characters.clone(),
            created: true,
            lesson,
        }
    }
}

/// Lightweight row for lesson listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonSummary {
    pub id: Uuid,
    pub title: String,
    pub source_language: String,
    pub target_language: String,
    pub sentence_count: usize,
    pub created_at: DateTime<Utc>,
}
