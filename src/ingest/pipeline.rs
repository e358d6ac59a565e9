/*!
 * Ingestion entry points.
 *
 * An `Ingestor` owns the shared, read-only collaborators (dictionary,
 * translator, lesson store) and runs one pipeline per request:
 * validate, normalize, segment, then tokenize and translate side by side,
 * assemble, and finally persist in a single call to the store.
 */

use log::{debug, info};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::database::LessonStore;
use crate::dictionary::DictionaryLookup;
use crate::errors::IngestError;
use crate::ingest::assembler::{self, LessonDraft, LessonHeader, SentenceDraft};
use crate::ingest::normalizer;
use crate::ingest::resolver::LemmaResolver;
use crate::ingest::segmenter::{Segmenter, SegmenterConfig, SentenceSpan, cap_cue_overlaps};
use crate::ingest::tokenizer::Tokenizer;
use crate::ingest::translation::{TranslationOptions, TranslationOrchestrator, TranslationOutcome};
use crate::language_utils;
use crate::lesson::{IngestKind, IngestOutcome, SourceUnit, Token};
use crate::providers::Translator;
use crate::subtitle_processor::decode_srt_bytes;

pub const MAX_TITLE_CHARS: usize = 255;
pub const DEFAULT_SOURCE_LANGUAGE: &str = "zh";
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

/// Plain text ingestion request
#[derive(Debug, Clone)]
pub struct TextIngestRequest {
    pub title: String,
    pub text: String,
    /// Source unit name; defaults to the title
    pub name: Option<String>,
    pub source_language: String,
    pub target_language: String,
    /// Request machine translations
    pub translate: bool,
}

impl TextIngestRequest {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            name: None,
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            translate: true,
        }
    }
}

/// Subtitle upload ingestion request
#[derive(Debug, Clone)]
pub struct SrtIngestRequest {
    pub title: String,
    /// Decoded file content
    pub content: String,
    /// Uploaded file name, used when `name` is absent
    pub file_name: Option<String>,
    pub name: Option<String>,
    pub source_language: String,
    pub target_language: String,
    pub translate: bool,
    pub audio_url: Option<String>,
}

impl SrtIngestRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            file_name: None,
            name: None,
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            translate: true,
            audio_url: None,
        }
    }

    /// Build a request from raw upload bytes
    pub fn from_bytes(title: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(title, decode_srt_bytes(bytes))
    }

    /// Unit name: explicit name, else uploaded file name, else title
    fn unit_name(&self, title: &str) -> String {
        [self.name.as_deref(), self.file_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|n| !n.is_empty())
            .unwrap_or(title)
            .to_string()
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub segmenter: SegmenterConfig,
    /// Upper bound on dictionary match length, below the longest form
    pub max_lemma_chars: Option<usize>,
    pub translation: TranslationOptions,
}

pub struct Ingestor {
    dictionary: Arc<dyn DictionaryLookup>,
    translator: Option<Arc<dyn Translator>>,
    store: Arc<dyn LessonStore>,
    options: IngestOptions,
}

impl Ingestor {
    pub fn new(dictionary: Arc<dyn DictionaryLookup>, store: Arc<dyn LessonStore>) -> Self {
        Self {
            dictionary,
            translator: None,
            store,
            options: IngestOptions::default(),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dictionary(&self) -> &Arc<dyn DictionaryLookup> {
        &self.dictionary
    }

    /// Ingest a plain text upload as one source unit
    pub async fn ingest_text(
        &self,
        request: TextIngestRequest,
        cancel: &CancellationToken,
    ) -> Result<IngestOutcome, IngestError> {
        let header = validate_header(
            &request.title,
            &request.source_language,
            &request.target_language,
            IngestKind::Text,
            None,
        )?;
        if request.text.trim().is_empty() {
            return Err(IngestError::validation("text", "must not be empty"));
        }

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&header.title)
            .to_string();
        let units = normalizer::normalize_text(&name, &request.text);

        self.run(header, units, request.translate, cancel).await
    }

    /// Ingest a subtitle upload, one source unit per cue with text
    pub async fn ingest_srt(
        &self,
        request: SrtIngestRequest,
        cancel: &CancellationToken,
    ) -> Result<IngestOutcome, IngestError> {
        let audio_url = request
            .audio_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let header = validate_header(
            &request.title,
            &request.source_language,
            &request.target_language,
            IngestKind::Srt,
            audio_url,
        )?;

        let name = request.unit_name(&header.title);
        let units = normalizer::normalize_srt(&name, &request.content)?;

        self.run(header, units, request.translate, cancel).await
    }

    async fn run(
        &self,
        header: LessonHeader,
        units: Vec<SourceUnit>,
        translate_enabled: bool,
        cancel: &CancellationToken,
    ) -> Result<IngestOutcome, IngestError> {
        let segmenter = Segmenter::new(self.options.segmenter.clone());
        let mut spans: Vec<(u32, SentenceSpan)> = units
            .iter()
            .flat_map(|unit| segmenter.segment(unit).into_iter().map(move |span| (unit.order, span)))
            .collect();
        cap_cue_overlaps(&mut spans);
        let texts: Vec<String> = spans.iter().map(|(_, span)| span.text.clone()).collect();
        debug!("Segmented {} units into {} sentences", units.len(), texts.len());

        let tokenize = self.tokenize(texts.clone());
        let translate = self.translate(&texts, &header, translate_enabled, cancel);
        let (tokenized, translations) = tokio::join!(tokenize, translate);
        let (token_lists, max_lemma_chars) = tokenized?;

        let mut resolver = LemmaResolver::new(self.dictionary.as_ref());
        let sentences: Vec<SentenceDraft> = spans
            .into_iter()
            .zip(token_lists)
            .map(|((source_order, span), tokens)| SentenceDraft {
                source_order,
                span,
                tokens: resolver.resolve(tokens),
            })
            .collect();
        let resolution = resolver.finish();

        let lesson = assembler::assemble(LessonDraft {
            header,
            sources: units,
            sentences,
            translations,
            resolution,
            max_lemma_chars,
        });

        if cancel.is_cancelled() {
            info!("Ingestion of '{}' cancelled before persisting", lesson.title);
            return Err(IngestError::Cancelled);
        }

        self.store
            .save_lesson(&lesson)
            .await
            .map_err(IngestError::Persistence)?;

        info!(
            "Saved lesson '{}' ({}): {} sentences, {} missing characters",
            lesson.title,
            lesson.id,
            lesson.sentence_count(),
            lesson.missing_characters().len()
        );
        Ok(IngestOutcome::created(lesson))
    }

    /// Tokenize every sentence on the blocking pool
    async fn tokenize(&self, texts: Vec<String>) -> Result<(Vec<Vec<Token>>, usize), IngestError> {
        let dictionary = self.dictionary.clone();
        let limit = self.options.max_lemma_chars;

        let handle = tokio::task::spawn_blocking(move || {
            let tokenizer = Tokenizer::new(dictionary.as_ref(), limit);
            let tokens = texts.iter().map(|text| tokenizer.tokenize(text)).collect();
            (tokens, tokenizer.max_lemma_chars())
        });

        match handle.await {
            Ok(result) => Ok(result),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            // Runtime shutting down
            Err(_) => Err(IngestError::Cancelled),
        }
    }

    async fn translate(
        &self,
        texts: &[String],
        header: &LessonHeader,
        enabled: bool,
        cancel: &CancellationToken,
    ) -> Vec<TranslationOutcome> {
        match &self.translator {
            Some(translator) if enabled => {
                let orchestrator = TranslationOrchestrator::new(translator.clone(), self.options.translation.clone());
                orchestrator
                    .translate_all(texts, &header.source_language, &header.target_language, cancel)
                    .await
            }
            _ => vec![TranslationOutcome::Skipped; texts.len()],
        }
    }
}

/// Check title and languages before any work is done
fn validate_header(
    title: &str,
    source_language: &str,
    target_language: &str,
    ingest: IngestKind,
    audio_url: Option<String>,
) -> Result<LessonHeader, IngestError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(IngestError::validation("title", "must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(IngestError::validation(
            "title",
            format!("must be at most {} characters", MAX_TITLE_CHARS),
        ));
    }

    let source_language = language_utils::normalize_language_code(source_language)
        .map_err(|e| IngestError::validation("source_language", e.to_string()))?;
    if !language_utils::is_chinese(&source_language) {
        return Err(IngestError::validation(
            "source_language",
            format!("unsupported source language '{}', only Chinese is supported", source_language),
        ));
    }
    let target_language = language_utils::normalize_language_code(target_language)
        .map_err(|e| IngestError::validation("target_language", e.to_string()))?;

    Ok(LessonHeader {
        title: title.to_string(),
        source_language,
        target_language,
        ingest,
        audio_url,
    })
}
