/*!
 * Lesson assembly.
 *
 * Joins the per-sentence results into one `Lesson`, numbers the sentences and
 * computes the summary statistics. Assembly is pure; persisting the result is
 * the caller's single side effect.
 */

use chrono::Utc;
use uuid::Uuid;

use crate::ingest::resolver::ResolutionReport;
use crate::ingest::segmenter::SentenceSpan;
use crate::ingest::translation::TranslationOutcome;
use crate::lesson::{IngestKind, Lesson, LessonMeta, LessonStats, Sentence, SourceUnit, Token, TokenKind};

/// Validated lesson header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonHeader {
    pub title: String,
    pub source_language: String,
    pub target_language: String,
    pub ingest: IngestKind,
    pub audio_url: Option<String>,
}

/// A segmented sentence with its tokens, waiting for assembly
#[derive(Debug, Clone)]
pub struct SentenceDraft {
    pub source_order: u32,
    pub span: SentenceSpan,
    pub tokens: Vec<Token>,
}

/// Everything one ingestion produced before it becomes a lesson
#[derive(Debug, Clone)]
pub struct LessonDraft {
    pub header: LessonHeader,
    pub sources: Vec<SourceUnit>,
    pub sentences: Vec<SentenceDraft>,
    /// One outcome per sentence, same order
    pub translations: Vec<TranslationOutcome>,
    pub resolution: ResolutionReport,
    pub max_lemma_chars: usize,
}

pub fn assemble(draft: LessonDraft) -> Lesson {
    let LessonDraft {
        header,
        sources,
        sentences,
        translations,
        resolution,
        max_lemma_chars,
    } = draft;

    let failed_translation_count = translations.iter().filter(|o| o.is_failed()).count();
    let mut outcomes = translations.into_iter();

    let sentences: Vec<Sentence> = sentences
        .into_iter()
        .enumerate()
        .map(|(i, draft)| Sentence {
            index: i as u32 + 1,
            source_order: draft.source_order,
            text: draft.span.text,
            start_char: draft.span.start_char,
            end_char: draft.span.end_char,
            start_ms: draft.span.start_ms,
            end_ms: draft.span.end_ms,
            tokens: draft.tokens,
            translations: outcomes
                .next()
                .and_then(TranslationOutcome::into_translation)
                .into_iter()
                .collect(),
        })
        .collect();

    let stats = LessonStats {
        sentence_count: sentences.len(),
        token_count: sentences.iter().map(|s| s.tokens.len()).sum(),
        word_count: count_tokens(&sentences, TokenKind::Word),
        unknown_token_count: count_tokens(&sentences, TokenKind::Unknown),
        translated_sentence_count: sentences.iter().filter(|s| !s.translations.is_empty()).count(),
        failed_translation_count,
        max_lemma_chars,
    };

    Lesson {
        id: Uuid::new_v4(),
        title: header.title,
        source_language: header.source_language,
        target_language: header.target_language,
        meta: LessonMeta {
            ingest: header.ingest,
            audio_url: header.audio_url,
            stats,
            missing_characters: resolution.missing_characters,
        },
        sources,
        sentences,
        created_at: Utc::now(),
    }
}

fn count_tokens(sentences: &[Sentence], kind: TokenKind) -> usize {
    sentences
        .iter()
        .flat_map(|s| s.tokens.iter())
        .filter(|t| t.kind == kind)
        .count()
}
