/*!
 * Store behaviour seen through the pipeline: atomic saves, reopening a file
 * database, deletion, and dictionary import
 */

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use zhlesson::database::{DatabaseConnection, LessonStore, Repository};
use zhlesson::dictionary::{CedictOptions, DictionaryLookup, cedict};
use zhlesson::errors::{IngestError, IngestErrorKind};
use zhlesson::ingest::{Ingestor, SrtIngestRequest, TextIngestRequest};
use zhlesson::lesson::TokenKind;
use zhlesson::providers::mock::MockTranslator;

use crate::common::{self, FailingStore};

#[tokio::test]
async fn test_ingest_withFailingStore_shouldReturnPersistenceError() {
    common::init_logging();
    let store = Arc::new(FailingStore::default());
    let ingestor = Ingestor::new(Arc::new(common::sample_dictionary()), store.clone())
        .with_translator(Arc::new(MockTranslator::working()));

    let err = ingestor
        .ingest_text(TextIngestRequest::new("Doomed", "你好。"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), IngestErrorKind::Persistence);
    assert!(matches!(&err, IngestError::Persistence(source) if source.to_string().contains("disk full")));
    assert_eq!(store.attempts(), 1);
}

#[tokio::test]
async fn test_ingest_withFileDatabase_shouldSurviveReopen() -> anyhow::Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let db_path = dir.path().join("lessons.db");

    let lesson = {
        let repository = Repository::new(DatabaseConnection::new(&db_path)?);
        let ingestor = Ingestor::new(Arc::new(common::sample_dictionary()), Arc::new(repository))
            .with_translator(Arc::new(MockTranslator::working()));
        ingestor
            .ingest_srt(SrtIngestRequest::new("Episode", common::SAMPLE_SRT), &CancellationToken::new())
            .await?
            .lesson
    };

    let reopened = Repository::new(DatabaseConnection::new(&db_path)?);
    let stored = reopened.get_lesson(lesson.id).await?.expect("lesson survives reopen");

    assert_eq!(stored.id, lesson.id);
    assert_eq!(stored.title, lesson.title);
    assert_eq!(stored.meta, lesson.meta);
    assert_eq!(stored.sources, lesson.sources);
    assert_eq!(stored.sentences, lesson.sentences);
    assert_eq!(stored.created_at, lesson.created_at);
    Ok(())
}

#[tokio::test]
async fn test_deleteLesson_shouldRemoveEverythingItOwns() {
    let (ingestor, repository) = common::ingestor_with(Some(MockTranslator::working()));
    let cancel = CancellationToken::new();

    let kept = ingestor
        .ingest_text(TextIngestRequest::new("Kept", "你好。"), &cancel)
        .await
        .unwrap();
    let removed = ingestor
        .ingest_srt(SrtIngestRequest::new("Removed", common::SAMPLE_SRT), &cancel)
        .await
        .unwrap();

    assert!(repository.delete_lesson(removed.lesson.id).await.unwrap());

    let stats = repository.connection().stats().unwrap();
    assert_eq!(stats.lesson_count, 1);
    assert_eq!(stats.sentence_count, 1);

    let lessons = repository.list_lessons().await.unwrap();
    assert_eq!(lessons.len(), 1);
    assert_eq!(lessons[0].id, kept.lesson.id);
    assert_eq!(lessons[0].sentence_count, 1);
}

#[tokio::test]
async fn test_ingest_afterCedictImport_shouldUseStoredLemmaIds() -> anyhow::Result<()> {
    common::init_logging();
    let repository = Repository::new_in_memory()?;
    let entries = cedict::parse_str(common::SAMPLE_CEDICT, &CedictOptions::default())?;
    let summary = repository.import_lemmas(entries).await?;
    assert_eq!(summary.inserted, 10);
    assert_eq!(repository.lemma_count().await?, 10);

    let dictionary = Arc::new(repository.load_dictionary().await?);
    let ingestor = Ingestor::new(dictionary.clone(), Arc::new(repository.clone()));

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Stored ids", "學習中文"), &CancellationToken::new())
        .await?;

    let tokens = &outcome.lesson.sentences[0].tokens;
    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Word));

    let lemma = tokens[0].lemma(dictionary.as_ref()).expect("lemma resolves");
    assert_eq!(lemma.simplified, "学习");
    assert_eq!(lemma.senses.len(), 2);
    assert_eq!(dictionary.exact("学习"), vec![lemma.id]);
    Ok(())
}

#[tokio::test]
async fn test_reimport_shouldKeepLessonTokenReferences() -> anyhow::Result<()> {
    let repository = Repository::new_in_memory()?;
    repository
        .import_lemmas(cedict::parse_str(common::SAMPLE_CEDICT, &CedictOptions::default())?)
        .await?;

    let dictionary = Arc::new(repository.load_dictionary().await?);
    let ingestor = Ingestor::new(dictionary, Arc::new(repository.clone()));
    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Before", "你好"), &CancellationToken::new())
        .await?;
    let lemma_id = outcome.lesson.sentences[0].tokens[0].lemma_id;

    // Updating senses keeps lemma rows in place
    repository
        .import_lemmas(cedict::parse_str("你好 你好 [ni3 hao3] /hello/", &CedictOptions::default())?)
        .await?;

    let reloaded = repository.load_dictionary().await?;
    let lemma = reloaded.lemma(lemma_id.unwrap()).unwrap();
    assert_eq!(lemma.senses.len(), 1);
    assert!(repository.get_lesson(outcome.lesson.id).await?.is_some());
    Ok(())
}
