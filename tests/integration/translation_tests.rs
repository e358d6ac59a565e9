/*!
 * Translation failure isolation, retries, timeouts and cancellation
 * through the full ingestion pipeline
 */

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use zhlesson::database::{LessonStore, Repository};
use zhlesson::errors::IngestErrorKind;
use zhlesson::ingest::{IngestOptions, Ingestor, RetryPolicy, TextIngestRequest, TranslationOptions};
use zhlesson::providers::mock::MockTranslator;

use crate::common;

const FIVE_SENTENCES: &str = "你好。我们学习中文。今天好。再见。好！";

fn ingestor(translator: MockTranslator, translation: TranslationOptions) -> (Ingestor, Repository) {
    common::init_logging();
    let repository = Repository::new_in_memory().unwrap();
    let ingestor = Ingestor::new(Arc::new(common::sample_dictionary()), Arc::new(repository.clone()))
        .with_translator(Arc::new(translator))
        .with_options(IngestOptions {
            translation,
            ..IngestOptions::default()
        });
    (ingestor, repository)
}

#[tokio::test]
async fn test_translation_withOneFailingSentence_shouldOnlyDropThatTranslation() {
    let (ingestor, repository) = ingestor(MockTranslator::fail_on("今天"), TranslationOptions::default());

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Partial", FIVE_SENTENCES), &CancellationToken::new())
        .await
        .unwrap();
    let lesson = &outcome.lesson;

    assert_eq!(lesson.sentence_count(), 5);
    for sentence in &lesson.sentences {
        if sentence.text.contains("今天") {
            assert!(sentence.translations.is_empty());
        } else {
            assert_eq!(
                sentence.translation("en").unwrap().text,
                MockTranslator::expected_translation(&sentence.text, "en")
            );
        }
    }
    assert_eq!(lesson.meta.stats.failed_translation_count, 1);
    assert_eq!(lesson.meta.stats.translated_sentence_count, 4);
    assert!(repository.get_lesson(lesson.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_translation_withFailingProvider_shouldStillSaveLesson() {
    let (ingestor, repository) = ingestor(MockTranslator::failing(), TranslationOptions::default());

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Offline", FIVE_SENTENCES), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.lesson.sentences.iter().all(|s| s.translations.is_empty()));
    assert_eq!(outcome.lesson.meta.stats.failed_translation_count, 5);
    assert_eq!(repository.list_lessons().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_translation_withConcurrency_shouldKeepSentenceOrder() {
    let options = TranslationOptions {
        max_concurrent_requests: 3,
        ..TranslationOptions::default()
    };
    let translator = MockTranslator::working();
    let (ingestor, _repository) = ingestor(translator.clone(), options);

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Ordered", FIVE_SENTENCES), &CancellationToken::new())
        .await
        .unwrap();

    for sentence in &outcome.lesson.sentences {
        assert_eq!(
            sentence.translations[0].text,
            MockTranslator::expected_translation(&sentence.text, "en")
        );
    }
    assert_eq!(translator.request_count(), 5);
}

#[tokio::test]
async fn test_translation_withSlowProvider_shouldTimeOutPerSentence() {
    let options = TranslationOptions {
        timeout: Duration::from_millis(20),
        ..TranslationOptions::default()
    };
    let (ingestor, _repository) = ingestor(MockTranslator::slow(2_000), options);

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Slow", "你好。再见。"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.lesson.meta.stats.failed_translation_count, 2);
    assert!(outcome.lesson.sentences.iter().all(|s| s.translations.is_empty()));
}

#[tokio::test]
async fn test_translation_withRetry_shouldRecoverFromTransientError() {
    let options = TranslationOptions {
        max_concurrent_requests: 1,
        retry: RetryPolicy {
            max_retries: 2,
            backoff: Duration::from_millis(1),
        },
        ..TranslationOptions::default()
    };
    let translator = MockTranslator::transient_then_success(1);
    let (ingestor, _repository) = ingestor(translator.clone(), options);

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Retry", "你好。"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.lesson.meta.stats.translated_sentence_count, 1);
    assert_eq!(translator.request_count(), 2);
}

#[tokio::test]
async fn test_translation_withEmptyResponse_shouldCountAsFailure() {
    let (ingestor, _repository) = ingestor(MockTranslator::empty(), TranslationOptions::default());

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Empty", "你好。"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.lesson.sentences[0].translations.is_empty());
    assert_eq!(outcome.lesson.meta.stats.failed_translation_count, 1);
}

#[tokio::test]
async fn test_translation_cancelledMidFlight_shouldAbortWithoutPersisting() {
    let (ingestor, repository) = ingestor(MockTranslator::slow(10_000), TranslationOptions::default());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        ingestor.ingest_text(TextIngestRequest::new("Interrupted", FIVE_SENTENCES), &cancel),
    )
    .await
    .expect("cancellation should stop in-flight translations")
    .unwrap_err();

    assert_eq!(err.kind(), IngestErrorKind::Cancelled);
    assert!(repository.list_lessons().await.unwrap().is_empty());
}
