/*!
 * End-to-end tests for plain text ingestion
 */

use tokio_util::sync::CancellationToken;

use zhlesson::database::LessonStore;
use zhlesson::errors::{IngestError, IngestErrorKind};
use zhlesson::ingest::TextIngestRequest;
use zhlesson::lesson::{IngestKind, TokenKind, TranslationSource};
use zhlesson::providers::mock::MockTranslator;

use crate::common;

#[tokio::test]
async fn test_ingestText_withGreeting_shouldBuildAndPersistLesson() {
    let translator = MockTranslator::working();
    let (ingestor, repository) = common::ingestor_with(Some(translator.clone()));

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Greetings", "你好！今天怎么样？"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.sentence_count, 2);
    assert!(outcome.missing_characters.is_empty());

    let lesson = &outcome.lesson;
    assert_eq!(lesson.title, "Greetings");
    assert_eq!(lesson.meta.ingest, IngestKind::Text);
    assert_eq!(lesson.sources.len(), 1);
    assert!(lesson.sources[0].timing_window.is_none());

    let first = &lesson.sentences[0];
    assert_eq!(first.text, "你好！");
    assert_eq!(first.index, 1);
    assert_eq!(
        first.tokens.iter().map(|t| (t.text.as_str(), t.kind)).collect::<Vec<_>>(),
        vec![("你好", TokenKind::Word), ("！", TokenKind::Punctuation)]
    );

    let second = &lesson.sentences[1];
    assert_eq!((second.start_char, second.end_char), (3, 9));
    assert_eq!(second.tokens.len(), 3);

    let translation = first.translation("en").unwrap();
    assert_eq!(translation.text, MockTranslator::expected_translation("你好！", "en"));
    assert_eq!(translation.source, TranslationSource::Machine);
    assert_eq!(translator.request_count(), 2);

    let stored = repository.get_lesson(lesson.id).await.unwrap().expect("lesson persisted");
    assert_eq!(stored.sentences, lesson.sentences);
    assert_eq!(stored.meta, lesson.meta);
}

#[tokio::test]
async fn test_ingestText_withUnknownSymbol_shouldReportMissingCharacter() {
    let (ingestor, _repository) = common::ingestor_with(None);

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Symbols", "Ω你好"), &CancellationToken::new())
        .await
        .unwrap();

    let tokens = &outcome.lesson.sentences[0].tokens;
    assert_eq!(tokens[0].kind, TokenKind::Unknown);
    assert_eq!(tokens[1].kind, TokenKind::Word);
    assert_eq!(outcome.missing_characters, vec!['Ω']);
    assert_eq!(outcome.lesson.meta.stats.unknown_token_count, 1);
}

#[tokio::test]
async fn test_ingestText_withoutTranslator_shouldStoreNoTranslations() {
    let (ingestor, _repository) = common::ingestor_with(None);

    let outcome = ingestor
        .ingest_text(TextIngestRequest::new("Plain", "我们学习中文。"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.lesson.sentences.iter().all(|s| s.translations.is_empty()));
    assert_eq!(outcome.lesson.meta.stats.failed_translation_count, 0);
}

#[tokio::test]
async fn test_ingestText_withTranslateDisabled_shouldNotCallTranslator() {
    let translator = MockTranslator::working();
    let (ingestor, _repository) = common::ingestor_with(Some(translator.clone()));

    let mut request = TextIngestRequest::new("No translation", "你好。再见。");
    request.translate = false;
    let outcome = ingestor.ingest_text(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.sentence_count, 2);
    assert_eq!(translator.request_count(), 0);
    assert_eq!(outcome.lesson.meta.stats.translated_sentence_count, 0);
}

#[tokio::test]
async fn test_ingestText_withLanguageAliases_shouldStoreCanonicalCodes() {
    let (ingestor, _repository) = common::ingestor_with(None);

    let mut request = TextIngestRequest::new("Aliases", "你好");
    request.source_language = "zh_Hans".to_string();
    request.target_language = "fre".to_string();
    let outcome = ingestor.ingest_text(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.lesson.source_language, "zh");
    assert_eq!(outcome.lesson.target_language, "fr");
}

#[tokio::test]
async fn test_ingestText_withInvalidRequests_shouldRejectWithoutPersisting() {
    let (ingestor, repository) = common::ingestor_with(None);
    let cancel = CancellationToken::new();

    let mut non_chinese = TextIngestRequest::new("Title", "Bonjour");
    non_chinese.source_language = "fr".to_string();
    let mut bad_target = TextIngestRequest::new("Title", "你好");
    bad_target.target_language = "zz".to_string();

    let cases = [
        (TextIngestRequest::new("", "你好"), "title"),
        (TextIngestRequest::new("Title", "  \n "), "text"),
        (non_chinese, "source_language"),
        (bad_target, "target_language"),
    ];

    for (request, expected_field) in cases {
        match ingestor.ingest_text(request, &cancel).await {
            Err(IngestError::Validation { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected validation error on {expected_field}, got {other:?}"),
        }
    }

    assert!(repository.list_lessons().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ingestText_withCancelledToken_shouldNotPersist() {
    let (ingestor, repository) = common::ingestor_with(Some(MockTranslator::working()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = ingestor
        .ingest_text(TextIngestRequest::new("Cancelled", "你好。"), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), IngestErrorKind::Cancelled);
    assert!(repository.list_lessons().await.unwrap().is_empty());
}
