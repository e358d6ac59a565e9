/*!
 * Tests for error classification and messages
 */

use zhlesson::errors::{IngestError, IngestErrorKind, ProviderError, SubtitleError};

#[test]
fn test_providerError_isTransient_shouldOnlyRetryRecoverableErrors() {
    assert!(ProviderError::Timeout(30_000).is_transient());
    assert!(ProviderError::RateLimitExceeded("slow down".into()).is_transient());
    assert!(ProviderError::ConnectionError("reset".into()).is_transient());
    assert!(ProviderError::ApiError { status_code: 503, message: "busy".into() }.is_transient());

    assert!(!ProviderError::ApiError { status_code: 400, message: "bad".into() }.is_transient());
    assert!(!ProviderError::AuthenticationError("no key".into()).is_transient());
    assert!(!ProviderError::ParseError("empty".into()).is_transient());
}

#[test]
fn test_ingestError_fromSubtitleError_shouldBeMalformedInput() {
    let err: IngestError = SubtitleError::InvalidTimeRange { cue_index: 4, start_ms: 10, end_ms: 5 }.into();

    assert_eq!(err.kind(), IngestErrorKind::MalformedInput);
    assert!(err.to_string().contains("cue 4"));
}

#[test]
fn test_ingestError_kinds_shouldMapEachVariant() {
    assert_eq!(IngestError::validation("title", "empty").kind(), IngestErrorKind::Validation);
    assert_eq!(IngestError::Cancelled.kind(), IngestErrorKind::Cancelled);

    let persistence = IngestError::Persistence(anyhow::anyhow!("locked"));
    assert_eq!(persistence.kind(), IngestErrorKind::Persistence);
    assert!(persistence.to_string().contains("locked"));
}

#[test]
fn test_validationError_message_shouldNameField() {
    let err = IngestError::validation("target_language", "unknown code 'xx'");
    assert_eq!(err.to_string(), "invalid target_language: unknown code 'xx'");
}

#[test]
fn test_subtitleError_noCues_shouldHaveNoCueIndex() {
    assert_eq!(SubtitleError::NoCues.cue_index(), None);
}
