/*!
 * Tests for SRT parsing through the public API
 */

use zhlesson::errors::SubtitleError;
use zhlesson::subtitle_processor::{SubtitleCue, parse_srt};

use crate::common;

#[test]
fn test_parseSrt_withSampleFile_shouldReadBothCues() {
    let cues = parse_srt(common::SAMPLE_SRT).unwrap();

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0], SubtitleCue::new(1, 1000, 3000, "你好！"));
    assert_eq!(cues[1].start_ms, 4000);
    assert_eq!(cues[1].end_ms, 8000);
}

#[test]
fn test_parseSrt_withBadArrow_shouldNameCueAndLineInMessage() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\n一\n\n2\n00:00:03,000 -> 00:00:04,000\n二\n";

    let err = parse_srt(content).unwrap_err();
    assert_eq!(
        err,
        SubtitleError::InvalidTimestamp {
            cue_index: 2,
            line: 6,
            content: "00:00:03,000 -> 00:00:04,000".to_string(),
        }
    );
    assert!(err.to_string().contains("cue 2"));
}

#[test]
fn test_parseSrt_withRenderedCues_shouldReadThemBack() {
    let cues = vec![
        SubtitleCue::new(1, 0, 1500, "你好。"),
        SubtitleCue::new(2, 1500, 3_723_456, "第一行\n第二行"),
    ];
    let content: String = cues.iter().map(|cue| cue.to_string()).collect();

    assert_eq!(parse_srt(&content).unwrap(), cues);
}
