/*!
 * Tests for sentence segmentation and timing interpolation
 */

use zhlesson::ingest::segmenter::{Segmenter, SegmenterConfig, SentenceSpan};
use zhlesson::lesson::{SourceUnit, TimingWindow};

fn unit(text: &str, window: Option<(u64, u64)>) -> SourceUnit {
    SourceUnit {
        name: "unit".to_string(),
        text: text.to_string(),
        order: 1,
        timing_window: window.map(|(start_ms, end_ms)| TimingWindow { cue_index: 1, start_ms, end_ms }),
    }
}

/// Spans must be ordered, disjoint, match the source text, and leave only
/// whitespace uncovered
fn assert_spans_cover(text: &str, spans: &[SentenceSpan]) {
    let chars: Vec<char> = text.chars().collect();
    let mut cursor = 0;

    for span in spans {
        assert!(span.start_char >= cursor, "overlapping span {span:?}");
        assert!(span.start_char < span.end_char, "empty span {span:?}");
        assert!(chars[cursor..span.start_char].iter().all(|c| c.is_whitespace()));

        let expected: String = chars[span.start_char..span.end_char].iter().collect();
        assert_eq!(span.text, expected);
        cursor = span.end_char;
    }
    assert!(chars[cursor..].iter().all(|c| c.is_whitespace()));
}

#[test]
fn test_segment_withMixedInput_shouldCoverAllNonWhitespace() {
    let samples = [
        "你好！今天怎么样？",
        "  他说：“走吧！”  然后走了。",
        "价格是3.5元。真的吗？！",
        "没有标点",
        "……",
        "第一行\n第二行。\n\n第三行",
        "Hello world. 你好。",
    ];

    let segmenter = Segmenter::default();
    for text in samples {
        let spans = segmenter.segment(&unit(text, None));
        assert!(!spans.is_empty(), "{text:?}");
        assert_spans_cover(text, &spans);
    }
}

#[test]
fn test_segment_withClosingQuote_shouldKeepQuoteInSentence() {
    let spans = Segmenter::default().segment(&unit("他说：“走吧！”然后走了。", None));

    let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["他说：“走吧！”", "然后走了。"]);
}

#[test]
fn test_segment_withDecimalNumber_shouldNotSplitOnPoint() {
    let spans = Segmenter::default().segment(&unit("价格是3.5元。真的吗？！", None));

    let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["价格是3.5元。", "真的吗？！"]);
}

#[test]
fn test_segment_withCustomMarks_shouldOnlySplitOnThem() {
    let segmenter = Segmenter::new(SegmenterConfig::from_marks("；"));
    let spans = segmenter.segment(&unit("一；二。三", None));

    let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["一；", "二。三"]);
}

#[test]
fn test_segment_withTimedCue_shouldSplitWindowByLength() {
    let spans = Segmenter::default().segment(&unit("你好。今天好。", Some((0, 2000))));

    assert_eq!(spans.len(), 2);
    assert_eq!((spans[0].start_ms, spans[0].end_ms), (Some(0), Some(857)));
    assert_eq!((spans[1].start_ms, spans[1].end_ms), (Some(857), Some(2000)));
}

#[test]
fn test_segment_withTimedCue_shouldTileWindowExactly() {
    let window = (12_345, 19_999);
    let spans = Segmenter::default().segment(&unit("一。二二。三三三。四四四四。五。", Some(window)));

    assert_eq!(spans.first().unwrap().start_ms, Some(window.0));
    assert_eq!(spans.last().unwrap().end_ms, Some(window.1));
    for pair in spans.windows(2) {
        assert_eq!(pair[0].end_ms, pair[1].start_ms);
        assert!(pair[0].start_ms <= pair[0].end_ms);
    }
}

#[test]
fn test_segment_withWhitespaceOnly_shouldReturnNothing() {
    assert!(Segmenter::default().segment(&unit(" \n\t ", None)).is_empty());
}
