/*!
 * Sentence segmentation.
 *
 * Splits a source unit's text on terminal marks. Offsets count characters,
 * not bytes. Whitespace between sentences is dropped and never covered by a
 * sentence span. Timed units spread their window over the sentences in
 * proportion to sentence length.
 */

use log::debug;

use crate::lesson::{SourceUnit, TimingWindow};

/// Full and half width period, question and exclamation marks, ellipsis
pub const DEFAULT_TERMINAL_MARKS: &str = "。．.？?！!…";

/// Closing quotes and brackets that stay attached to the sentence they follow
const CLOSING_MARKS: &[char] = &[
    '"', '\'', '”', '’', '」', '』', '）', ')', '】', '》', '〉', ']', '］', '}', '｝',
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmenterConfig {
    pub terminal_marks: Vec<char>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self::from_marks(DEFAULT_TERMINAL_MARKS)
    }
}

impl SegmenterConfig {
    pub fn from_marks(marks: &str) -> Self {
        let mut terminal_marks: Vec<char> = Vec::new();
        for c in marks.chars().filter(|c| !c.is_whitespace()) {
            if !terminal_marks.contains(&c) {
                terminal_marks.push(c);
            }
        }
        Self { terminal_marks }
    }
}

/// A sentence cut from one source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSpan {
    pub text: String,
    /// Character offsets into the unit text
    pub start_char: usize,
    pub end_char: usize,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
}

impl SentenceSpan {
    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }
}

#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Split a unit into sentences, deriving timing for timed units
    pub fn segment(&self, unit: &SourceUnit) -> Vec<SentenceSpan> {
        let chars: Vec<char> = unit.text.chars().collect();
        let mut spans: Vec<SentenceSpan> = self
            .split(&chars)
            .into_iter()
            .map(|(start, end)| SentenceSpan {
                text: chars[start..end].iter().collect(),
                start_char: start,
                end_char: end,
                start_ms: None,
                end_ms: None,
            })
            .collect();

        if let Some(window) = &unit.timing_window {
            interpolate_timing(window, &mut spans);
        }

        debug!("Unit {} ({}) split into {} sentences", unit.order, unit.name, spans.len());
        spans
    }

    /// Character ranges of the sentences in `chars`, whitespace trimmed
    pub fn split(&self, chars: &[char]) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            if !self.is_terminal_at(chars, i) {
                i += 1;
                continue;
            }

            let mut end = i + 1;
            while end < chars.len() && (self.is_terminal_at(chars, end) || CLOSING_MARKS.contains(&chars[end])) {
                end += 1;
            }
            push_trimmed(chars, start, end, &mut ranges);
            start = end;
            i = end;
        }

        push_trimmed(chars, start, chars.len(), &mut ranges);
        ranges
    }

    fn is_terminal_at(&self, chars: &[char], i: usize) -> bool {
        let c = chars[i];
        if !self.config.terminal_marks.contains(&c) {
            return false;
        }
        // Decimal point: 3.5
        let between_digits = c == '.'
            && i > 0
            && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit())
            && chars[i - 1].is_ascii_digit();
        !between_digits
    }
}

fn push_trimmed(chars: &[char], mut start: usize, mut end: usize, ranges: &mut Vec<(usize, usize)>) {
    while start < end && chars[start].is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    if start < end {
        ranges.push((start, end));
    }
}

/// Spread the window over the spans by character share.
///
/// The first span starts exactly at the window start and the last ends
/// exactly at the window end; the spans in between tile the window.
pub fn interpolate_timing(window: &TimingWindow, spans: &mut [SentenceSpan]) {
    let total: u64 = spans.iter().map(|s| s.char_len() as u64).sum();
    if total == 0 {
        return;
    }

    let duration = window.duration_ms();
    let mut consumed = 0u64;
    for span in spans.iter_mut() {
        let start = window.start_ms + duration * consumed / total;
        consumed += span.char_len() as u64;
        let end = window.start_ms + duration * consumed / total;
        span.start_ms = Some(start);
        span.end_ms = Some(end);
    }
}

/// Cap interior sentence times of overlapping cues at the next cue's start.
///
/// `spans` holds the sentences of the whole lesson tagged with their unit
/// order. Each cue keeps its exact first start and last end, so sentence
/// starts stay non-decreasing across the lesson even when cues overlap.
pub fn cap_cue_overlaps(spans: &mut [(u32, SentenceSpan)]) {
    let mut next_start: Option<u64> = None;
    let mut group_end = spans.len();

    while group_end > 0 {
        let order = spans[group_end - 1].0;
        let group_start = spans[..group_end]
            .iter()
            .rposition(|(o, _)| *o != order)
            .map_or(0, |p| p + 1);
        let group = &mut spans[group_start..group_end];
        let last = group.len() - 1;

        if let Some(limit) = next_start {
            for (i, (_, span)) in group.iter_mut().enumerate() {
                if i > 0 {
                    span.start_ms = span.start_ms.map(|ms| ms.min(limit));
                }
                if i < last {
                    span.end_ms = span.end_ms.map(|ms| ms.min(limit));
                }
            }
        }

        next_start = group[0].1.start_ms;
        group_end = group_start;
    }
}
