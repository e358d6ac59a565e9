use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::errors::SubtitleError;

// @module: SRT parsing

// @const: SRT timestamp line, anchored
static TIMESTAMP_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2}),(\d{3})\s+-->\s+(\d{2,}):(\d{2}):(\d{2}),(\d{3})$")
        .expect("timestamp pattern is valid")
});

// @const: Single SRT timestamp, anchored
static TIMESTAMP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2,}):(\d{2}):(\d{2}),(\d{3})$").expect("timestamp pattern is valid"));

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    // @field: Cue number as written in the file
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Text lines joined with '\n'; empty for blank cues
    pub text: String,
}

impl SubtitleCue {
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        SubtitleCue {
            index,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Parse a single `HH:MM:SS,mmm` timestamp to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Option<u64> {
        let caps = TIMESTAMP_REGEX.captures(timestamp.trim())?;
        components_to_ms(&caps, 1)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms)
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Convert four captured components starting at `start_idx` to milliseconds.
/// Rejects minutes or seconds out of range.
fn components_to_ms(caps: &regex::Captures, start_idx: usize) -> Option<u64> {
    let part = |offset: usize| -> Option<u64> { caps.get(start_idx + offset)?.as_str().parse().ok() };

    let (hours, minutes, seconds, millis) = (part(0)?, part(1)?, part(2)?, part(3)?);
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

/// Decode an uploaded SRT file: UTF-8 (BOM stripped), falling back to Latin-1
pub fn decode_srt_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.strip_prefix('\u{feff}').unwrap_or(text).to_string(),
        Err(_) => {
            debug!("Subtitle upload is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Parse SRT content into cues, in file order.
///
/// Every block must be an index line, a timestamp line and zero or more text
/// lines, separated by blank lines. Any violation aborts the parse; blank
/// cues are returned with empty text so the caller decides what to skip.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleCue>, SubtitleError> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let normalized = normalized.strip_prefix('\u{feff}').unwrap_or(&normalized);
    let lines: Vec<&str> = normalized.split('\n').collect();
    let is_blank = |i: usize| lines.get(i).is_none_or(|line| line.trim().is_empty());

    let mut cues: Vec<SubtitleCue> = Vec::new();
    let mut block_position = 0;
    let mut i = 0;

    while i < lines.len() {
        if is_blank(i) {
            i += 1;
            continue;
        }
        block_position += 1;

        // Index line
        let index_line = lines[i].trim();
        let index: usize = index_line.parse().map_err(|_| SubtitleError::InvalidIndex {
            cue_index: block_position,
            line: i + 1,
            content: index_line.to_string(),
        })?;
        i += 1;

        // Timestamp line
        let timestamp_line = lines.get(i).map(|l| l.trim()).unwrap_or_default();
        let invalid_timestamp = || SubtitleError::InvalidTimestamp {
            cue_index: index,
            line: i + 1,
            content: timestamp_line.to_string(),
        };
        let caps = TIMESTAMP_LINE_REGEX
            .captures(timestamp_line)
            .ok_or_else(invalid_timestamp)?;
        let start_ms = components_to_ms(&caps, 1).ok_or_else(invalid_timestamp)?;
        let end_ms = components_to_ms(&caps, 5).ok_or_else(invalid_timestamp)?;

        if end_ms <= start_ms {
            return Err(SubtitleError::InvalidTimeRange {
                cue_index: index,
                start_ms,
                end_ms,
            });
        }
        if let Some(previous) = cues.last() {
            if start_ms < previous.start_ms {
                return Err(SubtitleError::NonMonotonicStart {
                    cue_index: index,
                    start_ms,
                    previous_start_ms: previous.start_ms,
                });
            }
        }
        i += 1;

        // Text lines up to the blank separator
        let mut text_lines = Vec::new();
        while !is_blank(i) {
            text_lines.push(lines[i].trim());
            i += 1;
        }

        cues.push(SubtitleCue::new(index, start_ms, end_ms, text_lines.join("\n")));
    }

    debug!("Parsed {} subtitle cues", cues.len());
    Ok(cues)
}
