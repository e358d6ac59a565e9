/*!
 * Input normalization.
 *
 * Turns a raw text upload or a parsed subtitle track into the ordered list of
 * source units the segmenter works on.
 */

use crate::errors::SubtitleError;
use crate::lesson::{SourceUnit, TimingWindow};
use crate::subtitle_processor::{SubtitleCue, parse_srt};

/// The whole text becomes a single untimed unit
pub fn normalize_text(name: &str, text: &str) -> Vec<SourceUnit> {
    vec![SourceUnit {
        name: name.to_string(),
        text: text.to_string(),
        order: 1,
        timing_window: None,
    }]
}

/// One timed unit per cue with text; blank cues are skipped
pub fn normalize_cues(name: &str, cues: &[SubtitleCue]) -> Result<Vec<SourceUnit>, SubtitleError> {
    let units: Vec<SourceUnit> = cues
        .iter()
        .filter(|cue| !cue.is_blank())
        .enumerate()
        .map(|(i, cue)| SourceUnit {
            name: name.to_string(),
            text: cue.text.clone(),
            order: i as u32 + 1,
            timing_window: Some(TimingWindow {
                cue_index: cue.index,
                start_ms: cue.start_ms,
                end_ms: cue.end_ms,
            }),
        })
        .collect();

    if units.is_empty() {
        return Err(SubtitleError::NoCues);
    }
    Ok(units)
}

/// Parse SRT content and normalize its cues
pub fn normalize_srt(name: &str, content: &str) -> Result<Vec<SourceUnit>, SubtitleError> {
    let cues = parse_srt(content)?;
    normalize_cues(name, &cues)
}
