/*!
 * CC-CEDICT parsing.
 *
 * Each entry line has the shape `TRAD SIMP [pin1 yin1] /gloss one/gloss two/`.
 * Comment lines start with `#`.
 */

use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;

use super::{Lemma, LemmaId, Sense};

static CEDICT_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<trad>\S+)\s+(?P<simp>\S+)\s+\[(?P<pinyin>[^\]]+)\]\s+/(?P<defs>.+)/\s*$")
        .expect("CEDICT line pattern is valid")
});

/// Parsed dictionary line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CedictEntry {
    pub traditional: String,
    pub simplified: String,
    pub pinyin_numbers: String,
    pub glosses: Vec<String>,
}

impl CedictEntry {
    /// Convert into a lemma with the given id, numbering senses from `first_sense_id`
    pub fn into_lemma(self, id: LemmaId, first_sense_id: i64) -> Lemma {
        let senses = self
            .glosses
            .into_iter()
            .enumerate()
            .map(|(i, gloss)| Sense {
                id: first_sense_id + i as i64,
                lemma_id: id,
                sense_index: i as u32 + 1,
                gloss,
            })
            .collect();

        Lemma {
            id,
            traditional: self.traditional,
            simplified: self.simplified,
            pinyin_numbers: self.pinyin_numbers,
            senses,
        }
    }
}

/// Import options
#[derive(Debug, Clone, Default)]
pub struct CedictOptions {
    /// Keep `CL:` classifier glosses
    pub keep_classifiers: bool,
    /// Stop after this many entry lines
    pub limit: Option<usize>,
}

/// Parse one line. Returns `None` for comments, blank and malformed lines.
pub fn parse_line(line: &str) -> Option<CedictEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let caps = CEDICT_LINE_REGEX.captures(line)?;
    let glosses = caps["defs"]
        .split('/')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();

    Some(CedictEntry {
        traditional: caps["trad"].to_string(),
        simplified: caps["simp"].to_string(),
        pinyin_numbers: caps["pinyin"].trim().to_string(),
        glosses,
    })
}

/// Parse a whole CEDICT file. Entries left without glosses are dropped.
pub fn parse_reader<R: BufRead>(reader: R, options: &CedictOptions) -> Result<Vec<CedictEntry>> {
    let mut entries = Vec::new();
    let mut parsed_lines = 0usize;
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read CEDICT line {}", line_no + 1))?;
        let Some(mut entry) = parse_line(&line) else {
            continue;
        };
        parsed_lines += 1;

        if !options.keep_classifiers {
            entry.glosses.retain(|g| !g.starts_with("CL:"));
        }

        if entry.glosses.is_empty() {
            skipped += 1;
        } else {
            entries.push(entry);
        }

        if options.limit.is_some_and(|limit| parsed_lines >= limit) {
            break;
        }
    }

    debug!(
        "Parsed {} CEDICT lines: {} entries, {} without glosses",
        parsed_lines,
        entries.len(),
        skipped
    );
    Ok(entries)
}

/// Parse CEDICT content held in memory
pub fn parse_str(content: &str, options: &CedictOptions) -> Result<Vec<CedictEntry>> {
    parse_reader(content.as_bytes(), options)
}
