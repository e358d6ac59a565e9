/*!
 * Dictionary lookup capability.
 *
 * Lemmas and senses are owned by the dictionary store; the pipeline only
 * sees them through `DictionaryLookup`, and tokens keep nothing but a
 * `LemmaId`.
 *
 * - `memory`: immutable in-memory snapshot used during ingestion
 * - `cedict`: CC-CEDICT line parser for dictionary imports
 */

use serde::{Deserialize, Serialize};

pub mod cedict;
pub mod memory;

pub use cedict::{CedictEntry, CedictOptions};
pub use memory::InMemoryDictionary;

/// Store-assigned lemma identifier
pub type LemmaId = i64;

/// One definition of a lemma
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    pub id: i64,
    pub lemma_id: LemmaId,
    /// 1-based, in source order
    pub sense_index: u32,
    pub gloss: String,
}

/// Dictionary headword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemma {
    pub id: LemmaId,
    pub traditional: String,
    pub simplified: String,
    /// CEDICT pinyin with tone numbers, e.g. `ni3 hao3`
    pub pinyin_numbers: String,
    pub senses: Vec<Sense>,
}

impl Lemma {
    /// Distinct written forms, simplified first
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        let traditional = (self.traditional != self.simplified).then_some(self.traditional.as_str());
        std::iter::once(self.simplified.as_str())
            .chain(traditional)
            .filter(|form| !form.is_empty())
    }
}

/// A lemma whose form is a prefix of the looked-up text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaMatch {
    pub lemma_id: LemmaId,
    /// Matched prefix
    pub form: String,
    /// Length of the match in characters
    pub char_len: usize,
}

/// Read-only dictionary access shared by concurrent ingestions
pub trait DictionaryLookup: Send + Sync {
    /// Lemmas whose simplified or traditional form is a prefix of `text`,
    /// longest first, then by ascending id.
    fn lookup(&self, text: &str) -> Vec<LemmaMatch>;

    /// Fetch a lemma by id
    fn lemma(&self, id: LemmaId) -> Option<Lemma>;

    /// Length in characters of the longest known form
    fn max_form_chars(&self) -> usize;

    fn contains(&self, id: LemmaId) -> bool {
        self.lemma(id).is_some()
    }

    /// Lemmas whose form is exactly `text`, by ascending id
    fn exact(&self, text: &str) -> Vec<LemmaId> {
        let len = text.chars().count();
        self.lookup(text)
            .into_iter()
            .filter(|m| m.char_len == len)
            .map(|m| m.lemma_id)
            .collect()
    }
}
