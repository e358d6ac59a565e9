use std::collections::HashMap;

use super::{CedictEntry, DictionaryLookup, Lemma, LemmaId, LemmaMatch, Sense};

/// Immutable dictionary snapshot keyed by written form
#[derive(Debug, Clone, Default)]
pub struct InMemoryDictionary {
    lemmas: HashMap<LemmaId, Lemma>,
    /// Form -> lemma ids, ascending
    forms: HashMap<String, Vec<LemmaId>>,
    max_form_chars: usize,
}

impl InMemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lemmas(lemmas: impl IntoIterator<Item = Lemma>) -> Self {
        let mut dictionary = Self::new();
        for lemma in lemmas {
            dictionary.insert(lemma);
        }
        dictionary
    }

    /// Build a snapshot from parsed CEDICT entries, numbering lemmas and senses from 1
    pub fn from_cedict(entries: impl IntoIterator<Item = CedictEntry>) -> Self {
        let mut next_sense_id = 1;
        let lemmas = entries.into_iter().enumerate().map(|(i, entry)| {
            let lemma = entry.into_lemma(i as LemmaId + 1, next_sense_id);
            next_sense_id += lemma.senses.len() as i64;
            lemma
        });
        Self::from_lemmas(lemmas.collect::<Vec<_>>())
    }

    /// Snapshot where each word is its own lemma with identical forms, ids from 1
    pub fn from_words(words: &[&str]) -> Self {
        Self::from_lemmas(words.iter().enumerate().map(|(i, word)| Lemma {
            id: i as LemmaId + 1,
            traditional: word.to_string(),
            simplified: word.to_string(),
            pinyin_numbers: String::new(),
            senses: Vec::<Sense>::new(),
        }))
    }

    /// Add a lemma, replacing any lemma with the same id
    pub fn insert(&mut self, lemma: Lemma) {
        if self.lemmas.contains_key(&lemma.id) {
            self.remove(lemma.id);
        }

        for form in lemma.forms() {
            self.max_form_chars = self.max_form_chars.max(form.chars().count());
            let ids = self.forms.entry(form.to_string()).or_default();
            if let Err(pos) = ids.binary_search(&lemma.id) {
                ids.insert(pos, lemma.id);
            }
        }
        self.lemmas.insert(lemma.id, lemma);
    }

    fn remove(&mut self, id: LemmaId) {
        if let Some(old) = self.lemmas.remove(&id) {
            for form in old.forms() {
                if let Some(ids) = self.forms.get_mut(form) {
                    ids.retain(|existing| *existing != id);
                    if ids.is_empty() {
                        self.forms.remove(form);
                    }
                }
            }
            self.max_form_chars = self.forms.keys().map(|f| f.chars().count()).max().unwrap_or(0);
        }
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl DictionaryLookup for InMemoryDictionary {
    fn lookup(&self, text: &str) -> Vec<LemmaMatch> {
        // Byte offset after each of the first `max_form_chars` characters
        let boundaries: Vec<usize> = text
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .take(self.max_form_chars)
            .collect();

        let mut matches = Vec::new();
        for (len, end) in boundaries.iter().enumerate().rev() {
            if text.is_empty() {
                break;
            }
            let prefix = &text[..*end];
            if let Some(ids) = self.forms.get(prefix) {
                matches.extend(ids.iter().map(|id| LemmaMatch {
                    lemma_id: *id,
                    form: prefix.to_string(),
                    char_len: len + 1,
                }));
            }
        }
        matches
    }

    fn lemma(&self, id: LemmaId) -> Option<Lemma> {
        self.lemmas.get(&id).cloned()
    }

    fn max_form_chars(&self) -> usize {
        self.max_form_chars
    }

    fn contains(&self, id: LemmaId) -> bool {
        self.lemmas.contains_key(&id)
    }
}
