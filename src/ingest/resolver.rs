/*!
 * Lemma resolution bookkeeping.
 *
 * Word tokens carry the lemma id picked by the tokenizer. The resolver checks
 * those references against the dictionary and collects the characters that
 * no dictionary word covered.
 */

use log::{debug, warn};
use std::collections::HashSet;

use crate::dictionary::DictionaryLookup;
use crate::lesson::{Token, TokenKind};

/// Outcome of resolving every sentence of a lesson
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Unresolved characters, first appearance order
    pub missing_characters: Vec<char>,
    pub word_count: usize,
    pub unknown_count: usize,
}

/// Accumulates lemma references and unresolved characters across sentences
pub struct LemmaResolver<'a> {
    dictionary: &'a dyn DictionaryLookup,
    /// Lowercased characters found inside resolved words
    resolved: HashSet<char>,
    /// Lowercased characters already queued as missing
    seen: HashSet<char>,
    candidates: Vec<char>,
    word_count: usize,
    unknown_count: usize,
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

impl<'a> LemmaResolver<'a> {
    pub fn new(dictionary: &'a dyn DictionaryLookup) -> Self {
        Self {
            dictionary,
            resolved: HashSet::new(),
            seen: HashSet::new(),
            candidates: Vec::new(),
            word_count: 0,
            unknown_count: 0,
        }
    }

    /// Record one sentence's tokens.
    ///
    /// A word whose lemma id the dictionary does not know is demoted to
    /// single-character unknown tokens so no dangling reference survives.
    pub fn resolve(&mut self, tokens: Vec<Token>) -> Vec<Token> {
        let mut resolved_tokens = Vec::with_capacity(tokens.len());

        for token in tokens {
            match (token.kind, token.lemma_id) {
                (TokenKind::Word, Some(id)) if self.dictionary.contains(id) => {
                    self.word_count += 1;
                    self.resolved.extend(token.text.chars().map(fold));
                    resolved_tokens.push(token);
                }
                (TokenKind::Word, _) => {
                    warn!("Dropping dangling lemma reference {:?} for '{}'", token.lemma_id, token.text);
                    for (offset, c) in token.text.chars().enumerate() {
                        let start = token.start_char + offset;
                        self.record_unknown(c);
                        resolved_tokens.push(Token {
                            index: 0,
                            text: c.to_string(),
                            kind: TokenKind::Unknown,
                            lemma_id: None,
                            start_char: start,
                            end_char: start + 1,
                        });
                    }
                }
                (TokenKind::Unknown, _) => {
                    for c in token.text.chars() {
                        self.record_unknown(c);
                    }
                    resolved_tokens.push(token);
                }
                _ => resolved_tokens.push(token),
            }
        }

        for (i, token) in resolved_tokens.iter_mut().enumerate() {
            token.index = i as u32 + 1;
        }
        resolved_tokens
    }

    fn record_unknown(&mut self, c: char) {
        self.unknown_count += 1;
        if self.seen.insert(fold(c)) {
            self.candidates.push(c);
        }
    }

    /// Missing characters, excluding any character seen inside a resolved word
    pub fn finish(self) -> ResolutionReport {
        let missing_characters: Vec<char> = self
            .candidates
            .into_iter()
            .filter(|c| !self.resolved.contains(&fold(*c)))
            .collect();

        debug!(
            "Resolved {} words, {} unknown tokens, {} missing characters",
            self.word_count,
            self.unknown_count,
            missing_characters.len()
        );

        ResolutionReport {
            missing_characters,
            word_count: self.word_count,
            unknown_count: self.unknown_count,
        }
    }
}
