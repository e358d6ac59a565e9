/*!
 * Dictionary-informed tokenizer.
 *
 * Forward maximum matching: at each position the longest dictionary form
 * starting there becomes a `word` token. Characters that start no word become
 * single-character `punctuation`, `whitespace` or `unknown` tokens, so the
 * tokens always tile the sentence exactly.
 */

use crate::dictionary::DictionaryLookup;
use crate::lesson::{Token, TokenKind};

pub struct Tokenizer<'a> {
    dictionary: &'a dyn DictionaryLookup,
    max_lemma_chars: usize,
}

impl<'a> Tokenizer<'a> {
    /// Match lengths are bounded by the longest dictionary form, lowered to
    /// `limit` when one is given.
    pub fn new(dictionary: &'a dyn DictionaryLookup, limit: Option<usize>) -> Self {
        let longest = dictionary.max_form_chars();
        let max_lemma_chars = limit.map_or(longest, |limit| longest.min(limit));
        Self {
            dictionary,
            max_lemma_chars,
        }
    }

    pub fn max_lemma_chars(&self) -> usize {
        self.max_lemma_chars
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut byte_pos = 0;
        let mut char_pos = 0;

        while let Some(c) = text[byte_pos..].chars().next() {
            let index = tokens.len() as u32 + 1;

            // Candidates arrive longest first, then by ascending id
            let word = if self.max_lemma_chars > 0 {
                self.dictionary
                    .lookup(&text[byte_pos..])
                    .into_iter()
                    .find(|m| m.char_len <= self.max_lemma_chars)
            } else {
                None
            };

            let token = match word {
                Some(m) => Token {
                    index,
                    text: m.form,
                    kind: TokenKind::Word,
                    lemma_id: Some(m.lemma_id),
                    start_char: char_pos,
                    end_char: char_pos + m.char_len,
                },
                None => Token {
                    index,
                    text: c.to_string(),
                    kind: classify_char(c),
                    lemma_id: None,
                    start_char: char_pos,
                    end_char: char_pos + 1,
                },
            };

            byte_pos += token.text.len();
            char_pos = token.end_char;
            tokens.push(token);
        }

        tokens
    }
}

/// Kind of a character no dictionary word starts with
pub fn classify_char(c: char) -> TokenKind {
    if c.is_whitespace() {
        TokenKind::Whitespace
    } else if is_punctuation_or_symbol(c) {
        TokenKind::Punctuation
    } else {
        TokenKind::Unknown
    }
}

pub fn is_punctuation_or_symbol(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation();
    }

    matches!(c,
        // Latin-1 punctuation and symbols, minus ordinals, superscripts and fractions
        '\u{00A1}'..='\u{00A9}' | '\u{00AB}'..='\u{00B1}' | '\u{00B4}' | '\u{00B6}'..='\u{00B8}'
        | '\u{00BB}' | '\u{00BF}' | '\u{00D7}' | '\u{00F7}'
        // General punctuation, currency
        | '\u{2010}'..='\u{205E}' | '\u{20A0}'..='\u{20CF}'
        // Arrows, math operators, technical, box drawing, shapes, dingbats
        | '\u{2190}'..='\u{245F}' | '\u{2500}'..='\u{2BFF}'
        | '\u{2E00}'..='\u{2E7F}'
        // CJK symbols and punctuation, without iteration marks and Hangzhou numerals
        | '\u{3001}'..='\u{3004}' | '\u{3008}'..='\u{3020}' | '\u{3030}' | '\u{303D}'..='\u{303F}'
        | '\u{30FB}'
        // Vertical, compatibility and small forms
        | '\u{FE10}'..='\u{FE19}' | '\u{FE30}'..='\u{FE6F}'
        // Full width ASCII punctuation and half width CJK punctuation
        | '\u{FF01}'..='\u{FF0F}' | '\u{FF1A}'..='\u{FF20}' | '\u{FF3B}'..='\u{FF40}'
        | '\u{FF5B}'..='\u{FF65}' | '\u{FFE0}'..='\u{FFEE}'
        // Emoji and pictographs
        | '\u{1F300}'..='\u{1FAFF}'
    )
}
