/*!
 * Tests for dictionary tokenization and lemma resolution
 */

use zhlesson::dictionary::{DictionaryLookup, InMemoryDictionary};
use zhlesson::ingest::resolver::LemmaResolver;
use zhlesson::ingest::tokenizer::Tokenizer;
use zhlesson::lesson::{Token, TokenKind};

use crate::common;

fn summary(tokens: &[Token]) -> Vec<(&str, TokenKind)> {
    tokens.iter().map(|t| (t.text.as_str(), t.kind)).collect()
}

/// Tokens must tile the text with contiguous 1-based indices
fn assert_tiles(text: &str, tokens: &[Token]) {
    let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(joined, text);

    let mut cursor = 0;
    for (i, token) in tokens.iter().enumerate() {
        assert_eq!(token.index as usize, i + 1);
        assert_eq!(token.start_char, cursor);
        assert_eq!(token.end_char - token.start_char, token.text.chars().count());
        cursor = token.end_char;
    }
    assert_eq!(cursor, text.chars().count());
}

#[test]
fn test_tokenize_withGreeting_shouldMatchLongestWords() {
    let dictionary = common::sample_dictionary();
    let tokens = Tokenizer::new(&dictionary, None).tokenize("你好！今天怎么样？");

    assert_eq!(
        summary(&tokens),
        vec![
            ("你好", TokenKind::Word),
            ("！", TokenKind::Punctuation),
            ("今天", TokenKind::Word),
            ("怎么样", TokenKind::Word),
            ("？", TokenKind::Punctuation),
        ]
    );
    assert_tiles("你好！今天怎么样？", &tokens);

    let lemma = tokens[3].lemma(&dictionary).unwrap();
    assert_eq!(lemma.pinyin_numbers, "zen3 me5 yang4");
}

#[test]
fn test_tokenize_withUnknownSymbol_shouldEmitUnknownToken() {
    let dictionary = common::sample_dictionary();
    let tokens = Tokenizer::new(&dictionary, None).tokenize("Ω你好");

    assert_eq!(summary(&tokens), vec![("Ω", TokenKind::Unknown), ("你好", TokenKind::Word)]);
    assert_eq!(tokens[0].lemma_id, None);
}

#[test]
fn test_tokenize_withTraditionalForm_shouldFindSameLemma() {
    let dictionary = common::sample_dictionary();
    let tokenizer = Tokenizer::new(&dictionary, None);

    let simplified = tokenizer.tokenize("我们学习");
    let traditional = tokenizer.tokenize("我們學習");

    assert_eq!(simplified.len(), 2);
    assert_eq!(
        simplified.iter().map(|t| t.lemma_id).collect::<Vec<_>>(),
        traditional.iter().map(|t| t.lemma_id).collect::<Vec<_>>()
    );
}

#[test]
fn test_tokenize_withLimit_shouldNotMatchLongerForms() {
    let dictionary = common::sample_dictionary();
    let tokenizer = Tokenizer::new(&dictionary, Some(2));

    assert_eq!(tokenizer.max_lemma_chars(), 2);
    let tokens = tokenizer.tokenize("怎么样");
    assert_eq!(summary(&tokens), vec![("怎么", TokenKind::Word), ("样", TokenKind::Unknown)]);
}

#[test]
fn test_tokenize_withMixedContent_shouldAlwaysTile() {
    let dictionary = common::sample_dictionary();
    let tokenizer = Tokenizer::new(&dictionary, None);

    for text in ["", " ", "abc 你好, 世界!", "再见……😀", "天天好好", "中文\t学习\n"] {
        assert_tiles(text, &tokenizer.tokenize(text));
    }
}

#[test]
fn test_tokenize_withEmptyDictionary_shouldClassifyEveryChar() {
    let dictionary = InMemoryDictionary::new();
    let tokens = Tokenizer::new(&dictionary, None).tokenize("你 。");

    assert_eq!(
        summary(&tokens),
        vec![("你", TokenKind::Unknown), (" ", TokenKind::Whitespace), ("。", TokenKind::Punctuation)]
    );
}

#[test]
fn test_resolve_withCharInsideKnownWord_shouldNotReportIt() {
    let dictionary = InMemoryDictionary::from_words(&["今天"]);
    let tokenizer = Tokenizer::new(&dictionary, None);
    let mut resolver = LemmaResolver::new(&dictionary);

    resolver.resolve(tokenizer.tokenize("今。"));
    resolver.resolve(tokenizer.tokenize("今天。样样"));
    let report = resolver.finish();

    assert_eq!(report.missing_characters, vec!['样']);
    assert_eq!(report.word_count, 1);
    assert_eq!(report.unknown_count, 3);
}

#[test]
fn test_resolve_withDanglingLemma_shouldDemoteToUnknown() {
    let dictionary = InMemoryDictionary::from_words(&["你好"]);
    assert!(!dictionary.contains(42));

    let tokens = vec![
        Token { index: 1, text: "再见".into(), kind: TokenKind::Word, lemma_id: Some(42), start_char: 0, end_char: 2 },
        Token { index: 2, text: "你好".into(), kind: TokenKind::Word, lemma_id: Some(1), start_char: 2, end_char: 4 },
    ];

    let mut resolver = LemmaResolver::new(&dictionary);
    let resolved = resolver.resolve(tokens);

    assert_eq!(
        summary(&resolved),
        vec![("再", TokenKind::Unknown), ("见", TokenKind::Unknown), ("你好", TokenKind::Word)]
    );
    assert_tiles("再见你好", &resolved);
    assert_eq!(resolver.finish().missing_characters, vec!['再', '见']);
}

#[test]
fn test_tokenize_calledTwice_shouldBeDeterministic() {
    let text = "天天好好学习，我们今天怎么样？Ω";
    let first = Tokenizer::new(&common::sample_dictionary(), None).tokenize(text);
    let second = Tokenizer::new(&common::sample_dictionary(), None).tokenize(text);
    assert_eq!(first, second);
}

#[test]
fn test_resolve_withRepeatedUnknowns_shouldListEachOnceInFirstSeenOrder() {
    let dictionary = common::sample_dictionary();
    let tokenizer = Tokenizer::new(&dictionary, None);
    let mut resolver = LemmaResolver::new(&dictionary);

    resolver.resolve(tokenizer.tokenize("他说她"));
    resolver.resolve(tokenizer.tokenize("她说他们"));
    let report = resolver.finish();

    assert_eq!(report.missing_characters, vec!['他', '说', '她', '们']);
}
