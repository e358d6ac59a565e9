use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Lesson languages arrive as loose tags (`zh`, `zh-CN`, `zh_Hans`, `chi`,
/// `eng`...). They are reduced to a canonical short code: ISO 639-1 where
/// one exists, ISO 639-3 otherwise.
/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Chinese languages the segmenter and dictionary are built for
const CHINESE_CODES: &[&str] = &["zh", "cmn", "yue", "wuu", "hak", "nan"];

/// Drop region/script subtags and normalise case: `zh_Hans-CN` -> `zh`
fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn lookup(primary: &str) -> Option<Language> {
    match primary.len() {
        2 => Language::from_639_1(primary),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == primary)
                .map_or(primary, |(_, t)| *t);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Canonical short code for a language tag
pub fn normalize_language_code(code: &str) -> Result<String> {
    let primary = primary_subtag(code);
    let language = lookup(&primary).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    Ok(language
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| language.to_639_3().to_string()))
}

/// Whether the tag names a Chinese language
pub fn is_chinese(code: &str) -> bool {
    normalize_language_code(code).is_ok_and(|c| CHINESE_CODES.contains(&c.as_str()))
}

/// Get the English language name from a tag
pub fn get_language_name(code: &str) -> Result<String> {
    let primary = primary_subtag(code);
    let language = lookup(&primary).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(language.to_name().to_string())
}
