/*!
 * Tests for language code utilities
 */

use zhlesson::language_utils::{get_language_name, normalize_language_code};

#[test]
fn test_normalizeLanguageCode_withRegionAndScript_shouldKeepPrimary() {
    assert_eq!(normalize_language_code("zh-TW").unwrap(), "zh");
    assert_eq!(normalize_language_code("en_US").unwrap(), "en");
    assert_eq!(normalize_language_code("DEU").unwrap(), "de");
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("zh").unwrap(), "Chinese");
    assert_eq!(get_language_name("en-GB").unwrap(), "English");
    assert!(get_language_name("qq").is_err());
}
