//! Arabic input validation

use regex::Regex;

/// Character classes covering Arabic letters, diacritics, presentation
/// forms, and supplements
const ARABIC_BLOCKS: &str =
    r"[\u{0600}-\u{06FF}\u{0750}-\u{077F}\u{08A0}-\u{08FF}\u{FB50}-\u{FDFF}\u{FE70}-\u{FEFF}]";

/// Whether the text is non-empty and contains Arabic characters
pub fn is_valid_arabic(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    Regex::new(ARABIC_BLOCKS)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}
