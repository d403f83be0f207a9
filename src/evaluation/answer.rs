//! Multiple-choice answer extraction

use once_cell::sync::Lazy;
use regex::Regex;

/// Answer phrasings. The match starting earliest in the text wins; on a tie
/// the pattern listed first wins.
static ANSWER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\*\*\s*([ABCD])\b",
        r"answer\s*[:\-]?\s*([ABCD])\b",
        r"the answer is\s*([ABCD])\b",
        r"the correct answer is\s*([ABCD])\)?",
        r"i choose\s*(?:option\s*)?([ABCD])\b",
        r"option\s*([ABCD])\b",
        r"correct\s*[:\-]?\s*([ABCD])\b",
        r"it is\s*([ABCD])\b",
        r"my answer is\s*([ABCD])\b",
        r"choose\s*([ABCD])\b",
        r"final answer\s*[:\-]?\s*([ABCD])\b",
        r"\b([ABCD])\b\s*is correct",
        r"\b([ABCD])\b\s*\(correct\)",
        r"(?m)^[ \t]*([ABCD])[ \t]*$",
    ]
    .iter()
    .filter_map(|p| Regex::new(&format!("(?i){}", p)).ok())
    .collect()
});

/// Letter A-D chosen in a free-text reply, uppercased
pub fn extract_answer(text: &str) -> Option<String> {
    ANSWER_PATTERNS
        .iter()
        .filter_map(|re| {
            let caps = re.captures(text)?;
            Some((caps.get(0)?.start(), caps.get(1)?))
        })
        .min_by_key(|(start, _)| *start)
        .map(|(_, letter)| letter.as_str().to_uppercase())
}
