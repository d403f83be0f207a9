//! Survey scoring
//!
//! 44-item Big Five inventory. Each item belongs to exactly one trait; a fixed
//! set of items is reverse coded (`v` becomes `6 - v`). A trait score is the
//! mean of its answered items times 20, mapping the 1-5 scale onto 0-100.
//! Items are always summed in ascending item order so results are
//! bit-for-bit reproducible.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use super::{Administration, Trait, TraitProfile};
use crate::error::SimError;

/// One survey administration for one persona: item number -> Likert value (1-5).
/// Unanswered items are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyResponse {
    pub uid: String,
    pub administration: Administration,
    pub answers: BTreeMap<u8, u8>,
}

/// Valid Likert values
pub const LIKERT_RANGE: RangeInclusive<u8> = 1..=5;

/// Items whose scale is inverted before averaging
pub const REVERSE_ITEMS: [u8; 16] = [2, 6, 8, 9, 12, 18, 21, 23, 24, 27, 31, 34, 35, 37, 41, 43];

/// Item membership per trait, ascending
pub fn trait_items(t: Trait) -> &'static [u8] {
    match t {
        Trait::Extraversion => &[1, 6, 11, 16, 21, 26, 31, 36],
        Trait::Agreeableness => &[2, 7, 12, 17, 22, 27, 32, 37, 42],
        Trait::Conscientiousness => &[3, 8, 13, 18, 23, 28, 33, 38, 43],
        Trait::Neuroticism => &[4, 9, 14, 19, 24, 29, 34, 39],
        Trait::Openness => &[5, 10, 15, 20, 25, 30, 35, 40, 41, 44],
    }
}

pub fn is_reverse(item: u8) -> bool {
    REVERSE_ITEMS.contains(&item)
}

/// Likert value after reverse coding
pub fn coded_value(item: u8, value: u8) -> Result<u8, SimError> {
    if !LIKERT_RANGE.contains(&value) {
        return Err(SimError::InvalidAnswer { item, value });
    }
    Ok(if is_reverse(item) { 6 - value } else { value })
}

/// Map a Likert answer label (or bare digit) to 1-5
pub fn likert_value(label: &str) -> Option<u8> {
    let normalized = label.trim().to_lowercase();
    match normalized.as_str() {
        "disagree strongly" | "strongly disagree" | "1" => Some(1),
        "disagree a little" | "2" => Some(2),
        "neither agree nor disagree" | "3" => Some(3),
        "agree a little" | "4" => Some(4),
        "agree strongly" | "strongly agree" | "5" => Some(5),
        _ => None,
    }
}

/// Score one trait; `None` when none of its items were answered
fn trait_score(t: Trait, answers: &BTreeMap<u8, u8>) -> Result<Option<f64>, SimError> {
    let mut sum = 0u32;
    let mut count = 0u32;

    for &item in trait_items(t) {
        if let Some(&value) = answers.get(&item) {
            sum += u32::from(coded_value(item, value)?);
            count += 1;
        }
    }

    if count == 0 {
        return Ok(None);
    }
    Ok(Some(f64::from(sum) / f64::from(count) * 20.0))
}

/// Build a trait profile from raw answers
pub fn score_answers(answers: &BTreeMap<u8, u8>) -> Result<TraitProfile, SimError> {
    let score = |t: Trait| {
        trait_score(t, answers)?.ok_or_else(|| SimError::missing(format!("no answered items for {}", t.name())))
    };

    Ok(TraitProfile {
        extraversion: score(Trait::Extraversion)?,
        agreeableness: score(Trait::Agreeableness)?,
        conscientiousness: score(Trait::Conscientiousness)?,
        neuroticism: score(Trait::Neuroticism)?,
        openness: score(Trait::Openness)?,
    })
}
