//! State-update parsing
//!
//! The analyzer's reply carries a dictionary literal followed by free-text
//! reasoning. The first `{...}` block is decoded into a full replacement
//! [`EmotionalState`]; anything that does not decode cleanly degrades to the
//! previous state with [`FALLBACK_REASONING`].

use lazy_regex::regex;
use std::collections::HashMap;

use crate::error::ParseError;
use crate::model::{EmotionalState, StepOutcome};

pub const FALLBACK_REASONING: &str = "parse failed";

/// Parser result for one analysis reply
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub state: EmotionalState,
    pub reasoning: String,
    pub outcome: StepOutcome,
}

/// Decode an analysis reply, falling back to `previous` on any rejection
pub fn parse_state_update(text: &str, previous: &EmotionalState) -> StateUpdate {
    match decode_state_block(text) {
        Ok((state, reasoning)) => StateUpdate {
            state,
            reasoning,
            outcome: StepOutcome::Updated,
        },
        Err(e) => {
            log::warn!("Failed to parse state update ({}); keeping previous state", e);
            StateUpdate {
                state: *previous,
                reasoning: FALLBACK_REASONING.to_string(),
                outcome: StepOutcome::Fallback,
            }
        }
    }
}

/// First brace block as a state, plus the trimmed text after it
pub fn decode_state_block(text: &str) -> Result<(EmotionalState, String), ParseError> {
    let block = regex!(r"(?s)\{.*?\}").find(text).ok_or(ParseError::NoStructuredBlock)?;

    let inner = &text[block.start() + 1..block.end() - 1];
    let values = parse_literal(inner)?;

    let field = |key: &'static str| values.get(key).copied().ok_or(ParseError::MissingKey(key));
    let state = EmotionalState {
        stamina: field("stamina")?,
        knowledge: field("knowledge")?,
        stress: field("stress")?,
        happy: field("happy")?,
        sleep: field("sleep")?,
        social: field("social")?,
    };

    Ok((state, text[block.end()..].trim().to_string()))
}

/// `key: value` pairs separated by commas; one trailing comma is allowed
fn parse_literal(inner: &str) -> Result<HashMap<String, i64>, ParseError> {
    let mut segments: Vec<&str> = inner.split(',').collect();
    if segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }

    let mut values = HashMap::new();
    for segment in segments {
        let Some((raw_key, raw_value)) = segment.split_once(':') else {
            return Err(ParseError::InvalidLiteral(segment.trim().to_string()));
        };

        let key = parse_key(raw_key.trim())?;
        if !EmotionalState::FIELDS.contains(&key.as_str()) {
            return Err(ParseError::UnexpectedKey(key));
        }

        let value = parse_integer(raw_value.trim()).ok_or_else(|| ParseError::NonNumeric {
            key: key.clone(),
            value: raw_value.trim().to_string(),
        })?;

        // Duplicate keys: last one wins
        values.insert(key, value);
    }

    Ok(values)
}

fn parse_key(raw: &str) -> Result<String, ParseError> {
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            return match rest.strip_suffix(quote) {
                Some(key) if !key.contains(quote) => Ok(key.to_string()),
                _ => Err(ParseError::InvalidLiteral(raw.to_string())),
            };
        }
    }

    if regex!(r"^[A-Za-z_][A-Za-z0-9_]*$").is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err(ParseError::InvalidLiteral(raw.to_string()))
    }
}

/// Integer literal, or a float literal with no fractional part
fn parse_integer(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    if !regex!(r"^[+-]?(\d+\.\d*|\.\d+|\d+)([eE][+-]?\d+)?$").is_match(raw) {
        return None;
    }

    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64).then_some(value as i64)
}
