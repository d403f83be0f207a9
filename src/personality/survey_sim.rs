//! Simulated survey administration
//!
//! The persona answers each inventory item through the generator. Free-text
//! replies are matched against the Likert labels under a [`BoundedRetry`]
//! policy; items that never produce a recognisable answer take the policy's
//! fallback value.

use eyre::Result;
use std::collections::BTreeMap;

use super::scoring::{LIKERT_RANGE, likert_value};
use super::{Administration, SurveyResponse};
use crate::dataset::survey::SurveyItem;
use crate::generator::Generator;
use crate::model::EmotionalState;

const LIKERT_LABELS: [&str; 5] = [
    "Disagree strongly",
    "Disagree a little",
    "Neither agree nor disagree",
    "Agree a little",
    "Agree strongly",
];

/// Result of running a [`BoundedRetry`]
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    Matched { value: T, attempts: u32 },
    Fallback { value: T, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn value(self) -> T {
        match self {
            RetryOutcome::Matched { value, .. } | RetryOutcome::Fallback { value, .. } => value,
        }
    }
}

/// Bounded retry over free-text responses: at most `max_attempts` responses
/// are requested; the first one `matcher` accepts wins, otherwise `fallback`.
pub struct BoundedRetry<T, M> {
    max_attempts: u32,
    matcher: M,
    fallback: T,
}

impl<T, M> BoundedRetry<T, M>
where
    T: Clone,
    M: Fn(&str) -> Option<T>,
{
    pub fn new(max_attempts: u32, matcher: M, fallback: T) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            matcher,
            fallback,
        }
    }

    /// Request responses from `produce` (given the 1-based attempt number).
    /// Errors from `produce` propagate immediately.
    pub fn run<F>(&self, mut produce: F) -> Result<RetryOutcome<T>>
    where
        F: FnMut(u32) -> Result<String>,
    {
        for attempt in 1..=self.max_attempts {
            let response = produce(attempt)?;
            if let Some(value) = (self.matcher)(&response) {
                return Ok(RetryOutcome::Matched {
                    value,
                    attempts: attempt,
                });
            }
            log::debug!("Attempt {} unmatched: {:?}", attempt, response);
        }

        Ok(RetryOutcome::Fallback {
            value: self.fallback.clone(),
            attempts: self.max_attempts,
        })
    }
}

/// Find a Likert answer anywhere in a free-text reply
pub fn match_likert(text: &str) -> Option<u8> {
    let lowered = text.to_lowercase();

    // Longer labels first: "disagree a little" contains "agree a little"
    const PHRASES: [(&str, u8); 7] = [
        ("neither agree nor disagree", 3),
        ("disagree strongly", 1),
        ("strongly disagree", 1),
        ("disagree a little", 2),
        ("agree strongly", 5),
        ("strongly agree", 5),
        ("agree a little", 4),
    ];
    for (phrase, value) in PHRASES {
        if lowered.contains(phrase) {
            return Some(value);
        }
    }

    likert_value(text)
}

/// Answers inventory items in character
pub struct SurveySimulator<'a> {
    generator: &'a dyn Generator,
    max_attempts: u32,
    fallback_value: u8,
}

impl<'a> SurveySimulator<'a> {
    pub fn new(generator: &'a dyn Generator, max_attempts: u32, fallback_value: u8) -> Result<Self> {
        if !LIKERT_RANGE.contains(&fallback_value) {
            eyre::bail!("Survey fallback value must be 1-5, got {}", fallback_value);
        }
        Ok(Self {
            generator,
            max_attempts,
            fallback_value,
        })
    }

    /// Administer every item and return the answers as an `agent` survey
    pub fn administer(
        &self,
        uid: &str,
        items: &[SurveyItem],
        state: &EmotionalState,
        memory: Option<&str>,
    ) -> Result<SurveyResponse> {
        let system_prompt = self.system_prompt(state, memory);
        let policy = BoundedRetry::new(self.max_attempts, match_likert, self.fallback_value);
        let mut answers = BTreeMap::new();
        let mut fallbacks = 0;

        for item in items {
            let prompt = format!(
                "I see myself as someone who... {}\n\nRespond with exactly one of: {}.",
                item.statement,
                LIKERT_LABELS.join(", ")
            );

            let outcome = policy.run(|attempt| {
                if attempt > 1 {
                    log::debug!("Retrying item {} (attempt {})", item.number, attempt);
                }
                self.generator.generate(&prompt, &system_prompt)
            })?;

            match outcome {
                RetryOutcome::Fallback { attempts, .. } => {
                    log::warn!(
                        "{}: item {} fell back to {} after {} attempts",
                        uid,
                        item.number,
                        self.fallback_value,
                        attempts
                    );
                    fallbacks += 1;
                }
                RetryOutcome::Matched { attempts, .. } if attempts > 1 => {
                    log::debug!("{}: item {} matched on attempt {}", uid, item.number, attempts);
                }
                RetryOutcome::Matched { .. } => {}
            }
            answers.insert(item.number, outcome.value());
        }

        log::info!(
            "{}: simulated {} survey items ({} fallbacks)",
            uid,
            answers.len(),
            fallbacks
        );

        Ok(SurveyResponse {
            uid: uid.to_string(),
            administration: Administration::Agent,
            answers,
        })
    }

    fn system_prompt(&self, state: &EmotionalState, memory: Option<&str>) -> String {
        let mut prompt = format!(
            "You are a university student at the end of the semester, answering a personality questionnaire.\n\
             Answer honestly, as yourself.\n\n\
             Current Student status:\n{}",
            state
        );
        if let Some(memory) = memory {
            prompt.push_str("\n\nHow your recent weeks went:\n");
            prompt.push_str(memory);
        }
        prompt
    }
}
