//! Core simulation records
//!
//! Everything persisted per time step lives here: the emotional state, the
//! time index it belongs to, and the assessment results recorded alongside it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Emotional state of a persona.
///
/// Values are conceptually 0-100 but are not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub stamina: i64,
    pub knowledge: i64,
    pub stress: i64,
    pub happy: i64,
    pub sleep: i64,
    pub social: i64,
}

impl EmotionalState {
    /// Field names in the order they are prompted and parsed
    pub const FIELDS: [&'static str; 6] = ["stamina", "knowledge", "stress", "happy", "sleep", "social"];
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self {
            stamina: 100,
            knowledge: 50,
            stress: 50,
            happy: 50,
            sleep: 100,
            social: 50,
        }
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stamina={} knowledge={} stress={} happy={} sleep={} social={}",
            self.stamina, self.knowledge, self.stress, self.happy, self.sleep, self.social
        )
    }
}

/// A simulated week, optionally narrowed to a single day.
///
/// Ordering is by week, then day; a missing day sorts before any real day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeIndex {
    pub week: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl TimeIndex {
    pub fn week(week: u32) -> Self {
        Self { week, day: None }
    }

    pub fn day(week: u32, day: u32) -> Self {
        Self { week, day: Some(day) }
    }

    fn sort_key(&self) -> (u32, i64) {
        (self.week, self.day.map(i64::from).unwrap_or(-1))
    }
}

impl Ord for TimeIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for TimeIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.day {
            Some(day) => write!(f, "week {}, day {}", self.week, day),
            None => write!(f, "week {}", self.week),
        }
    }
}

/// How a time step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    /// State replaced from a parsed analysis block
    Updated,
    /// Analysis could not be parsed; previous state carried forward
    Fallback,
    /// Generation capability failed; previous state carried forward
    Failed,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepOutcome::Updated => "updated",
            StepOutcome::Fallback => "fallback",
            StepOutcome::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Exam result for one time step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicScoreRecord {
    pub week: u32,
    pub topic: String,
    pub score: f64,
    pub max_score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
}

impl AcademicScoreRecord {
    pub const NO_EXAM_TOPIC: &'static str = "no exam this week";
    pub const ERROR_TOPIC: &'static str = "error in evaluation";

    /// Zero record for a week without exam questions
    pub fn no_exam(week: u32) -> Self {
        Self::zero(week, Self::NO_EXAM_TOPIC)
    }

    /// Zero record for a week whose evaluation could not complete
    pub fn evaluation_error(week: u32) -> Self {
        Self::zero(week, Self::ERROR_TOPIC)
    }

    fn zero(week: u32, topic: &str) -> Self {
        Self {
            week,
            topic: topic.to_string(),
            score: 0.0,
            max_score: 0.0,
            correct_answers: 0,
            total_questions: 0,
        }
    }
}

/// Terminal-milestone project result.
///
/// `score` is `None` when the judge's response contained no `<n>/30` score,
/// which keeps an unparsed response distinct from a true zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAssessment {
    pub score: Option<f64>,
    pub max_score: f64,
    pub feedback: String,
}

/// One persisted time step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    #[serde(flatten)]
    pub time: TimeIndex,
    pub emotion: EmotionalState,
    pub outcome: StepOutcome,
    pub narrative: String,
    pub reasoning: String,
    pub assessment: AcademicScoreRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectAssessment>,
}
