//! Error taxonomy for the simulation loop

use thiserror::Error;

use crate::model::TimeIndex;

/// Errors that stop a persona or a single time step
#[derive(Debug, Error)]
pub enum SimError {
    /// A required file or reference record is absent
    #[error("missing input data: {0}")]
    MissingInputData(String),

    /// A Likert answer outside 1-5
    #[error("invalid answer for item {item}: {value} (expected 1-5)")]
    InvalidAnswer { item: u8, value: u8 },

    /// A step would be recorded before or at an already recorded step
    #[error("step {time} is not after the last recorded step {last}")]
    OutOfOrderStep { time: TimeIndex, last: TimeIndex },

    /// The generative capability failed to return a response
    #[error("generation failed: {0}")]
    ExternalCapabilityFailure(String),
}

impl SimError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingInputData(what.into())
    }

    pub fn generation(err: eyre::Report) -> Self {
        Self::ExternalCapabilityFailure(format!("{:#}", err))
    }
}

/// Why an analysis response could not be decoded into a state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no brace-delimited block found")]
    NoStructuredBlock,

    #[error("block is not a key/value literal: {0}")]
    InvalidLiteral(String),

    #[error("missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("unexpected key '{0}'")]
    UnexpectedKey(String),

    #[error("value for '{key}' is not an integer: {value}")]
    NonNumeric { key: String, value: String },
}
