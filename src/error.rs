use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the learning engine and its persistence layer
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid value for `{name}`: {value} (must be in the interval [0, 1])")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("the set of possible actions is empty")]
    EmptyActionSpace,

    #[error("action {0} appears more than once in the action set")]
    DuplicateAction(String),

    #[error("action {0} is not in the action set")]
    UnknownAction(String),

    #[error("reward must be finite, got {0}")]
    NonFiniteReward(f64),

    #[error("could not parse '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("invalid saved learner: {0}")]
    Format(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
