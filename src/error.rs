use thiserror::Error;

/// Errors raised while building an MDP or running one of the solvers.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("no transition defined for state '{state}' and action '{action}'")]
    InvalidTransition { state: String, action: String },

    #[error("did not converge after {iterations} iterations (last max change {max_change})")]
    NonConvergence { iterations: usize, max_change: f64 },

    #[error("branch probabilities of '{state}'/'{action}' sum to {total}, expected 1")]
    MalformedProbabilityModel {
        state: String,
        action: String,
        total: f64,
    },

    #[error("'{reference}' references undefined state '{state}'")]
    UnknownState { reference: String, state: String },

    #[error("state '{state}' is defined more than once")]
    DuplicateState { state: String },

    #[error("action '{action}' is defined more than once for state '{state}'")]
    DuplicateAction { state: String, action: String },

    #[error("non-terminal state '{state}' has no actions")]
    NoActions { state: String },

    #[error("no initial state was set")]
    MissingInitialState,

    #[error("state #{state} is outside a table of {len} entries")]
    StateOutOfRange { state: usize, len: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to draw chart: {message}")]
    Plot { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
