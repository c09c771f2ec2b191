use crate::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("no final answer after {limit} tool rounds")]
    MaxIterationsExceeded { limit: usize },

    #[error("agent declares function '{0}' but no local implementation exists")]
    UnsupportedTool(String),
}

pub type Result<T> = std::result::Result<T, Error>;
