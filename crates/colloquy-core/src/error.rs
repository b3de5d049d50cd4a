use thiserror::Error;

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("{capability} failed: {message}")]
    Model {
        capability: &'static str,
        message: String,
    },

    #[error("{0} is not configured")]
    Unavailable(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NlpError {
    /// Wrap any displayable failure from a model runtime.
    pub fn model(capability: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Model {
            capability,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NlpError>;
