//! Error types for the site energy management shell.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EmsError {
    #[error("{}", join_config_errors(.0))]
    Config(Vec<ConfigError>),

    #[error("ledger store error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid tick input: {0}")]
    InvalidInput(String),
}

impl From<ConfigError> for EmsError {
    fn from(err: ConfigError) -> Self {
        EmsError::Config(vec![err])
    }
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, EmsError>;
