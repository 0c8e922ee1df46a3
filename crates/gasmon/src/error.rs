//! gasmon error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GasmonError {
    #[error("config error: {0}")]
    Config(String),

    #[error("insight error: {0}")]
    Insight(#[from] gas_insight::InsightError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GasmonResult<T> = Result<T, GasmonError>;
