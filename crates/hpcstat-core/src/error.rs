//! Error types for hpcstat core.

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
