use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown retry flag: {0}")]
    UnknownRetryFlag(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
