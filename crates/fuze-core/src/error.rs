use thiserror::Error;

/// Failure conditions of the propagation core.
///
/// Field-level anomalies (`InvalidTimeout`, `InvalidDeadline`,
/// `InvalidRetryFlag`) are absorbed by the codec: they are reported to the
/// anomaly sink and decoding degrades to usable defaults. `NoBudgetPresent`
/// and `NoSpanBound` surface to the caller, which typically branches to
/// "proceed without a budget". Nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid timeout field: {0:?}")]
    InvalidTimeout(String),

    #[error("invalid deadline field: {0:?}")]
    InvalidDeadline(String),

    #[error("invalid retry flag: {0:?}")]
    InvalidRetryFlag(String),

    #[error("no budget fields present in carrier")]
    NoBudgetPresent,

    #[error("no span bound to execution context")]
    NoSpanBound,
}

pub type CoreResult<T> = Result<T, CoreError>;
