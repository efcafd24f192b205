use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Period index {index} is out of range for a {len}-period series")]
    PeriodOutOfRange { index: usize, len: usize },

    #[error("Forecasting needs at least {required} periods of history, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("Unknown sales series: {0}")]
    UnknownSeries(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),
}
