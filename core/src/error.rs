use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Out-of-range or nonsensical parameter. Fatal: the run never starts.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Dataset-level schema failure. Individual bad rows are dropped and
    /// counted instead; this fires only when a required field is missing
    /// from every row of a non-empty input.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
