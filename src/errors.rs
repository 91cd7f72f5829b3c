// Error types and error handling module
// This file defines the workflow error taxonomy and the exit-code
// mapping used at the CLI boundary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("builder error: {0}")]
    Builder(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("no unsigned payload found: {0}")]
    NotFound(String),
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    #[error("combine error: {0}")]
    Combine(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("usage error: {0}")]
    Usage(String),
}

impl FlowError {
    /// Process exit code for this error kind. Every kind is non-zero so
    /// calling pipelines can detect failure; usage errors keep code 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlowError::Usage(_) => 1,
            FlowError::Builder(_) => 2,
            FlowError::Persistence(_) => 3,
            FlowError::NotFound(_) => 4,
            FlowError::MalformedSignature(_) => 5,
            FlowError::Combine(_) => 6,
            FlowError::Transport(_) => 7,
        }
    }
}
