use thiserror::Error;

use shardtab_operators::OpError;

use crate::context::LifecycleState;

/// Result type local to shardtab-exec.
pub type Result<T> = std::result::Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("context is not initialized (state: {state})")]
    ContextNotReady { state: LifecycleState },

    #[error("process group: {0}")]
    Group(#[from] shardtab_comm::Error),

    #[error("ingestion from {location} failed: {error}")]
    Ingestion {
        location: String,
        #[source]
        error: shardtab_io::Error,
    },

    #[error("predicate failed at row {row}: {source}")]
    PredicateEvaluation {
        row: usize,
        #[source]
        source: shardtab_core::Error,
    },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("operator exec: {0}")]
    Operator(String),

    #[error("output: {0}")]
    Output(#[source] shardtab_io::Error),

    #[error(transparent)]
    Core(#[from] shardtab_core::Error),
}

impl From<OpError> for ExecError {
    fn from(e: OpError) -> Self {
        match e {
            OpError::PredicateEvaluation { row, source } => {
                ExecError::PredicateEvaluation { row, source }
            }
            OpError::Core(e) => ExecError::Core(e),
            other => ExecError::Operator(other.to_string()),
        }
    }
}
