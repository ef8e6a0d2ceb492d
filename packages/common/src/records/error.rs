use thiserror::Error;

/// Errors from the tabular metadata store.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record store read failed: {0}")]
    Read(String),

    #[error("record store append failed: {0}")]
    Append(String),
}
