use adapt::Error as AdaptError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Adapt(#[from] AdaptError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to write record: {0}")]
    Json(#[from] serde_json::Error),
}
