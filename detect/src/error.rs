use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    /// The external detection program is not installed.
    #[error("detection dependency unavailable: {reason}")]
    DependencyUnavailable { reason: String },

    #[error("no model weights found, searched {searched:?}")]
    ModelNotFound { searched: Vec<PathBuf> },

    #[error("cannot decode image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Model(#[from] anyhow::Error),
}
