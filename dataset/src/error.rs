use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures of the dataset preparation pipeline.
///
/// Every variant is fatal. Count mismatches found by verification are
/// warnings and never appear here.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("source directory '{}' does not exist", path.display())]
    SourceNotFound { path: PathBuf },

    #[error(
        "images '{}' and '{}' share the stem '{stem}'",
        first.display(),
        second.display()
    )]
    DuplicateStem {
        stem: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid split ratios: {reason}")]
    InvalidRatio { reason: String },

    #[error("failed to write '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse manifest '{}'", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl PrepareError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
