use std::fmt;

mod k_means;

pub use k_means::KMeans;
pub use k_means::Metadata as KMeansMetadata;

/// Common errors thrown by algorithms.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input sets don't have matching lengths.
    InputLenMismatch { expected: usize, actual: usize },

    /// The requested part count cannot be satisfied by the input: either it
    /// is zero, or there are fewer rows than parts.
    InvalidPartCount { part_count: usize, row_count: usize },

    /// The underlying clustering implementation failed.
    Fit(linfa_clustering::KMeansError),
}

impl From<linfa_clustering::KMeansError> for Error {
    fn from(err: linfa_clustering::KMeansError) -> Error {
        Error::Fit(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputLenMismatch { expected, actual } => write!(
                f,
                "input sets don't have the same length (expected {expected} items, got {actual})",
            ),
            Error::InvalidPartCount {
                part_count,
                row_count,
            } => write!(
                f,
                "cannot partition {row_count} rows into {part_count} parts",
            ),
            Error::Fit(_) => write!(f, "clustering failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Fit(err) => Some(err),
            _ => None,
        }
    }
}
