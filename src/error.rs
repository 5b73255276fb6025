use core::fmt;

/// Result alias for `eigencut`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the clustering engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input matrix had zero rows.
    EmptyInput,

    /// Row vector dimension mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid configuration value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A cancellation token was triggered mid-run.
    Cancelled,

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Cancelled => write!(f, "clustering was cancelled"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}
