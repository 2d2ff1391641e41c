//! Error type shared by every module of the library.

use std::path::PathBuf;

use thiserror::Error;

pub type KurticResult<T> = Result<T, KurticError>;

#[derive(Error, Debug)]
pub enum KurticError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("column {column} requested but rows only have {width} columns")]
    MissingColumn { column: usize, width: usize },

    #[error("table has {actual} rows, {expected} needed for {plots} plots of {shift} rows")]
    ShortTable {
        expected: usize,
        actual: usize,
        plots: usize,
        shift: usize,
    },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("block {block} is degenerate: {reason}")]
    DegenerateBlock { block: usize, reason: String },

    #[error("{kernel} kernel with (a = {a}, b = {b}) does not decay")]
    KernelNotDecaying { kernel: &'static str, a: f64, b: f64 },

    #[error("plotting failed: {0}")]
    Plot(String),
}

impl KurticError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::InvalidRange(message.into())
    }

    /// Wraps any plotters drawing error; the backend error types are generic
    /// over the backend, so only the message is kept.
    pub fn plot(err: impl std::fmt::Display) -> Self {
        Self::Plot(err.to_string())
    }
}
