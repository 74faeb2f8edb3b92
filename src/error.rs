//! Crate-level error type and `Result` alias.
//! Every failure of a run lands in one variant here, and each variant knows the
//! process exit code it maps to.
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::io::codec::{DecodeError, EncodeError};

pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for I/O failures that carry no OS error number.
pub const EXIT_IO: i32 = 5;
/// Exit code for an interrupted run (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Syntax(#[from] crimp_es5::SyntaxError),

    #[error("read error: {0}")]
    Decode(#[from] DecodeError),

    #[error("write error: {0}")]
    Encode(#[from] EncodeError),

    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("source map error: {0}")]
    SourceMap(#[from] serde_json::Error),

    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Wrap an I/O error raised while working on `path`.
    pub fn file(path: &Path, source: std::io::Error) -> Self {
        Error::File {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Syntax(_) | Error::Decode(_) | Error::Encode(_) | Error::SourceMap(_) => 1,
            Error::File { source, .. } | Error::Io(source) => {
                source.raw_os_error().unwrap_or(EXIT_IO)
            }
            Error::Interrupted => EXIT_INTERRUPTED,
        }
    }
}
