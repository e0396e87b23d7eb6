//! Error types for docpipe operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a conversion run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("missing directory: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("missing configuration file: {}", .0.display())]
    MissingConfFile(PathBuf),

    #[error("unable to find executable: {0}")]
    ToolNotFound(String),

    #[error("{command} returned non-zero exit status {status}")]
    ToolFailed { command: String, status: i32 },
}

impl Error {
    /// Process exit code for this error. A missing external executable is
    /// distinguished from all other failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::ToolNotFound(_) => 127,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
