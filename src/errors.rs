use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in `nforetag`.
///
/// Per-file failures inside a walk are logged and counted rather than
/// propagated; this type surfaces from configuration handling and from the
/// single-file helpers that the walker calls.
#[derive(Error, Debug)]
pub enum Error {
    /// An error related to file system I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that occurred during regex compilation.
    #[error("Pattern compilation failed: {0}")]
    Regex(#[from] regex::Error),

    /// An error that occurred while reading or writing the YAML configuration.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No configuration file was found in any searched location.
    #[error(
        "Config file '{}' not found. Searched in:\n  - {}",
        .path.display(),
        join_paths(.searched)
    )]
    ConfigNotFound { path: PathBuf, searched: Vec<PathBuf> },

    /// A path that is about to be replaced has no parent directory.
    #[error("Could not get parent directory for {}", .0.display())]
    NoParent(PathBuf),

    /// An error that occurred during the processing of a single file.
    #[error("File processing failed for {path}: {source}")]
    Processing {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An error related to persisting a temporary file.
    #[error("Tempfile error: {0}")]
    TempFile(#[from] tempfile::PersistError),

    /// A file's bytes were not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A convenient type alias for `Result<T, nforetag::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps any error with the path of the file being processed.
    pub fn processing(path: impl Into<PathBuf>, source: impl Into<Error>) -> Self {
        Error::Processing {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n  - ")
}
