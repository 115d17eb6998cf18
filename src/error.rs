use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Malformed input in {path}, line {line}: {message}")]
    Format {
        path: String,
        line: usize,
        message: String,
    },
    #[error("Invalid numeric domain: {0}")]
    Domain(String),
    #[error("Failed to serialize plot: {0}")]
    Serialize(#[from] std::fmt::Error),
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlotError {
    pub fn format(path: &str, line: usize, message: impl Into<String>) -> Self {
        PlotError::Format {
            path: path.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlotError::Io {
            path: path.into(),
            source,
        }
    }
}
