use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read source: {0}")]
    Io(#[from] io::Error),

    /// No host language is known for the file's extension
    #[error("No GraphQL source parser for {}", .0.display())]
    UnsupportedFileType(PathBuf),
}
