use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Base path does not exist: {}", .0.display())]
    BasePathMissing(PathBuf),

    #[error("Base path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("{0}")]
    Other(String),
}
