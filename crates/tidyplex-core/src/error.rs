use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a pipeline run. Per-item trouble (a sibling that
/// would not move, a folder that would not recycle, one dead tracker
/// source among several) is logged and counted instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No tracker list source could be fetched")]
    NoUsableSource,
}

pub type Result<T> = std::result::Result<T, Error>;
