use std::io;

use fintrack_config::ConfigError;
use fintrack_core::CoreError;
use thiserror::Error;

/// Failures that end a CLI session.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Usage(String),
    #[error("{0} command(s) failed")]
    CommandsFailed(usize),
}
