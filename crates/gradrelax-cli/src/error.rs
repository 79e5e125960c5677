use gradrelax::core::params::error::ParamLoadError;
use gradrelax::engine::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load parameter tables: {0}")]
    Parameters(#[from] ParamLoadError),

    #[error("Invalid relaxation settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Residue '{0}' does not appear in any parameter table")]
    UnknownResidue(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
