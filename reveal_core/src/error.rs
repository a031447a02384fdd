use book_model::{ModelError, WorkId};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevealError {
    #[error("no work with id {0} in the library")]
    UnknownWork(WorkId),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, RevealError>;
