use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    #[error("Failed to parse {path:?}: {reason}")]
    ParseFailure { path: PathBuf, reason: String },

    #[error("Failed to import {path:?}: {reason}")]
    ImportFailure { path: PathBuf, reason: String },

    #[error("Unsupported configuration for {handle}: {reason}")]
    UnsupportedConfiguration { handle: String, reason: String },

    #[error("The {0} library is empty")]
    EmptyLibrary(&'static str),

    #[error("Failed to load {path:?}: {reason}")]
    LoadFailure { path: PathBuf, reason: String },
}

impl AssetError {
    pub fn not_found(what: &'static str, name: impl ToString) -> Self {
        AssetError::NotFound {
            what,
            name: name.to_string(),
        }
    }

    pub fn import_failure(path: impl Into<PathBuf>, error: anyhow::Error) -> Self {
        AssetError::ImportFailure {
            path: path.into(),
            // `{:#}` renders the whole context chain on one line
            reason: format!("{:#}", error),
        }
    }

    pub fn load_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AssetError::LoadFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
