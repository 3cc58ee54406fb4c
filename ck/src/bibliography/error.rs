//! Bibliography error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a bibliography file that exists
#[derive(Debug, Error)]
pub enum BibliographyError {
    #[error("Failed to read bibliography {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse bibliography {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BibliographyError {
    /// Path of the file that failed to load
    pub fn path(&self) -> &PathBuf {
        match self {
            BibliographyError::Read { path, .. } => path,
            BibliographyError::Parse { path, .. } => path,
        }
    }

    /// Check if the file was readable but not valid JSON
    pub fn is_parse(&self) -> bool {
        matches!(self, BibliographyError::Parse { .. })
    }
}
