use crate::fetch::{FailedFetch, TransportError, ValidationError};
use crate::manifest::ManifestError;
use crate::wardrobe::WardrobeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloakroomError {
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Wardrobe error: {0}")]
    Wardrobe(#[from] WardrobeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Fetch(#[from] FailedFetch),

    #[error("HTTP client error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid plugin {key}: {source}")]
    InvalidPlugin {
        key: String,
        #[source]
        source: ValidationError,
    },

    #[error("Invalid arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Manifest already exists at {} (use --force to overwrite)", path.display())]
    ManifestExists { path: PathBuf },

    #[error("Plugin {key} is already in the manifest (use --force to replace it)")]
    PluginExists { key: String },

    #[error("Plugin {key} is not in the manifest")]
    PluginNotFound { key: String },

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
