use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("No manifest found in {}, run `cloakroom init` first", dir.display())]
    NotFound { dir: PathBuf },

    #[error("Found more than one manifest: {}", display_paths(candidates))]
    MultipleCandidates { candidates: Vec<PathBuf> },

    #[error("Unsupported manifest format for {} (expected .json, .toml, .yaml or .yml)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("YAML manifests are read-only, cannot write {}", path.display())]
    ReadOnlyFormat { path: PathBuf },

    #[error("Failed to load manifest from {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("Failed to save manifest to {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    #[error("Plugins {first} and {second} both install to {}", path.display())]
    DuplicateDestination {
        path: PathBuf,
        first: String,
        second: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
