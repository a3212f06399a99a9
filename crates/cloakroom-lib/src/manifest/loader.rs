use super::Manifest;
use super::error::ManifestError;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names probed, in order, when no manifest path is given.
pub const MANIFEST_CANDIDATES: [&str; 4] = [
    "cloakroom.json",
    "cloakroom.toml",
    "cloakroom.yaml",
    "cloakroom.yml",
];

/// Environment variables with this prefix override manifest fields,
/// e.g. `CLOAKROOM_HOST`.
pub const ENV_PREFIX: &str = "CLOAKROOM";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
    Yaml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(ManifestError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    fn file_format(self) -> FileFormat {
        match self {
            Self::Json => FileFormat::Json,
            Self::Toml => FileFormat::Toml,
            Self::Yaml => FileFormat::Yaml,
        }
    }
}

/// Finds the single manifest in `dir`.
pub fn discover_manifest(dir: &Path) -> Result<PathBuf, ManifestError> {
    let mut candidates: Vec<PathBuf> = MANIFEST_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .collect();

    match candidates.len() {
        0 => Err(ManifestError::NotFound {
            dir: dir.to_path_buf(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(ManifestError::MultipleCandidates { candidates }),
    }
}

pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    load_manifest_with_env(path, Environment::with_prefix(ENV_PREFIX))
}

/// Loads only what is written in `path`, ignoring `CLOAKROOM_*` overrides.
/// Commands that rewrite the manifest start from this.
pub fn load_manifest_file(path: &Path) -> Result<Manifest, ManifestError> {
    load_manifest_with_env(
        path,
        Environment::with_prefix(ENV_PREFIX).source(Some(config::Map::new())),
    )
}

/// Loads `path` layered under `environment`.
pub fn load_manifest_with_env(
    path: &Path,
    environment: Environment,
) -> Result<Manifest, ManifestError> {
    let format = ManifestFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "Loading manifest");

    let load_err = |source| ManifestError::Load {
        path: path.to_path_buf(),
        source,
    };

    ConfigBuilder::builder()
        .add_source(File::from(path).format(format.file_format()).required(true))
        .add_source(environment)
        .build()
        .map_err(load_err)?
        .try_deserialize()
        .map_err(load_err)
}

/// Writes the manifest in the format implied by the extension. The new
/// content goes to a sibling file first and is renamed over `path`.
pub fn save_manifest(manifest: &Manifest, path: &Path) -> Result<(), ManifestError> {
    let save_err = |reason: String| ManifestError::Save {
        path: path.to_path_buf(),
        reason,
    };

    let content = match ManifestFormat::from_path(path)? {
        ManifestFormat::Json => serde_json::to_string_pretty(manifest)
            .map(|json| json + "\n")
            .map_err(|e| save_err(format!("JSON serialization failed: {e}")))?,
        ManifestFormat::Toml => toml::to_string_pretty(manifest)
            .map_err(|e| save_err(format!("TOML serialization failed: {e}")))?,
        ManifestFormat::Yaml => {
            return Err(ManifestError::ReadOnlyFormat {
                path: path.to_path_buf(),
            });
        }
    };

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    std::fs::write(&staging, content).map_err(|e| save_err(e.to_string()))?;
    std::fs::rename(&staging, path).map_err(|e| {
        let _ = std::fs::remove_file(&staging);
        save_err(e.to_string())
    })?;

    debug!(path = %path.display(), plugins = manifest.plugins.len(), "Saved manifest");
    Ok(())
}
