use crate::cli::args::Command;
use crate::cli::params::{
    AddParams, CleanParams, FetchParams, InitParams, ListParams, RemoveParams, RestoreParams,
};
use crate::error::CloakroomError;
use crate::fetch::{FetchOptions, RepositoryKey, RetryPolicy, ValidationError};
use crate::manifest::{
    MANIFEST_CANDIDATES, Manifest, Plugin, discover_manifest, load_manifest, load_manifest_file,
};
use crate::verification::Sha256Digest;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Init(InitParams),
    Add(AddParams),
    Remove(RemoveParams),
    List(ListParams),
    Clean(CleanParams),
    Restore(RestoreParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, CloakroomError> {
    let working_dir = std::env::current_dir()?;
    resolve_command_in(command, &working_dir)
}

/// Resolves `command` with `working_dir` as the place to look for (or create)
/// the manifest.
pub fn resolve_command_in(
    command: Command,
    working_dir: &Path,
) -> Result<ResolvedCommand, CloakroomError> {
    match command {
        Command::Init {
            manifest_path,
            force,
        } => {
            let manifest_path = manifest_path
                .map(|path| working_dir.join(path))
                .unwrap_or_else(|| working_dir.join(MANIFEST_CANDIDATES[0]));

            if manifest_path.exists() && !force {
                return Err(CloakroomError::ManifestExists {
                    path: manifest_path,
                });
            }

            Ok(ResolvedCommand::Init(InitParams {
                manifest_path,
                force,
            }))
        }
        Command::Add {
            manifest_path,
            wardrobe,
            key,
            release,
            artifact,
            hash,
            fetch,
            force,
        } => {
            let (manifest_path, effective) = open_manifest(manifest_path, working_dir)?;
            let stored = load_manifest_file(&manifest_path)?;
            validate_key(&key)?;

            if stored.plugins.contains_key(&key) && !force {
                return Err(CloakroomError::PluginExists { key });
            }
            if release.trim().is_empty() || artifact.trim().is_empty() {
                return Err(CloakroomError::CliArgumentValidation {
                    details: "--release and --artifact must not be empty.".to_string(),
                });
            }
            if let Some(hash) = &hash {
                hash.parse::<Sha256Digest>()
                    .map_err(|e| invalid_plugin(&key, e.into()))?;
            }

            let mut plugin = Plugin::new(release, artifact);
            plugin.hash = hash;

            let wardrobe = resolve_wardrobe(wardrobe, &effective, working_dir);
            let mut updated = stored.clone();
            updated.plugins.insert(key.clone(), plugin.clone());
            updated.fetch_requests(&wardrobe)?;

            let fetch = fetch.then(|| FetchParams {
                requests: vec![plugin.fetch_request(&key, &wardrobe)],
                overwrite: force,
                options: fetch_options(&effective, RetryPolicy::default(), None),
            });

            Ok(ResolvedCommand::Add(AddParams {
                manifest: stored,
                manifest_path,
                key,
                plugin,
                fetch,
            }))
        }
        Command::Remove {
            manifest_path,
            wardrobe,
            key,
            purge,
        } => {
            let (manifest_path, effective) = open_manifest(manifest_path, working_dir)?;
            let stored = load_manifest_file(&manifest_path)?;

            let Some(plugin) = stored.plugins.get(&key) else {
                return Err(CloakroomError::PluginNotFound { key });
            };
            let purge = purge.then(|| {
                plugin.destination(&resolve_wardrobe(wardrobe, &effective, working_dir))
            });

            Ok(ResolvedCommand::Remove(RemoveParams {
                manifest: stored,
                manifest_path,
                key,
                purge,
            }))
        }
        Command::List { manifest_path } => {
            let (_, manifest) = open_manifest(manifest_path, working_dir)?;
            Ok(ResolvedCommand::List(ListParams { manifest }))
        }
        Command::Clean {
            manifest_path,
            wardrobe,
        } => {
            let wardrobe = match wardrobe {
                Some(wardrobe) => working_dir.join(wardrobe),
                None => {
                    let (_, manifest) = open_manifest(manifest_path, working_dir)?;
                    resolve_wardrobe(None, &manifest, working_dir)
                }
            };
            Ok(ResolvedCommand::Clean(CleanParams { wardrobe }))
        }
        Command::Restore {
            manifest_path,
            wardrobe,
            clean,
            force,
            max_retries,
            concurrency,
        } => {
            if concurrency == Some(0) {
                return Err(CloakroomError::CliArgumentValidation {
                    details: "concurrency must be greater than 0.".to_string(),
                });
            }

            let (_, manifest) = open_manifest(manifest_path, working_dir)?;
            let wardrobe = resolve_wardrobe(wardrobe, &manifest, working_dir);
            let requests = manifest.fetch_requests(&wardrobe)?;
            let retry = RetryPolicy {
                max_retries,
                ..RetryPolicy::default()
            };

            Ok(ResolvedCommand::Restore(RestoreParams {
                wardrobe,
                clean,
                fetch: FetchParams {
                    requests,
                    overwrite: force,
                    options: fetch_options(&manifest, retry, concurrency),
                },
            }))
        }
    }
}

fn open_manifest(
    manifest_path: Option<PathBuf>,
    working_dir: &Path,
) -> Result<(PathBuf, Manifest), CloakroomError> {
    let manifest_path = match manifest_path {
        Some(path) => working_dir.join(path),
        None => discover_manifest(working_dir)?,
    };
    debug!(path = %manifest_path.display(), "Using manifest");
    let manifest = load_manifest(&manifest_path)?;
    Ok((manifest_path, manifest))
}

fn resolve_wardrobe(wardrobe: Option<PathBuf>, manifest: &Manifest, working_dir: &Path) -> PathBuf {
    let wardrobe = wardrobe.unwrap_or_else(|| manifest.wardrobe().to_path_buf());
    working_dir.join(wardrobe)
}

fn fetch_options(manifest: &Manifest, retry: RetryPolicy, concurrency: Option<usize>) -> FetchOptions {
    FetchOptions {
        host: manifest.host().to_string(),
        retry,
        max_concurrency: concurrency,
    }
}

fn validate_key(key: &str) -> Result<(), CloakroomError> {
    RepositoryKey::parse(key)
        .map(|_| ())
        .map_err(|e| invalid_plugin(key, e))
}

fn invalid_plugin(key: &str, source: ValidationError) -> CloakroomError {
    CloakroomError::InvalidPlugin {
        key: key.to_string(),
        source,
    }
}
