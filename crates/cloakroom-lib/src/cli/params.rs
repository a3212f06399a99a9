use crate::fetch::{FetchOptions, FetchRequest};
use crate::manifest::{Manifest, Plugin};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct InitParams {
    pub manifest_path: PathBuf,
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct AddParams {
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    pub key: String,
    pub plugin: Plugin,
    /// Set when the entry should be downloaded right after saving
    pub fetch: Option<FetchParams>,
}

#[derive(Debug, Clone)]
pub struct RemoveParams {
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    pub key: String,
    /// Artifact to delete along with the entry
    pub purge: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ListParams {
    pub manifest: Manifest,
}

#[derive(Debug, Clone)]
pub struct CleanParams {
    pub wardrobe: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RestoreParams {
    pub wardrobe: PathBuf,
    pub clean: bool,
    pub fetch: FetchParams,
}

#[derive(Debug, Clone)]
pub struct FetchParams {
    pub requests: Vec<FetchRequest>,
    pub overwrite: bool,
    pub options: FetchOptions,
}
