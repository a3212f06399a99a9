use super::error::ManifestError;
use crate::fetch::{DEFAULT_HOST, FetchRequest};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const MANIFEST_VERSION: &str = "1.0";
pub const DEFAULT_WARDROBE: &str = "/opt/keycloak/plugins";

fn default_version() -> String {
    MANIFEST_VERSION.to_string()
}

/// The set of artifacts a wardrobe should contain.
///
/// `plugins` is keyed by `owner/repo`. A `BTreeMap` keeps writes stable and
/// makes every listing come out sorted by key.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Wardrobe directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub plugins: BTreeMap<String, Plugin>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Plugin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "tag")]
    pub release: String,
    pub artifact: String,
    /// Overrides the wardrobe for this plugin only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: default_version(),
            host: Some(DEFAULT_HOST.to_string()),
            path: None,
            plugins: BTreeMap::new(),
        }
    }
}

impl Manifest {
    pub fn host(&self) -> &str {
        self.host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(DEFAULT_HOST)
    }

    pub fn wardrobe(&self) -> &Path {
        self.path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new(DEFAULT_WARDROBE))
    }

    pub fn fetch_request(&self, key: &str, wardrobe: &Path) -> Option<FetchRequest> {
        self.plugins
            .get(key)
            .map(|plugin| plugin.fetch_request(key, wardrobe))
    }

    /// One request per plugin, in key order. Two plugins resolving to the
    /// same file are rejected.
    pub fn fetch_requests(&self, wardrobe: &Path) -> Result<Vec<FetchRequest>, ManifestError> {
        let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
        let mut requests = Vec::with_capacity(self.plugins.len());

        for (key, plugin) in &self.plugins {
            let request = plugin.fetch_request(key, wardrobe);
            if let Some(first) = claimed.insert(request.destination_path.clone(), key) {
                return Err(ManifestError::DuplicateDestination {
                    path: request.destination_path,
                    first: first.to_string(),
                    second: key.clone(),
                });
            }
            requests.push(request);
        }

        Ok(requests)
    }
}

impl Plugin {
    pub fn new(release: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            name: None,
            release: release.into(),
            artifact: artifact.into(),
            path: None,
            hash: None,
        }
    }

    /// Configured name, or the repository half of the key.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name
            .as_deref()
            .unwrap_or_else(|| key.rsplit('/').next().unwrap_or(key))
    }

    pub fn destination(&self, wardrobe: &Path) -> PathBuf {
        self.path.as_deref().unwrap_or(wardrobe).join(&self.artifact)
    }

    pub fn fetch_request(&self, key: &str, wardrobe: &Path) -> FetchRequest {
        FetchRequest {
            key: key.to_string(),
            version: self.release.clone(),
            artifact_name: self.artifact.clone(),
            destination_path: self.destination(wardrobe),
            expected_digest: self
                .hash
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
        }
    }
}
