mod error;
mod loader;
mod model;

pub use error::ManifestError;
pub use loader::{
    ENV_PREFIX, MANIFEST_CANDIDATES, ManifestFormat, discover_manifest, load_manifest,
    load_manifest_file, load_manifest_with_env, save_manifest,
};
pub use model::{DEFAULT_WARDROBE, MANIFEST_VERSION, Manifest, Plugin};
