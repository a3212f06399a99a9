use crate::cli::RemoveParams;
use crate::error::CloakroomError;
use crate::manifest::save_manifest;
use crate::wardrobe::purge_artifact;
use tracing::info;

pub async fn run_remove(params: RemoveParams) -> Result<(), CloakroomError> {
    let RemoveParams {
        mut manifest,
        manifest_path,
        key,
        purge,
    } = params;

    if manifest.plugins.remove(&key).is_none() {
        return Err(CloakroomError::PluginNotFound { key });
    }
    save_manifest(&manifest, &manifest_path)?;
    info!(%key, manifest = %manifest_path.display(), "Removed plugin");

    if let Some(artifact) = purge {
        purge_artifact(&artifact).await?;
    }
    Ok(())
}
