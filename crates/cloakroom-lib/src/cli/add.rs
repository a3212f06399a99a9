use crate::cli::{AddParams, run_fetch};
use crate::error::CloakroomError;
use crate::manifest::save_manifest;
use tracing::info;

pub async fn run_add(params: AddParams) -> Result<(), CloakroomError> {
    let AddParams {
        mut manifest,
        manifest_path,
        key,
        plugin,
        fetch,
    } = params;

    let replaced = manifest.plugins.insert(key.clone(), plugin).is_some();
    save_manifest(&manifest, &manifest_path)?;
    info!(
        %key,
        manifest = %manifest_path.display(),
        replaced,
        "Added plugin"
    );

    if let Some(fetch) = fetch {
        run_fetch(fetch).await?;
    }
    Ok(())
}
