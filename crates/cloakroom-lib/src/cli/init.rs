use crate::cli::InitParams;
use crate::error::CloakroomError;
use crate::manifest::{Manifest, save_manifest};
use tracing::info;

pub async fn run_init(params: InitParams) -> Result<(), CloakroomError> {
    let InitParams {
        manifest_path,
        force,
    } = params;

    if force && manifest_path.exists() {
        info!(path = %manifest_path.display(), "Overwriting existing manifest");
    }
    save_manifest(&Manifest::default(), &manifest_path)?;

    info!(path = %manifest_path.display(), "Created manifest");
    Ok(())
}
