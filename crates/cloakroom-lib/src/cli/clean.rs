use crate::cli::CleanParams;
use crate::error::CloakroomError;
use crate::wardrobe::clean_wardrobe;

pub async fn run_clean(params: CleanParams) -> Result<(), CloakroomError> {
    clean_wardrobe(&params.wardrobe).await?;
    Ok(())
}
