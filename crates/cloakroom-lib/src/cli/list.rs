use crate::cli::ListParams;
use crate::error::CloakroomError;
use crate::manifest::Manifest;

pub async fn run_list(params: ListParams) -> Result<(), CloakroomError> {
    let lines = format_plugin_list(&params.manifest);
    if lines.is_empty() {
        println!("No plugins in manifest");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// One line per plugin, sorted by key.
pub fn format_plugin_list(manifest: &Manifest) -> Vec<String> {
    manifest
        .plugins
        .iter()
        .map(|(key, plugin)| {
            let mut line = format!(
                "{key} ({}) tag={} artifact={}",
                plugin.display_name(key),
                plugin.release,
                plugin.artifact
            );
            if let Some(path) = &plugin.path {
                line.push_str(&format!(" path={}", path.display()));
            }
            if let Some(hash) = &plugin.hash {
                line.push_str(&format!(" hash={hash}"));
            }
            line
        })
        .collect()
}
