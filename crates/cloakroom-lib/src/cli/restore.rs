use crate::cli::{FetchParams, RestoreParams};
use crate::error::CloakroomError;
use crate::fetch::{AggregateResult, FetchOutcome, FetchReport, HttpSource, Orchestrator};
use crate::progress::TerminalProgress;
use crate::wardrobe::{WardrobeError, clean_wardrobe};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn run_restore(params: RestoreParams) -> Result<(), CloakroomError> {
    let RestoreParams {
        wardrobe,
        clean,
        fetch,
    } = params;

    if clean {
        match clean_wardrobe(&wardrobe).await {
            Ok(_) => {}
            Err(WardrobeError::NotFound { path }) => {
                debug!(wardrobe = %path.display(), "Nothing to clean");
            }
            Err(e) => return Err(e.into()),
        }
    }

    run_fetch(fetch).await
}

/// Fetches `params.requests`, printing one line per outcome. Ctrl-C cancels
/// whatever is still running. Fails with the first failed request.
pub async fn run_fetch(params: FetchParams) -> Result<(), CloakroomError> {
    let FetchParams {
        requests,
        overwrite,
        options,
    } = params;

    if requests.is_empty() {
        info!("Manifest has no plugins, nothing to restore");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling downloads");
                cancel.cancel();
            }
        }
    });

    info!(count = requests.len(), host = %options.host, "Restoring plugins");
    let orchestrator = Orchestrator::new(HttpSource::new()?, options)
        .with_reporter(Arc::new(TerminalProgress::new()));
    let result = orchestrator.run(&cancel, requests, overwrite).await;
    interrupt.abort();

    print_summary(&result);
    result.into_result()?;
    Ok(())
}

fn print_summary(result: &AggregateResult) {
    for report in result.reports() {
        println!("{}", format_report(report));
    }
    info!(
        succeeded = result.succeeded(),
        skipped = result.skipped(),
        failed = result.failures().count(),
        "Restore finished"
    );
}

pub fn format_report(report: &FetchReport) -> String {
    let FetchReport { request, outcome } = report;
    let destination = request.destination_path.display();
    match outcome {
        FetchOutcome::Skipped => format!("skipped {} -> {destination}", request.key),
        FetchOutcome::Succeeded => format!(
            "fetched {}@{} -> {destination}",
            request.key, request.version
        ),
        FetchOutcome::Failed(error) => format!("failed  {} -> {destination}: {error}", request.key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, FetchRequest};
    use std::path::PathBuf;

    fn report(outcome: FetchOutcome) -> FetchReport {
        FetchReport {
            request: FetchRequest {
                key: "acme/widget".to_string(),
                version: "v1".to_string(),
                artifact_name: "widget.jar".to_string(),
                destination_path: PathBuf::from("/srv/widget.jar"),
                expected_digest: None,
            },
            outcome,
        }
    }

    #[test]
    fn test_report_lines() {
        assert_eq!(
            format_report(&report(FetchOutcome::Succeeded)),
            "fetched acme/widget@v1 -> /srv/widget.jar"
        );
        assert_eq!(
            format_report(&report(FetchOutcome::Skipped)),
            "skipped acme/widget -> /srv/widget.jar"
        );
        assert!(
            format_report(&report(FetchOutcome::Failed(FetchError::Cancelled)))
                .starts_with("failed  acme/widget -> /srv/widget.jar: ")
        );
    }
}
