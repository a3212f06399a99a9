use assert_fs::prelude::*;
use cloakroom_e2e_tests::{
    Asset, ReleaseServer, init_tracing, latest_path, plugin, sha256_hex, tagged_path,
    write_manifest,
};
use cloakroom_lib::cli::{
    Command, ResolvedCommand, RestoreParams, resolve_command_in, run_restore,
};
use cloakroom_lib::error::CloakroomError;
use cloakroom_lib::fetch::{FetchError, FetchErrorKind};
use predicates::prelude::*;
use std::path::Path;

fn restore_params(dir: &Path, force: bool, max_retries: u32) -> RestoreParams {
    let command = Command::Restore {
        manifest_path: None,
        wardrobe: None,
        clean: false,
        force,
        max_retries,
        concurrency: None,
    };
    match resolve_command_in(command, dir).expect("Failed to resolve restore command") {
        ResolvedCommand::Restore(params) => params,
        _ => unreachable!("Resolved command type mismatch"),
    }
}

#[tokio::test]
async fn test_restore_end_to_end() {
    init_tracing();
    let server = ReleaseServer::start().await.expect("Failed to start server");
    let temp = assert_fs::TempDir::new().unwrap();
    let wardrobe = temp.child("wardrobe");

    server.serve(
        tagged_path("acme/widget", "v1.2.0", "widget-1.2.0.jar"),
        Asset::Body(b"widget release".to_vec()),
    );
    server.serve(
        latest_path("acme/theme", "theme.jar"),
        Asset::Body(b"theme release".to_vec()),
    );
    write_manifest(
        temp.path(),
        &server.host(),
        wardrobe.path(),
        vec![
            (
                "acme/widget",
                plugin("v1.2.0", "widget-1.2.0.jar", Some(sha256_hex(b"widget release"))),
            ),
            ("acme/theme", plugin("latest", "theme.jar", None)),
        ],
    )
    .unwrap();

    let result = run_restore(restore_params(temp.path(), false, 0)).await;

    assert!(result.is_ok(), "Restore should succeed: {result:?}");
    wardrobe.child("widget-1.2.0.jar").assert("widget release");
    wardrobe.child("theme.jar").assert("theme release");
    wardrobe
        .child("widget-1.2.0.jar.partial")
        .assert(predicate::path::missing());
    assert_eq!(server.total_hits(), 2);
}

#[tokio::test]
async fn test_restore_skips_present_artifacts_unless_forced() {
    init_tracing();
    let server = ReleaseServer::start().await.unwrap();
    let temp = assert_fs::TempDir::new().unwrap();
    let wardrobe = temp.child("wardrobe");
    let path = tagged_path("acme/widget", "v1", "widget.jar");

    server.serve(path.clone(), Asset::Body(b"fresh".to_vec()));
    wardrobe.child("widget.jar").write_binary(b"local copy").unwrap();
    write_manifest(
        temp.path(),
        &server.host(),
        wardrobe.path(),
        vec![("acme/widget", plugin("v1", "widget.jar", None))],
    )
    .unwrap();

    run_restore(restore_params(temp.path(), false, 0)).await.unwrap();
    wardrobe.child("widget.jar").assert("local copy");
    assert_eq!(server.hits(&path), 0);

    for _ in 0..2 {
        run_restore(restore_params(temp.path(), true, 0)).await.unwrap();
        wardrobe.child("widget.jar").assert("fresh");
    }
    assert_eq!(server.hits(&path), 2);
}

#[tokio::test]
async fn test_digest_mismatch_never_reaches_wardrobe() {
    init_tracing();
    let server = ReleaseServer::start().await.unwrap();
    let temp = assert_fs::TempDir::new().unwrap();
    let wardrobe = temp.child("wardrobe");
    let path = tagged_path("acme/widget", "v1", "widget.jar");

    server.serve(path.clone(), Asset::Body(b"tampered".to_vec()));
    write_manifest(
        temp.path(),
        &server.host(),
        wardrobe.path(),
        vec![(
            "acme/widget",
            plugin("v1", "widget.jar", Some(sha256_hex(b"genuine"))),
        )],
    )
    .unwrap();

    let result = run_restore(restore_params(temp.path(), false, 0)).await;

    match result {
        Err(CloakroomError::Fetch(failed)) => {
            assert_eq!(failed.key, "acme/widget");
            assert!(matches!(failed.source, FetchError::Verification { .. }));
        }
        other => panic!("Expected a verification failure, got {other:?}"),
    }
    wardrobe.child("widget.jar").assert(predicate::path::missing());
    wardrobe
        .child("widget.jar.partial")
        .assert(predicate::path::missing());
    assert_eq!(server.hits(&path), 1);
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    init_tracing();
    let server = ReleaseServer::start().await.unwrap();
    let temp = assert_fs::TempDir::new().unwrap();
    let wardrobe = temp.child("wardrobe");
    let path = tagged_path("acme/widget", "v1", "widget.jar");

    server.serve(
        path.clone(),
        Asset::Flaky {
            failures: 1,
            status: 503,
            body: b"eventually".to_vec(),
        },
    );
    write_manifest(
        temp.path(),
        &server.host(),
        wardrobe.path(),
        vec![("acme/widget", plugin("v1", "widget.jar", None))],
    )
    .unwrap();

    run_restore(restore_params(temp.path(), false, 1)).await.unwrap();

    wardrobe.child("widget.jar").assert("eventually");
    assert_eq!(server.hits(&path), 2);
}

#[tokio::test]
async fn test_one_failure_does_not_block_the_rest() {
    init_tracing();
    let server = ReleaseServer::start().await.unwrap();
    let temp = assert_fs::TempDir::new().unwrap();
    let wardrobe = temp.child("wardrobe");

    server.serve(
        tagged_path("acme/good", "v1", "good.jar"),
        Asset::Body(b"good".to_vec()),
    );
    server.serve(
        tagged_path("acme/gone", "v1", "gone.jar"),
        Asset::Status(404),
    );
    write_manifest(
        temp.path(),
        &server.host(),
        wardrobe.path(),
        vec![
            ("acme/good", plugin("v1", "good.jar", None)),
            ("acme/gone", plugin("v1", "gone.jar", None)),
        ],
    )
    .unwrap();

    let result = run_restore(restore_params(temp.path(), false, 0)).await;

    match result {
        Err(CloakroomError::Fetch(failed)) => {
            assert_eq!(failed.key, "acme/gone");
            assert_eq!(failed.source.kind(), FetchErrorKind::Transport);
        }
        other => panic!("Expected a transport failure, got {other:?}"),
    }
    wardrobe.child("good.jar").assert("good");
    wardrobe.child("gone.jar").assert(predicate::path::missing());
}

#[tokio::test]
async fn test_artifact_names_are_percent_encoded() {
    init_tracing();
    let server = ReleaseServer::start().await.unwrap();
    let temp = assert_fs::TempDir::new().unwrap();
    let wardrobe = temp.child("wardrobe");

    server.serve(
        "/acme/widget/releases/download/v1/my%20widget.jar",
        Asset::Body(b"spaced".to_vec()),
    );
    write_manifest(
        temp.path(),
        &server.host(),
        wardrobe.path(),
        vec![("acme/widget", plugin("v1", "my widget.jar", None))],
    )
    .unwrap();

    run_restore(restore_params(temp.path(), false, 0)).await.unwrap();

    wardrobe.child("my widget.jar").assert("spaced");
}

#[tokio::test]
async fn test_restore_with_clean_removes_strays() {
    init_tracing();
    let server = ReleaseServer::start().await.unwrap();
    let temp = assert_fs::TempDir::new().unwrap();
    let wardrobe = temp.child("wardrobe");

    server.serve(
        tagged_path("acme/widget", "v1", "widget.jar"),
        Asset::Body(b"widget".to_vec()),
    );
    wardrobe.child("stray.jar").write_str("old").unwrap();
    write_manifest(
        temp.path(),
        &server.host(),
        wardrobe.path(),
        vec![("acme/widget", plugin("v1", "widget.jar", None))],
    )
    .unwrap();

    let mut params = restore_params(temp.path(), false, 0);
    params.clean = true;
    run_restore(params).await.unwrap();

    wardrobe.child("stray.jar").assert(predicate::path::missing());
    wardrobe.child("widget.jar").assert("widget");
}
