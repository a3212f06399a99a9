use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use cloakroom_lib::manifest::{Manifest, Plugin, save_manifest};
use eyre::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// What the release server answers for one asset path.
#[derive(Clone, Debug)]
pub enum Asset {
    Body(Vec<u8>),
    Status(u16),
    /// Answers `status` for the first `failures` requests, then `body`
    Flaky {
        failures: usize,
        status: u16,
        body: Vec<u8>,
    },
}

#[derive(Default)]
struct ServerState {
    assets: Mutex<HashMap<String, Asset>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// A GitHub-shaped release download server on `127.0.0.1`. Shuts down on drop.
pub struct ReleaseServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    cancel: CancellationToken,
}

impl ReleaseServer {
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState::default());
        let cancel = CancellationToken::new();

        let app = Router::new()
            .fallback(serve_asset)
            .with_state(Arc::clone(&state));

        tokio::spawn({
            let shutdown = cancel.clone().cancelled_owned();
            async move {
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    tracing::error!("Release server failed: {e}");
                }
            }
        });

        tracing::debug!(%addr, "Release server listening");
        Ok(Self {
            addr,
            state,
            cancel,
        })
    }

    /// Value for the manifest's `host` field.
    pub fn host(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Registers `asset` under a raw (already percent-encoded) request path.
    pub fn serve(&self, path: impl Into<String>, asset: Asset) {
        self.state
            .assets
            .lock()
            .unwrap()
            .insert(path.into(), asset);
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }
}

impl Drop for ReleaseServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn serve_asset(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    let hit = {
        let mut hits = state.hits.lock().unwrap();
        let hit = hits.entry(path.clone()).or_insert(0);
        *hit += 1;
        *hit
    };
    let asset = state.assets.lock().unwrap().get(&path).cloned();

    match asset {
        Some(Asset::Body(body)) => (StatusCode::OK, body).into_response(),
        Some(Asset::Status(status)) => status_response(status),
        Some(Asset::Flaky {
            failures,
            status,
            body,
        }) => {
            if hit <= failures {
                status_response(status)
            } else {
                (StatusCode::OK, body).into_response()
            }
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn status_response(status: u16) -> Response {
    StatusCode::from_u16(status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        .into_response()
}

pub fn tagged_path(key: &str, tag: &str, artifact: &str) -> String {
    format!("/{key}/releases/download/{tag}/{artifact}")
}

pub fn latest_path(key: &str, artifact: &str) -> String {
    format!("/{key}/releases/latest/download/{artifact}")
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn plugin(release: &str, artifact: &str, hash: Option<String>) -> Plugin {
    let mut plugin = Plugin::new(release, artifact);
    plugin.hash = hash;
    plugin
}

/// Writes `dir/cloakroom.json` pointing at `host` with `wardrobe` as the
/// restore directory.
pub fn write_manifest(
    dir: &Path,
    host: &str,
    wardrobe: &Path,
    plugins: Vec<(&str, Plugin)>,
) -> Result<PathBuf> {
    let manifest = Manifest {
        host: Some(host.to_string()),
        path: Some(wardrobe.to_path_buf()),
        plugins: plugins
            .into_iter()
            .map(|(key, plugin)| (key.to_string(), plugin))
            .collect(),
        ..Manifest::default()
    };
    let path = dir.join("cloakroom.json");
    save_manifest(&manifest, &path)?;
    Ok(path)
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("cloakroom_lib=debug,cloakroom_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
