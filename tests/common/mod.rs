//! Test utilities and common setup.

use std::fs;
use std::net::SocketAddr;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request};
use tempfile::TempDir;

use lan_share::auth::{AllowAll, HostOnly};
use lan_share::{AppState, Config, ServedRoot, routes};

pub const TEST_PORT: u16 = 8080;

/// A served tree on disk plus the router serving it.
pub struct TestApp {
    pub dir: TempDir,
    pub root: ServedRoot,
    pub router: Router,
}

/// Build the fixture tree:
///
/// ```text
/// files/
///   docs/report.pdf
///   notes            (plain file, no extension)
///   empty/
/// ```
fn fixture() -> (TempDir, ServedRoot, Config) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("files");
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("docs/report.pdf"), b"%PDF-1.4 test").unwrap();
    fs::write(root.join("notes"), b"remember the milk").unwrap();
    fs::write(dir.path().join("config.toml"), "username = \"ada\"\n").unwrap();

    let config = Config {
        settings_file: dir.path().join("config.toml"),
        ..Config::default()
    };
    let served = ServedRoot::new(&root).unwrap();
    (dir, served, config)
}

/// App where every caller is treated as the host.
pub fn open_app() -> TestApp {
    let (dir, root, config) = fixture();
    let state = AppState::new(root.clone(), TEST_PORT, config).with_authorizer(AllowAll);
    TestApp {
        dir,
        root,
        router: routes::router(state),
    }
}

/// App where only connections from the host itself are trusted.
pub fn host_only_app() -> TestApp {
    let (dir, root, config) = fixture();
    let state = AppState::new(root.clone(), TEST_PORT, config).with_authorizer(HostOnly);
    TestApp {
        dir,
        root,
        router: routes::router(state),
    }
}

/// GET request carrying a peer address, as the real server would attach.
pub fn get_from(uri: &str, peer: &str) -> Request<Body> {
    let peer: SocketAddr = peer.parse().unwrap();
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .extension(ConnectInfo(peer))
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
