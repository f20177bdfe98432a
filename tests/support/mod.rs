// Shared primitives for one-time server bootstrapping across integration tests.
#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    // `Arc` shares data between threads; `OnceLock` writes a value only once.
    sync::{Arc, OnceLock},
    time::Duration,
};

// Global base URL used by all tests after the server publishes its bound address.
static SERVER_URL: OnceLock<String> = OnceLock::new();
// Static root served by the shared test server.
static STATIC_ROOT: OnceLock<PathBuf> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub const INDEX_HTML: &str = "<!doctype html><title>curling</title>";

// Ensure the test server is running and return the shared base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let static_root = create_static_root();
        let _ = STATIC_ROOT.set(static_root.clone());

        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                curling_server::run(listener, static_root)
                    .await
                    .expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

pub fn ws_url() -> String {
    let base = ensure_server();
    format!(
        "ws://{}/ws",
        base.strip_prefix("http://").expect("http base url")
    )
}

pub fn static_root() -> &'static Path {
    ensure_server();
    STATIC_ROOT.get().expect("static root initialized")
}

// Unique asset directory with a secret file next to (not inside) the served root.
fn create_static_root() -> PathBuf {
    let base = std::env::temp_dir().join(format!("curling-it-{}", uuid::Uuid::new_v4()));
    let root = base.join("html");
    std::fs::create_dir_all(&root).expect("create static root");
    std::fs::write(root.join("index.html"), INDEX_HTML).expect("write index");
    std::fs::write(root.join("style.css"), "body { margin: 0; }").expect("write css");
    std::fs::write(base.join("secret.txt"), "outside the root").expect("write secret");
    root
}

// Wait for URL publication and then wait for the server socket to accept TCP connections.
fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
