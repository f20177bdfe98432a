use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use axum::{Router, routing::get};
use std::{path::Path, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};

// WebSocket channel on `/ws`; every other path is a static asset under `static_root`.
// ServeDir refuses `..` segments, answers 404 for missing files and 500 for read errors.
pub fn app(state: Arc<AppState>, static_root: &Path) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(static_root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::RinkTuning;
    use crate::use_cases::{MatchHandle, MatchSettings};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;

    // Creates `<tmp>/<unique>/html/index.html` plus a sibling secret outside the root.
    fn static_fixture() -> PathBuf {
        let base = std::env::temp_dir().join(format!("curling-routes-{}", uuid::Uuid::new_v4()));
        let root = base.join("html");
        std::fs::create_dir_all(&root).expect("create static root");
        std::fs::write(root.join("index.html"), "<h1>curling</h1>").expect("write index");
        std::fs::write(root.join("client.js"), "console.log(1);").expect("write js");
        std::fs::write(base.join("secret.txt"), "hidden").expect("write secret");
        root
    }

    fn build_test_app(root: &Path) -> Router {
        let game = MatchHandle::spawn(MatchSettings {
            event_channel_capacity: 16,
            snapshot_broadcast_capacity: 16,
            tick_interval: Duration::from_millis(50),
            tuning: RinkTuning::default(),
        });
        app(Arc::new(AppState { game }), root)
    }

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("expected request to build");
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn when_root_is_requested_then_index_html_is_served() {
        let root = static_fixture();

        let response = get(build_test_app(&root), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE]
            .to_str()
            .expect("ascii header")
            .to_string();
        assert!(content_type.starts_with("text/html"));
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        assert_eq!(&body[..], b"<h1>curling</h1>");
    }

    #[tokio::test]
    async fn when_script_is_requested_then_javascript_content_type_is_used() {
        let root = static_fixture();

        let response = get(build_test_app(&root), "/client.js").await;

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE]
            .to_str()
            .expect("ascii header");
        assert!(content_type.contains("javascript"));
    }

    #[tokio::test]
    async fn when_file_is_missing_then_returns_404() {
        let root = static_fixture();

        let response = get(build_test_app(&root), "/missing.css").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn when_path_escapes_the_root_then_file_is_not_served() {
        let root = static_fixture();

        for uri in ["/../secret.txt", "/..%2fsecret.txt", "/%2e%2e/secret.txt"] {
            let response = get(build_test_app(&root), uri).await;

            assert_ne!(response.status(), StatusCode::OK, "{uri} escaped the root");
        }
    }
}
