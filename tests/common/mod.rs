#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

use photoglow::app::build_app;
use photoglow::client::{AppContext, ImageUpload};
use photoglow::state::AppState;

/// Binds a router on an ephemeral localhost port and serves it in the
/// background.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Stub for the external AI processor: fixed endpoints with canned
/// responses. `/auto-enhance` answers slowly so tests can observe the
/// pending state and exercise the stale-response discard;
/// `/enhance-face` always fails.
pub fn stub_processor(replace_hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/auto-enhance",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Json(json!({ "processed_image": "results/enhanced.png" }))
            }),
        )
        .route(
            "/vangogh-style",
            post(|| async { Json(json!({ "processed_image": "results/vangogh.png" })) }),
        )
        .route(
            "/remove-background",
            post(|| async { Json(json!({ "processed_image": "results/no-bg.png" })) }),
        )
        .route(
            "/analyze-aesthetic",
            post(|| async {
                Json(json!({
                    "score": 7.2,
                    "composition": { "aspect_ratio": 1.5, "follows_rule_of_thirds": true },
                    "exposure": { "brightness": 120.0, "is_well_exposed": true },
                    "suggestions": ["Consider recomposing using the rule of thirds"]
                }))
            }),
        )
        .route(
            "/replace-background",
            post(
                |State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "processed_image": "results/replaced.png" }))
                },
            ),
        )
        .route(
            "/enhance-face",
            post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json::<Value>(json!({ "error": "face model unavailable" })),
                )
            }),
        )
        .with_state(replace_hits)
}

pub struct Harness {
    pub ctx: AppContext,
    pub state: AppState,
    pub api_url: String,
    pub processor_url: String,
    pub replace_hits: Arc<AtomicUsize>,
}

/// Full-stack test rig: the real backend over in-memory stores, the stub
/// processor, and a fresh client context pointed at both.
pub async fn harness() -> Harness {
    let state = AppState::fake();
    let api_addr = spawn(build_app(state.clone())).await;

    let replace_hits = Arc::new(AtomicUsize::new(0));
    let processor_addr = spawn(stub_processor(replace_hits.clone())).await;

    let api_url = format!("http://{api_addr}");
    let processor_url = format!("http://{processor_addr}");
    let ctx = AppContext::new(api_url.clone(), processor_url.clone(), None);
    Harness {
        ctx,
        state,
        api_url,
        processor_url,
        replace_hits,
    }
}

pub fn sample_photo() -> ImageUpload {
    ImageUpload::new(
        "photo.png",
        "image/png",
        vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a],
    )
}

pub fn sample_background() -> ImageUpload {
    ImageUpload::new(
        "beach.jpg",
        "image/jpeg",
        vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10],
    )
}
