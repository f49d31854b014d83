//! Web front end: animation gallery page, status API, static image serving.

use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use cloud_render::Variant;

use crate::config::ServerConfig;
use crate::status::StatusHandle;

pub struct AppState {
    pub status: StatusHandle,
    pub output_dir: std::path::PathBuf,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .nest_service("/images", ServeDir::new(state.output_dir.clone()))
        .layer(cors)
        .layer(Extension(state))
}

/// GET / - Gallery page with all four animations.
async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let status = state.status.snapshot().await;

    let mut cards = String::new();
    for variant in Variant::ALL {
        let filename = variant.gif_filename();
        let exists = state.output_dir.join(&filename).exists();
        if exists {
            cards.push_str(&format!(
                r#"<div class="card"><h2>{}</h2><img src="/images/{}" alt="{}"></div>"#,
                variant.title(),
                filename,
                variant.name(),
            ));
        } else {
            cards.push_str(&format!(
                r#"<div class="card"><h2>{}</h2><p class="pending">Not generated yet</p></div>"#,
                variant.title(),
            ));
        }
    }

    let last_update = status.last_update.as_deref().unwrap_or("never");
    let page = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>GPV Cloud Animation</title>
<style>
body {{ background: #111; color: #eee; font-family: sans-serif; margin: 2em; }}
.card {{ margin-bottom: 2em; }}
.card img {{ max-width: 100%; border: 1px solid #444; }}
.pending {{ color: #888; }}
.meta {{ color: #aaa; font-size: 0.9em; }}
</style>
</head>
<body>
<h1>GPV Cloud Animation</h1>
<p class="meta">Last update: {last_update} | Status: {status}</p>
{cards}
</body>
</html>"#,
        status = serde_json::to_value(status.status)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default(),
    );

    Html(page)
}

/// GET /status - Current update pipeline status.
async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(state.status.snapshot().await)
}

/// GET /health - Liveness check.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "cloud-app"
    }))
}

/// Bind and serve until the process exits.
pub async fn run_server(state: Arc<AppState>, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    info!(addr = %addr, "Starting web server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_builds() {
        let state = Arc::new(AppState {
            status: StatusHandle::new(),
            output_dir: std::path::PathBuf::from("static/images"),
        });
        let _router = create_router(state);
    }
}
