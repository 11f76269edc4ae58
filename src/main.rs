//! Marginalia blog server.
//!
//! Serves Markdown posts from the content directory with citable paragraph
//! ids, copy-link controls and inline comment icons already in the markup.
//!
//! - `config`: environment settings and behavior constants
//! - `posts`: post loading and annotated rendering
//! - `templates`: page templates and the stylesheet
//! - `handlers`: HTTP route handlers

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marginalia::{handlers, AppState, Config};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marginalia=info")),
        )
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr.clone();
    let media_dir = config.content_dir.join("media");
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/", get(handlers::index))
        .route("/posts/{slug}", get(handlers::view_post))
        .route("/api/posts/{slug}/paragraphs", get(handlers::post_paragraphs))
        .route("/assets/marginalia.css", get(handlers::stylesheet))
        .nest_service("/media", ServeDir::new(media_dir))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("marginalia running at http://{}", bind_addr);
    info!("content directory: {}", state.content_dir().display());
    match &state.config.giscus {
        Some(giscus) => info!("inline comments via giscus ({})", giscus.repo),
        None => info!("giscus not configured; comment icons render without a widget"),
    }

    axum::serve(listener, app).await
}
