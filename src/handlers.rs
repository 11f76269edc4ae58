//! HTTP route handlers.
//!
//! Every page is rendered on request from the content directory, so edits to
//! a post show up on the next reload.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::Error;
use crate::models::ParagraphLink;
use crate::posts::{find_post, render_post};
use crate::templates::{index_page, post_page, STYLE};
use crate::AppState;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::PostNotFound(_) => (StatusCode::NOT_FOUND, "Post not found").into_response(),
            other => {
                error!("request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

// ============================================================================
// Index Handler
// ============================================================================

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let posts = state.load_posts();
    Html(index_page(&posts))
}

// ============================================================================
// Post Handlers
// ============================================================================

pub async fn view_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Html<String>, Error> {
    let post = find_post(&state.config.content_dir, &slug)?;
    let rendered = render_post(&post, &state.config)?;
    debug!("rendered {} with {} citable paragraphs", slug, rendered.paragraphs.len());
    Ok(Html(post_page(&post, &rendered)))
}

/// Citable paragraphs of a post with their deep links.
pub async fn post_paragraphs(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ParagraphLink>>, Error> {
    let post = find_post(&state.config.content_dir, &slug)?;
    let rendered = render_post(&post, &state.config)?;
    Ok(Json(rendered.paragraphs))
}

// ============================================================================
// Assets
// ============================================================================

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    const PARAGRAPH: &str = "An opening paragraph with enough words to be worth citing later.";

    fn state() -> (TempDir, Arc<AppState>) {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("first.md"),
            format!("---\ntitle: First\ndate: 2024-04-01\n---\n{PARAGRAPH}\n\n{PARAGRAPH}\n"),
        )
        .unwrap();
        let config = Config {
            content_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        (dir, Arc::new(AppState::new(config)))
    }

    #[tokio::test]
    async fn test_index_lists_posts() {
        let (_dir, state) = state();
        let Html(body) = index(State(state)).await;
        assert!(body.contains("/posts/first"));
    }

    #[tokio::test]
    async fn test_view_post_renders_annotations() {
        let (_dir, state) = state();
        let Html(body) = view_post(State(state), Path("first".to_string())).await.unwrap();
        assert!(body.contains("<title>First</title>"));
        assert!(body.contains(r#"id="p2""#));
        assert!(body.contains("para-link-icon"));
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let (_dir, state) = state();
        let err = view_post(State(state), Path("nope".to_string())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_paragraph_api() {
        let (_dir, state) = state();
        let Json(links) = post_paragraphs(State(state), Path("first".to_string())).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].id, "p2");
        assert_eq!(links[1].link, "http://127.0.0.1:3000/posts/first#p2");
    }
}
