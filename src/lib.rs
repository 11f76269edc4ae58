//! Marginalia - paragraph links and inline comments for a static blog.
//!
//! The page behaviors (identifier assignment, citation links, deep-link
//! navigation and the inline comment overlay) run against an in-memory
//! [`dom::Document`] through the [`host::Host`] seam, so they can be driven
//! headlessly and tested with a paused clock. The server renders posts with
//! the same annotations baked in.

use std::path::PathBuf;

pub mod citation;
pub mod config;
pub mod dom;
pub mod error;
pub mod handlers;
pub mod host;
pub mod identify;
pub mod metadata;
pub mod models;
pub mod navigate;
pub mod overlay;
pub mod page;
pub mod posts;
pub mod session;
pub mod templates;
pub mod widget;

// ============================================================================
// Application State
// ============================================================================

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        Self { config }
    }

    pub fn content_dir(&self) -> &PathBuf {
        &self.config.content_dir
    }

    pub fn load_posts(&self) -> Vec<models::Post> {
        posts::load_all_posts(&self.config.content_dir)
    }
}

// Re-export commonly used types
pub use config::Config;
pub use dom::{Document, NodeId, Selector};
pub use error::{Error, Result};
pub use host::{Host, RecordingHost};
pub use identify::{assign_ids, IdScheme, Registry};
pub use models::{Location, ParagraphLink, Post};
pub use overlay::CommentOverlay;
pub use page::Page;
pub use session::{Key, PageEvent, Session, SessionOptions};
pub use widget::{DiscussionWidget, GiscusFrame, WidgetStatus};
