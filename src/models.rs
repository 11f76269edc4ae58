//! Data models shared by the page behaviors and the server.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::Result;
use crate::metadata::CommentMetadata;

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    pub path: PathBuf,
    pub title: String,
    pub date: Option<NaiveDate>,
    /// Whether the inline comment overlay is enabled for this post.
    pub comments: bool,
    /// Drafts are skipped when listing posts.
    pub draft: bool,
    pub body: String,
}

/// A citable paragraph as exposed by the paragraph API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphLink {
    pub id: String,
    pub excerpt: String,
    pub link: String,
}

// ============================================================================
// Page Location
// ============================================================================

/// The parts of `window.location` the behaviors care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub origin: String,
    pub pathname: String,
    /// Fragment including the leading `#`, or empty.
    pub hash: String,
}

impl Location {
    pub fn parse(href: &str) -> Result<Self> {
        let url = Url::parse(href)?;
        Ok(Self {
            origin: url.origin().ascii_serialization(),
            pathname: url.path().to_string(),
            hash: url
                .fragment()
                .filter(|f| !f.is_empty())
                .map(|f| format!("#{}", f))
                .unwrap_or_default(),
        })
    }
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_y: 0.0,
        }
    }
}

/// Client rect relative to the viewport, as `getBoundingClientRect` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A comment as the discussion widget hands it over, metadata still embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteComment {
    pub id: String,
    pub author: CommentAuthor,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// An inline comment attached to one paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: String,
    pub author: CommentAuthor,
    /// Comment text with the metadata block stripped.
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub metadata: CommentMetadata,
}
