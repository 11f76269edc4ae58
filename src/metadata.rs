//! Inline comment metadata, carried inside the hosted comment body.
//!
//! The discussion widget stores plain comment text, so the paragraph a
//! comment belongs to travels in an HTML comment block at the top of the
//! body:
//!
//! ```text
//! <!-- inline-comment-metadata
//! {
//!   "type": "inline",
//!   "version": 1,
//!   "paragraphId": "p3",
//!   ...
//! }
//! -->
//!
//! The reader's comment.
//! ```
//!
//! Bodies written before the `version` field existed decode as version 1.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::Result;

pub const METADATA_VERSION: u32 = 1;

const MARKER_OPEN: &str = "<!-- inline-comment-metadata";
const MARKER_CLOSE: &str = "-->";

static METADATA_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- inline-comment-metadata\n(.*?)\n-->").expect("metadata pattern")
});

static METADATA_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- inline-comment-metadata\n.*?\n-->\s*").expect("metadata strip pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Inline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentMetadata {
    #[serde(rename = "type")]
    pub kind: CommentKind,
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub paragraph_id: String,
    /// Excerpt of the paragraph, at most `MAX_CITATION_LENGTH` characters.
    pub paragraph_text: String,
    /// Page path the comment was written on.
    pub post_url: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

fn legacy_version() -> u32 {
    1
}

impl CommentMetadata {
    pub fn inline(
        paragraph_id: &str,
        paragraph_text: &str,
        post_url: &str,
        timestamp: DateTime<Utc>,
        max_excerpt: usize,
    ) -> Self {
        Self {
            kind: CommentKind::Inline,
            version: METADATA_VERSION,
            paragraph_id: paragraph_id.to_string(),
            paragraph_text: excerpt(paragraph_text, max_excerpt),
            post_url: post_url.to_string(),
            timestamp,
        }
    }
}

/// A hosted comment split back into its metadata and the reader's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub metadata: CommentMetadata,
    pub body: String,
}

/// First `max_chars` characters of `text`, trimmed.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let cut: String = text.chars().take(max_chars).collect();
    cut.trim().to_string()
}

/// Prefix `text` with the metadata block.
pub fn encode(metadata: &CommentMetadata, text: &str) -> Result<String> {
    let json = serde_json::to_string_pretty(metadata)?;
    Ok(format!("{}\n{}\n{}\n\n{}", MARKER_OPEN, json, MARKER_CLOSE, text))
}

/// Split a hosted comment body. `Ok(None)` for ordinary comments without a
/// metadata block; an error when the block is present but unreadable.
pub fn decode(body: &str) -> Result<Option<Decoded>> {
    let Some(captures) = METADATA_BLOCK.captures(body) else {
        return Ok(None);
    };
    let json = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let metadata: CommentMetadata = serde_json::from_str(json)?;
    let text = METADATA_STRIP.replace(body, "").into_owned();
    Ok(Some(Decoded {
        metadata,
        body: text,
    }))
}

/// ISO-8601 with millisecond precision and a `Z` suffix, the shape
/// `Date.prototype.toISOString` produces.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
