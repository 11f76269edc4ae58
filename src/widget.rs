//! Discussion widget (Giscus) integration.
//!
//! The overlay only engages when the page embeds the widget's client
//! script, and only talks to the widget once its iframe has appeared. The
//! read path is a known gap: the iframe is cross-origin, so [`GiscusFrame`]
//! cannot see existing comments and reports none.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{SIMULATED_POST_LATENCY, WIDGET_POLL_INTERVAL, WIDGET_READY_TIMEOUT};
use crate::dom::{NodeId, Selector};
use crate::error::{Error, Result};
use crate::models::RemoteComment;
use crate::page::Page;

pub const SCRIPT_SELECTOR: &str = r#"script[src*="giscus.app/client.js"]"#;
pub const FRAME_SELECTOR: &str = "iframe.giscus-frame";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetStatus {
    /// Readiness has not been determined yet.
    Pending,
    /// The page does not embed the widget.
    NotConfigured,
    Ready(NodeId),
    /// The frame never appeared within the deadline.
    TimedOut,
}

impl WidgetStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, WidgetStatus::Ready(_))
    }
}

#[async_trait]
pub trait DiscussionWidget: Send + Sync {
    /// Post a comment body (metadata block included).
    async fn post(&self, body: &str) -> Result<()>;

    /// All comments of the page's discussion.
    async fn fetch_comments(&self) -> Result<Vec<RemoteComment>>;
}

/// Resolve once the widget frame is present, the deadline passes, or
/// immediately when the page does not embed the widget.
pub async fn wait_until_ready(page: &Arc<Page>) -> WidgetStatus {
    if page.query(&Selector::new(SCRIPT_SELECTOR)).is_none() {
        info!("[Inline Comments] giscus not configured");
        return WidgetStatus::NotConfigured;
    }

    let frame = Selector::new(FRAME_SELECTOR);
    let poll = async {
        let mut ticker = interval_at(Instant::now() + WIDGET_POLL_INTERVAL, WIDGET_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Some(node) = page.query(&frame) {
                return node;
            }
        }
    };

    match timeout(WIDGET_READY_TIMEOUT, poll).await {
        Ok(node) => {
            info!("[Inline Comments] giscus ready");
            WidgetStatus::Ready(node)
        }
        Err(_) => {
            warn!("[Inline Comments] giscus load timeout");
            WidgetStatus::TimedOut
        }
    }
}

/// The embedded Giscus iframe.
///
/// Posting is simulated: it succeeds after a fixed latency, unless the body
/// carries no text, which Giscus refuses. Fetching returns
/// nothing because the frame's contents are not readable from the page.
#[derive(Debug, Default, Clone)]
pub struct GiscusFrame;

#[async_trait]
impl DiscussionWidget for GiscusFrame {
    async fn post(&self, body: &str) -> Result<()> {
        if body.trim().is_empty() {
            return Err(Error::WidgetPost("comment body is empty".to_string()));
        }
        debug!("[Inline Comments] posting comment via giscus ({} bytes)", body.len());
        tokio::time::sleep(SIMULATED_POST_LATENCY).await;
        Ok(())
    }

    async fn fetch_comments(&self) -> Result<Vec<RemoteComment>> {
        debug!("[Inline Comments] giscus frame is cross-origin; no comments read");
        Ok(Vec::new())
    }
}
