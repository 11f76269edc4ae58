//! Browser capabilities the page behaviors depend on.
//!
//! Everything the document model cannot answer by itself (clipboard,
//! blocking prompt, scrolling, layout geometry, focus) goes through
//! [`Host`]. [`RecordingHost`] is a headless implementation that records
//! every call and answers geometry from fixed values.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::models::{Rect, Viewport};
use crate::page::lock;

#[async_trait]
pub trait Host: Send + Sync {
    async fn write_clipboard(&self, text: &str) -> Result<()>;

    /// Blocking prompt showing `value` for manual copying.
    fn prompt(&self, message: &str, value: &str);

    /// Smooth-scroll `node` to the vertical center of the viewport.
    fn scroll_into_view(&self, node: NodeId);

    fn viewport(&self) -> Viewport;

    fn bounding_rect(&self, node: NodeId) -> Rect;

    fn offset_height(&self, node: NodeId) -> f64;

    fn focus(&self, node: NodeId);
}

// ============================================================================
// Recording Host
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Clipboard(String),
    Prompt { message: String, value: String },
    Scroll(NodeId),
    Focus(NodeId),
}

#[derive(Debug, Default)]
struct Recorded {
    calls: Vec<HostCall>,
    viewport: Viewport,
    rects: HashMap<NodeId, Rect>,
    heights: HashMap<NodeId, f64>,
    clipboard_denied: bool,
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    inner: Mutex<Recorded>,
}

impl RecordingHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            inner: Mutex::new(Recorded {
                viewport,
                ..Recorded::default()
            }),
        }
    }

    /// Make every clipboard write fail, as when permission is denied.
    pub fn deny_clipboard(&self) {
        lock(&self.inner).clipboard_denied = true;
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        lock(&self.inner).viewport = viewport;
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        lock(&self.inner).rects.insert(node, rect);
    }

    pub fn set_offset_height(&self, node: NodeId, height: f64) {
        lock(&self.inner).heights.insert(node, height);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.inner).calls.clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        lock(&self.inner).calls.iter().rev().find_map(|c| match c {
            HostCall::Clipboard(text) => Some(text.clone()),
            _ => None,
        })
    }

    pub fn scrolled_to(&self) -> Vec<NodeId> {
        lock(&self.inner)
            .calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Scroll(node) => Some(*node),
                _ => None,
            })
            .collect()
    }

    pub fn focused(&self) -> Option<NodeId> {
        lock(&self.inner).calls.iter().rev().find_map(|c| match c {
            HostCall::Focus(node) => Some(*node),
            _ => None,
        })
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn write_clipboard(&self, text: &str) -> Result<()> {
        let mut inner = lock(&self.inner);
        if inner.clipboard_denied {
            return Err(Error::Clipboard("write permission denied".to_string()));
        }
        inner.calls.push(HostCall::Clipboard(text.to_string()));
        Ok(())
    }

    fn prompt(&self, message: &str, value: &str) {
        lock(&self.inner).calls.push(HostCall::Prompt {
            message: message.to_string(),
            value: value.to_string(),
        });
    }

    fn scroll_into_view(&self, node: NodeId) {
        lock(&self.inner).calls.push(HostCall::Scroll(node));
    }

    fn viewport(&self) -> Viewport {
        lock(&self.inner).viewport
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        lock(&self.inner).rects.get(&node).copied().unwrap_or_default()
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        lock(&self.inner).heights.get(&node).copied().unwrap_or(0.0)
    }

    fn focus(&self, node: NodeId) {
        lock(&self.inner).calls.push(HostCall::Focus(node));
    }
}
