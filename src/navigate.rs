//! Deep-link navigation.
//!
//! Resolves a URL fragment against an identifier registry, scrolls the
//! element to the middle of the viewport and flashes a highlight class for
//! a fixed two seconds. The flash is timer driven and does not follow the
//! stylesheet's animation length.

use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::config::HIGHLIGHT_DURATION;
use crate::dom::{Document, NodeId, Selector};
use crate::identify::Registry;
use crate::page::Page;

/// `#p<N>` fragments of the paragraph schemes.
pub static PARAGRAPH_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#p\d+$").expect("paragraph fragment pattern"));

/// Any non-empty `#<id>` fragment.
pub static ANY_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[^#\s]+$").expect("fragment pattern"));

pub const HIGHLIGHT_CLASS: &str = "highlight-flash";

const IN_PAGE_ANCHOR: &str = "a[href^=\"#\"]";

pub struct Navigator {
    page: Arc<Page>,
    registry: Registry,
    pattern: Regex,
    highlight_class: String,
}

impl Navigator {
    pub fn new(page: &Arc<Page>, registry: Registry, pattern: &Regex, highlight_class: &str) -> Self {
        Self {
            page: Arc::clone(page),
            registry,
            pattern: pattern.clone(),
            highlight_class: highlight_class.to_string(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether `hash` follows this navigator's convention and names a
    /// tracked element.
    pub fn resolves(&self, hash: &str) -> bool {
        self.pattern.is_match(hash) && self.registry.contains(&hash[1..])
    }

    /// Navigate to `hash` (with the leading `#`). Unknown fragments do
    /// nothing and return `None`.
    pub fn handle_fragment(&self, hash: &str) -> Option<NodeId> {
        if !self.resolves(hash) {
            return None;
        }
        self.scroll_to(&hash[1..])
    }

    /// Handle the fragment the page was loaded with.
    pub fn handle_initial(&self) -> Option<NodeId> {
        let hash = self.page.location().hash.clone();
        if hash.is_empty() {
            return None;
        }
        self.handle_fragment(&hash)
    }

    pub fn scroll_to(&self, id: &str) -> Option<NodeId> {
        let node = self.registry.get(id)?.node;
        debug!("scrolling to #{}", id);

        self.page.host().scroll_into_view(node);
        self.page.document().add_class(node, &self.highlight_class);

        let class = self.highlight_class.clone();
        self.page.after(HIGHLIGHT_DURATION, move |doc| {
            doc.remove_class(node, &class);
        });
        Some(node)
    }
}

/// Fragment of the in-page anchor enclosing `target`, if any.
pub fn anchor_fragment(doc: &Document, target: NodeId) -> Option<String> {
    let anchor = doc.closest(target, &Selector::new(IN_PAGE_ANCHOR))?;
    doc.attr(anchor, "href").map(str::to_string)
}
