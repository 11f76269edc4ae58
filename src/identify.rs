//! Identifier assignment for citable and commentable elements.
//!
//! One parameterized pass covers every scheme the page uses: numbered
//! paragraph ids (`p1`, `p2`, ...), section ids that reuse an author-supplied
//! heading id, and the parallel `data-para-id` scheme of the comment overlay.

use indexmap::IndexMap;
use tracing::info;

use crate::config::MIN_PARAGRAPH_LENGTH;
use crate::dom::{Document, NodeId, Selector};

const CODE_SELECTOR: &str = "pre, code";

// ============================================================================
// Schemes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdStrategy {
    /// `<prefix><N>` for the N-th accepted element.
    Numbered { prefix: String },
    /// Keep a non-empty existing `id`; otherwise `<prefix><N>`.
    ReuseExisting { prefix: String },
}

#[derive(Debug, Clone)]
pub struct IdScheme {
    pub name: &'static str,
    pub selector: Selector,
    pub strategy: IdStrategy,
    /// Candidates whose trimmed text is shorter than this are skipped.
    pub min_length: Option<usize>,
    /// Attribute that receives the identifier.
    pub attribute: &'static str,
    pub marker_class: &'static str,
    pub skip_code: bool,
}

impl IdScheme {
    /// Paragraph citation scheme: `id="pN"` on paragraphs and blockquotes.
    pub fn paragraphs() -> Self {
        Self {
            name: "paragraph links",
            selector: Selector::new("p, blockquote"),
            strategy: IdStrategy::Numbered {
                prefix: "p".to_string(),
            },
            min_length: Some(MIN_PARAGRAPH_LENGTH),
            attribute: "id",
            marker_class: "citable-paragraph",
            skip_code: true,
        }
    }

    /// Heading citation scheme: existing heading ids are kept verbatim.
    pub fn sections() -> Self {
        Self {
            name: "section links",
            selector: Selector::new("h2, h3, h4"),
            strategy: IdStrategy::ReuseExisting {
                prefix: "section-".to_string(),
            },
            min_length: None,
            attribute: "id",
            marker_class: "citable-section",
            skip_code: true,
        }
    }

    /// Inline comment scheme: `data-para-id="pN"`, list items included.
    pub fn commentable() -> Self {
        Self {
            name: "inline comments",
            selector: Selector::new("p, blockquote, li"),
            strategy: IdStrategy::Numbered {
                prefix: "p".to_string(),
            },
            min_length: Some(MIN_PARAGRAPH_LENGTH),
            attribute: "data-para-id",
            marker_class: "commentable-paragraph",
            skip_code: true,
        }
    }

    /// Override the length filter. Has no effect on schemes without one.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        if self.min_length.is_some() {
            self.min_length = Some(min_length);
        }
        self
    }
}

// ============================================================================
// Registry
// ============================================================================

/// An element that received an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked {
    pub id: String,
    pub node: NodeId,
    /// Trimmed text at assignment time, before any control was injected.
    pub text: String,
}

impl Tracked {
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Identifier to element map in discovery order. Built once per page load.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: IndexMap<String, Tracked>,
}

impl Registry {
    pub fn get(&self, id: &str) -> Option<&Tracked> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tracked> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Identifier assigned to `node`, if any.
    pub fn id_of(&self, node: NodeId) -> Option<&str> {
        self.entries
            .values()
            .find(|t| t.node == node)
            .map(|t| t.id.as_str())
    }

    fn insert(&mut self, tracked: Tracked) {
        self.entries.insert(tracked.id.clone(), tracked);
    }
}

// ============================================================================
// Assignment
// ============================================================================

/// Assign identifiers to the qualifying elements under the first element
/// matching `container`. A missing container yields an empty registry.
pub fn assign_ids(doc: &mut Document, container: &Selector, scheme: &IdScheme) -> Registry {
    let mut registry = Registry::default();
    let Some(root) = doc.query(doc.root(), container) else {
        return registry;
    };

    let code = Selector::new(CODE_SELECTOR);
    let candidates = doc.select(root, &scheme.selector);
    let mut index = 1;

    for node in candidates {
        if scheme.skip_code && doc.closest(node, &code).is_some() {
            continue;
        }

        let text = doc.text_content(node).trim().to_string();
        if let Some(min) = scheme.min_length {
            if text.chars().count() < min {
                continue;
            }
        }

        let id = match &scheme.strategy {
            IdStrategy::Numbered { prefix } => format!("{}{}", prefix, index),
            IdStrategy::ReuseExisting { prefix } => match doc.attr(node, "id") {
                Some(existing) if !existing.trim().is_empty() && !registry.contains(existing) => {
                    existing.to_string()
                }
                _ => format!("{}{}", prefix, index),
            },
        };
        if registry.contains(&id) {
            continue;
        }

        doc.set_attr(node, scheme.attribute, &id);
        doc.add_class(node, scheme.marker_class);
        registry.insert(Tracked { id, node, text });
        index += 1;
    }

    info!("[{}] assigned ids to {} elements", scheme.name, registry.len());
    registry
}
