//! Page session: runs the paragraph links, section links and inline
//! comment overlay on one loaded page and routes page events to them.

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use crate::citation::{CitationLinks, CONTROL_CLASS};
use crate::config::{CONTENT_SELECTOR, MIN_PARAGRAPH_LENGTH};
use crate::dom::{Document, NodeId, Selector};
use crate::identify::{assign_ids, IdScheme, Registry};
use crate::navigate::{anchor_fragment, Navigator, ANY_FRAGMENT, HIGHLIGHT_CLASS, PARAGRAPH_FRAGMENT};
use crate::overlay::{icon_target, CommentOverlay, BACKDROP_CLASS, POPOVER_CLASS};
use crate::page::{lock, Page};
use crate::widget::DiscussionWidget;

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Other(String),
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    /// Parses `KeyboardEvent.key` values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Click { target: NodeId },
    KeyDown { target: NodeId, key: Key },
    Submit { form: NodeId },
    HashChange { hash: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub citation_links: bool,
    pub section_links: bool,
    pub inline_comments: bool,
    pub min_paragraph_length: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            citation_links: true,
            section_links: true,
            inline_comments: true,
            min_paragraph_length: MIN_PARAGRAPH_LENGTH,
        }
    }
}

/// Copy-link controls plus the navigator for the same registry.
pub struct LinkLayer {
    pub links: CitationLinks,
    pub navigator: Navigator,
}

impl LinkLayer {
    fn install(page: &Arc<Page>, registry: Registry, pattern: &regex::Regex) -> Self {
        let navigator = Navigator::new(page, registry.clone(), pattern, HIGHLIGHT_CLASS);
        Self {
            links: CitationLinks::install(page, registry),
            navigator,
        }
    }

    fn owns_control(&self, id: &str, button: NodeId) -> bool {
        self.links.control_for(id) == Some(button)
    }
}

/// What a click landed on.
enum ClickTarget {
    CopyLink { button: NodeId, id: String },
    CommentIcon(String),
    DialogClose,
    Backdrop,
    Other { inside_dialog: bool, fragment: Option<String> },
}

fn classify_click(doc: &Document, target: NodeId) -> ClickTarget {
    if let Some(button) = doc.closest(target, &Selector::new(&format!(".{}", CONTROL_CLASS))) {
        if let Some(id) = doc.attr(button, "data-para-id") {
            return ClickTarget::CopyLink {
                button,
                id: id.to_string(),
            };
        }
    }
    if let Some(id) = icon_target(doc, target) {
        return ClickTarget::CommentIcon(id);
    }
    if doc.closest(target, &Selector::new(".popover-close, .btn-cancel")).is_some() {
        return ClickTarget::DialogClose;
    }
    if doc.closest(target, &Selector::new(&format!(".{}", BACKDROP_CLASS))).is_some() {
        return ClickTarget::Backdrop;
    }
    ClickTarget::Other {
        inside_dialog: doc
            .closest(target, &Selector::new(&format!(".{}", POPOVER_CLASS)))
            .is_some(),
        fragment: anchor_fragment(doc, target),
    }
}

pub struct Session {
    page: Arc<Page>,
    paragraphs: Option<LinkLayer>,
    sections: Option<LinkLayer>,
    overlay: Option<Arc<CommentOverlay>>,
    widget_task: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Set up every enabled behavior on `page`. Pages without post content
    /// get an inert session.
    pub fn load(page: &Arc<Page>, widget: Arc<dyn DiscussionWidget>, options: SessionOptions) -> Arc<Self> {
        let container = Selector::new(CONTENT_SELECTOR);

        // All schemes see the content before any control is injected.
        let registries = {
            let mut doc = page.document();
            if doc.query(doc.root(), &container).is_none() {
                None
            } else {
                let paragraphs = options.citation_links.then(|| {
                    let scheme = IdScheme::paragraphs().with_min_length(options.min_paragraph_length);
                    assign_ids(&mut doc, &container, &scheme)
                });
                let sections = options
                    .section_links
                    .then(|| assign_ids(&mut doc, &container, &IdScheme::sections()));
                let commentable = options.inline_comments.then(|| {
                    let scheme = IdScheme::commentable().with_min_length(options.min_paragraph_length);
                    assign_ids(&mut doc, &container, &scheme)
                });
                Some((paragraphs, sections, commentable))
            }
        };

        let Some((paragraphs, sections, commentable)) = registries else {
            info!("no {} on page; session inactive", CONTENT_SELECTOR);
            return Arc::new(Self {
                page: Arc::clone(page),
                paragraphs: None,
                sections: None,
                overlay: None,
                widget_task: Mutex::new(None),
            });
        };

        let session = Arc::new(Self {
            page: Arc::clone(page),
            paragraphs: paragraphs.map(|r| LinkLayer::install(page, r, &PARAGRAPH_FRAGMENT)),
            sections: sections.map(|r| LinkLayer::install(page, r, &ANY_FRAGMENT)),
            overlay: commentable.map(|r| CommentOverlay::install(page, r, widget)),
            widget_task: Mutex::new(None),
        });

        let hash = page.location().hash.clone();
        if !hash.is_empty() {
            session.route_fragment(&hash);
        }

        if let Some(overlay) = &session.overlay {
            *lock(&session.widget_task) = Some(overlay.start());
        }
        session
    }

    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    pub fn paragraphs(&self) -> Option<&LinkLayer> {
        self.paragraphs.as_ref()
    }

    pub fn sections(&self) -> Option<&LinkLayer> {
        self.sections.as_ref()
    }

    pub fn overlay(&self) -> Option<&Arc<CommentOverlay>> {
        self.overlay.as_ref()
    }

    /// Navigate to `hash`. Tracked sections win, then citation paragraphs,
    /// then the overlay's own numbering.
    ///
    /// A citation fragment always lands on the element whose `id` it names.
    /// When that element is also commentable, the overlay's deep link runs
    /// for it under its `data-para-id`, so the two schemes never disagree
    /// about which element `#pN` means.
    pub fn route_fragment(&self, hash: &str) -> bool {
        if let Some(sections) = &self.sections {
            if sections.navigator.resolves(hash) {
                return sections.navigator.handle_fragment(hash).is_some();
            }
        }
        if let Some(paragraphs) = &self.paragraphs {
            if paragraphs.navigator.resolves(hash) {
                if let Some((overlay, comment_hash)) = self.comment_fragment_for(paragraphs, hash) {
                    return overlay.handle_deep_link(&comment_hash);
                }
                return paragraphs.navigator.handle_fragment(hash).is_some();
            }
        }
        if let Some(overlay) = &self.overlay {
            if overlay.resolves(hash) {
                return overlay.handle_deep_link(hash);
            }
        }
        false
    }

    /// The overlay fragment for the element a citation fragment names.
    fn comment_fragment_for(&self, paragraphs: &LinkLayer, hash: &str) -> Option<(&Arc<CommentOverlay>, String)> {
        let overlay = self.overlay.as_ref()?;
        let node = paragraphs.navigator.registry().get(&hash[1..])?.node;
        let id = overlay.registry().id_of(node)?;
        Some((overlay, format!("#{}", id)))
    }

    /// Handle one page event. Returns whether the default action was
    /// prevented.
    pub async fn dispatch(&self, event: PageEvent) -> bool {
        match event {
            PageEvent::Click { target } => self.on_click(target).await,
            PageEvent::KeyDown { target, key } => self.on_key_down(target, &key),
            PageEvent::Submit { form } => self.on_submit(form).await,
            PageEvent::HashChange { hash } => {
                self.route_fragment(&hash);
                false
            }
        }
    }

    async fn on_click(&self, target: NodeId) -> bool {
        let clicked = classify_click(&self.page.document(), target);

        match clicked {
            ClickTarget::CopyLink { button, id } => {
                let layer = [&self.paragraphs, &self.sections]
                    .into_iter()
                    .flatten()
                    .find(|layer| layer.owns_control(&id, button));
                if let Some(layer) = layer {
                    layer.links.copy_link(&id).await;
                }
                true
            }
            ClickTarget::CommentIcon(id) => {
                if let Some(overlay) = &self.overlay {
                    overlay.open(&id);
                }
                true
            }
            ClickTarget::DialogClose | ClickTarget::Backdrop => {
                self.close_dialog();
                false
            }
            ClickTarget::Other {
                inside_dialog,
                fragment,
            } => {
                if !inside_dialog {
                    self.close_dialog();
                }
                fragment.is_some_and(|hash| self.route_fragment(&hash))
            }
        }
    }

    fn on_key_down(&self, target: NodeId, key: &Key) -> bool {
        let Some(overlay) = &self.overlay else {
            return false;
        };
        match key {
            Key::Enter | Key::Space => {
                let id = icon_target(&self.page.document(), target);
                match id {
                    Some(id) => {
                        overlay.open(&id);
                        true
                    }
                    None => false,
                }
            }
            Key::Escape => {
                overlay.close();
                false
            }
            Key::Other(_) => false,
        }
    }

    async fn on_submit(&self, form: NodeId) -> bool {
        let para_id = {
            let doc = self.page.document();
            doc.closest(form, &Selector::new(".comment-form"))
                .and_then(|f| doc.attr(f, "data-para-id").map(str::to_string))
        };
        match (&self.overlay, para_id) {
            (Some(overlay), Some(para_id)) => {
                overlay.submit(&para_id).await;
                true
            }
            _ => false,
        }
    }

    fn close_dialog(&self) {
        if let Some(overlay) = &self.overlay {
            overlay.close();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.widget_task).take() {
            task.abort();
        }
    }
}
