//! Inline, per-paragraph comment overlay.
//!
//! Each commentable paragraph gets a comment icon with a count badge.
//! Activating the icon opens a floating dialog anchored next to the
//! paragraph (a bottom sheet with a dimmed backdrop on narrow screens) where
//! the reader can write a comment. Posting and authentication are delegated
//! to the discussion widget; the paragraph a comment belongs to travels in
//! the comment body (see [`crate::metadata`]).
//!
//! Dialog lifecycle per paragraph: `Closed -> Opening -> Open -> Closed`.
//! Only one dialog is ever opening or open. The overlay keeps a single
//! active-dialog slot plus a generation counter, so the delayed "mark open"
//! step of a dialog that was closed or superseded in the meantime is a
//! no-op.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::{
    BACKDROP_EXIT_DELAY, CLOSE_AFTER_POST_DELAY, DEEP_LINK_OPEN_DELAY, DIALOG_OPEN_DELAY,
    ERROR_BANNER_DURATION, MAX_CITATION_LENGTH, MOBILE_BREAKPOINT, POPOVER_SPACING, POPOVER_WIDTH,
    SUCCESS_MESSAGE_DURATION,
};
use crate::dom::{Document, NodeId, Selector};
use crate::error::{Error, Result};
use crate::identify::{Registry, Tracked};
use crate::metadata::{self, CommentMetadata};
use crate::models::{CommentRecord, Rect, RemoteComment, Viewport};
use crate::navigate::{Navigator, PARAGRAPH_FRAGMENT};
use crate::page::{lock, spawn_after, Page};
use crate::widget::{wait_until_ready, DiscussionWidget, WidgetStatus};

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

pub const ICON_CLASS: &str = "para-comment-icon";
pub const POPOVER_CLASS: &str = "inline-comment-popover";
pub const BACKDROP_CLASS: &str = "popover-overlay";
pub const OPEN_CLASS: &str = "open";
pub const HAS_COMMENTS_CLASS: &str = "has-comments";
pub const FLASH_CLASS: &str = "flash-highlight";

pub const HINT_TEXT: &str =
    "Your comment will be posted via GitHub Discussions. Sign in with GitHub to comment.";
pub const EMPTY_TEXT: &str = "Be the first to comment on this paragraph.";
pub const BUSY_LABEL: &str = "Posting...";
pub const SUCCESS_MESSAGE: &str = "Comment posted successfully!";
pub const ERROR_MESSAGE: &str = "Failed to post comment. Please try again.";

const COMMENT_ICON: &str = r#"<svg class="icon-comment" width="16" height="16" viewBox="0 0 16 16" fill="currentColor" aria-hidden="true"><path d="M2.5 2A1.5 1.5 0 0 1 4 .5h8A1.5 1.5 0 0 1 13.5 2v8a1.5 1.5 0 0 1-1.5 1.5H6.5l-3 3v-3H2.5A1.5 1.5 0 0 1 1 10V2.5A1.5 1.5 0 0 1 2.5 2z"/></svg>"#;

const CLOSE_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 16 16" fill="currentColor" aria-hidden="true"><path d="M4.646 4.646a.5.5 0 0 1 .708 0L8 7.293l2.646-2.647a.5.5 0 0 1 .708.708L8.707 8l2.647 2.646a.5.5 0 0 1-.708.708L8 8.707l-2.646 2.647a.5.5 0 0 1-.708-.708L7.293 8 4.646 5.354a.5.5 0 0 1 0-.708z"/></svg>"#;

// ============================================================================
// Markup
// ============================================================================

/// Insert a comment icon as the first child of every tracked element.
pub fn inject_comment_icons(doc: &mut Document, registry: &Registry) -> usize {
    for tracked in registry.iter() {
        let icon = doc.create_element("span");
        doc.set_attr(icon, "class", ICON_CLASS);
        doc.set_attr(icon, "data-target-para", &tracked.id);
        doc.set_attr(icon, "role", "button");
        doc.set_attr(icon, "aria-label", "Comment on this paragraph");
        doc.set_attr(icon, "tabindex", "0");
        doc.append_raw(icon, COMMENT_ICON);
        let count = doc.append_element(
            icon,
            "span",
            &[("class", "comment-count"), ("data-count", "0"), ("aria-live", "polite")],
        );
        let hidden = doc.append_element(count, "span", &[("class", "visually-hidden")]);
        doc.append_text(hidden, "comments");
        doc.prepend_child(tracked.node, icon);
    }
    registry.len()
}

/// Paragraph id of the comment icon enclosing `target`.
pub fn icon_target(doc: &Document, target: NodeId) -> Option<String> {
    let icon = doc.closest(target, &Selector::new(&format!(".{}", ICON_CLASS)))?;
    doc.attr(icon, "data-target-para").map(str::to_string)
}

fn build_popover(doc: &mut Document, para_id: &str) -> NodeId {
    let title_id = format!("popover-title-{}", para_id);
    let input_id = format!("comment-input-{}", para_id);

    let popover = doc.create_element("div");
    doc.set_attr(popover, "id", &format!("popover-{}", para_id));
    doc.set_attr(popover, "class", POPOVER_CLASS);
    doc.set_attr(popover, "data-para-id", para_id);
    doc.set_attr(popover, "role", "dialog");
    doc.set_attr(popover, "aria-modal", "true");
    doc.set_attr(popover, "aria-labelledby", &title_id);

    let header = doc.append_element(popover, "div", &[("class", "popover-header")]);
    let title = doc.append_element(header, "h4", &[("id", title_id.as_str()), ("class", "popover-title")]);
    doc.append_text(title, "Comment on this paragraph");
    let close = doc.append_element(
        header,
        "button",
        &[("class", "popover-close"), ("type", "button"), ("aria-label", "Close comment dialog")],
    );
    doc.append_raw(close, CLOSE_ICON);

    let body = doc.append_element(popover, "div", &[("class", "popover-body")]);
    doc.append_element(
        body,
        "div",
        &[
            ("class", "existing-comments"),
            ("role", "region"),
            ("aria-label", "Existing comments on this paragraph"),
        ],
    );
    let empty = doc.append_element(body, "div", &[("class", "no-comments"), ("style", "display: none;")]);
    let empty_text = doc.append_element(empty, "p", &[("class", "text-muted")]);
    doc.append_text(empty_text, EMPTY_TEXT);

    let wrapper = doc.append_element(body, "div", &[("class", "new-comment-form")]);
    let form = doc.append_element(wrapper, "form", &[("class", "comment-form"), ("data-para-id", para_id)]);
    let group = doc.append_element(form, "div", &[("class", "form-group")]);
    let label = doc.append_element(group, "label", &[("for", input_id.as_str()), ("class", "visually-hidden")]);
    doc.append_text(label, "Your comment on this paragraph");
    doc.append_element(
        group,
        "textarea",
        &[
            ("id", input_id.as_str()),
            ("class", "comment-input"),
            ("placeholder", "Add your comment..."),
            ("rows", "3"),
            ("required", ""),
            ("aria-required", "true"),
        ],
    );
    let hint = doc.append_element(group, "div", &[("class", "form-hint")]);
    doc.append_text(hint, HINT_TEXT);

    let actions = doc.append_element(form, "div", &[("class", "form-actions")]);
    let cancel = doc.append_element(actions, "button", &[("type", "button"), ("class", "btn btn-secondary btn-cancel")]);
    doc.append_text(cancel, "Cancel");
    let submit = doc.append_element(actions, "button", &[("type", "submit"), ("class", "btn btn-primary btn-submit")]);
    doc.append_raw(submit, COMMENT_ICON);
    doc.append_text(submit, "Comment");

    let error_box = doc.append_element(
        body,
        "div",
        &[
            ("class", "comment-error"),
            ("role", "alert"),
            ("aria-live", "assertive"),
            ("style", "display: none;"),
        ],
    );
    doc.append_element(error_box, "p", &[("class", "error-message")]);

    doc.append_element(popover, "div", &[("class", "popover-arrow"), ("aria-hidden", "true")]);
    popover
}

/// The form controls of one dialog.
#[derive(Debug, Clone, Copy)]
struct FormParts {
    input: NodeId,
    submit: NodeId,
    hint: NodeId,
    error_box: NodeId,
    error_message: NodeId,
}

impl FormParts {
    fn find(doc: &Document, popover: NodeId) -> Option<Self> {
        let q = |sel: &str| doc.query(popover, &Selector::new(sel));
        Some(Self {
            input: q(".comment-input")?,
            submit: q(".btn-submit")?,
            hint: q(".form-hint")?,
            error_box: q(".comment-error")?,
            error_message: q(".error-message")?,
        })
    }
}

fn render_comments(doc: &mut Document, popover: NodeId, comments: &[CommentRecord], now: DateTime<Utc>) {
    let Some(container) = doc.query(popover, &Selector::new(".existing-comments")) else {
        return;
    };
    let empty = doc.query(popover, &Selector::new(".no-comments"));
    doc.take_children(container);

    if comments.is_empty() {
        if let Some(empty) = empty {
            doc.set_style(empty, "display", "block");
        }
        return;
    }
    if let Some(empty) = empty {
        doc.set_style(empty, "display", "none");
    }

    for comment in comments {
        let item = doc.append_element(container, "div", &[("class", "inline-comment-item")]);
        let author = doc.append_element(item, "div", &[("class", "comment-author")]);
        doc.append_element(
            author,
            "img",
            &[
                ("src", comment.author.avatar_url.as_deref().unwrap_or("")),
                ("alt", comment.author.name.as_str()),
                ("class", "comment-avatar"),
            ],
        );
        let name = doc.append_element(author, "span", &[("class", "comment-author-name")]);
        doc.append_text(name, &comment.author.name);
        let datetime = comment.created_at.to_rfc3339();
        let time = doc.append_element(author, "time", &[("class", "comment-date"), ("datetime", datetime.as_str())]);
        doc.append_text(time, &format_relative(comment.created_at, now));
        let body = doc.append_element(item, "div", &[("class", "comment-body")]);
        doc.append_text(body, &comment.body);
    }
}

/// Short relative age: `just now`, `5m ago`, `3h ago`, `2d ago`, then the
/// calendar date.
pub fn format_relative(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(created);
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        created.format("%Y-%m-%d").to_string()
    }
}

// ============================================================================
// Placement
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Narrow screens: fixed to the bottom by the stylesheet.
    BottomSheet,
    /// Document coordinates of the dialog's top-left corner.
    Anchored { top: f64, left: f64 },
}

pub fn is_mobile(viewport: Viewport) -> bool {
    viewport.width < MOBILE_BREAKPOINT
}

/// Place the dialog to the right of the paragraph, flipping to the left if
/// it would overflow, and keep it vertically inside the visible area.
pub fn place_popover(viewport: Viewport, paragraph: Rect, popover_height: f64) -> Placement {
    if is_mobile(viewport) {
        return Placement::BottomSheet;
    }

    let mut top = paragraph.top + viewport.scroll_y;
    let mut left = paragraph.right() + POPOVER_SPACING;
    if left + POPOVER_WIDTH > viewport.width {
        left = paragraph.left - POPOVER_WIDTH - POPOVER_SPACING;
    }

    let max_top = viewport.height + viewport.scroll_y - popover_height - POPOVER_SPACING;
    if top > max_top {
        top = max_top;
    }

    Placement::Anchored { top, left }
}

// ============================================================================
// Overlay
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Opening,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDialog {
    pub para_id: String,
    pub node: NodeId,
    pub phase: DialogPhase,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing to post: empty text, an unknown paragraph, or a post already
    /// in flight.
    Ignored,
    Posted,
    Failed,
}

struct OverlayState {
    active: Option<ActiveDialog>,
    generation: u64,
    comments: HashMap<String, Vec<CommentRecord>>,
    widget: WidgetStatus,
}

pub struct CommentOverlay {
    page: Arc<Page>,
    registry: Registry,
    navigator: Navigator,
    widget: Arc<dyn DiscussionWidget>,
    state: Mutex<OverlayState>,
}

impl CommentOverlay {
    /// Inject the comment icons for `registry` and set up the overlay.
    /// Call [`CommentOverlay::start`] to begin waiting for the widget.
    pub fn install(page: &Arc<Page>, registry: Registry, widget: Arc<dyn DiscussionWidget>) -> Arc<Self> {
        inject_comment_icons(&mut page.document(), &registry);
        let navigator = Navigator::new(page, registry.clone(), &PARAGRAPH_FRAGMENT, FLASH_CLASS);
        Arc::new(Self {
            page: Arc::clone(page),
            registry,
            navigator,
            widget,
            state: Mutex::new(OverlayState {
                active: None,
                generation: 0,
                comments: HashMap::new(),
                widget: WidgetStatus::Pending,
            }),
        })
    }

    /// Wait for the widget, then load existing comments. Degrades to no
    /// comments when the widget is absent or never becomes ready.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let overlay = Arc::clone(self);
        tokio::spawn(async move {
            let status = wait_until_ready(&overlay.page).await;
            lock(&overlay.state).widget = status;
            overlay.load_existing_comments().await;
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn widget_status(&self) -> WidgetStatus {
        lock(&self.state).widget
    }

    pub fn active(&self) -> Option<ActiveDialog> {
        lock(&self.state).active.clone()
    }

    pub fn comments_for(&self, para_id: &str) -> Vec<CommentRecord> {
        lock(&self.state)
            .comments
            .get(para_id)
            .cloned()
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------------
    // Dialog
    // ------------------------------------------------------------------------

    /// Open the dialog for `para_id`, closing any other first. Returns
    /// false for untracked paragraphs.
    pub fn open(self: &Arc<Self>, para_id: &str) -> bool {
        self.close();

        let Some(tracked) = self.registry.get(para_id) else {
            return false;
        };

        let popover = {
            let mut doc = self.page.document();
            match doc.find_by_id(&format!("popover-{}", para_id)) {
                Some(existing) => existing,
                None => {
                    let popover = build_popover(&mut doc, para_id);
                    let body = doc.body();
                    doc.append_child(body, popover);
                    popover
                }
            }
        };

        let host = self.page.host();
        let viewport = host.viewport();
        let placement = place_popover(viewport, host.bounding_rect(tracked.node), host.offset_height(popover));
        let comments = self.comments_for(para_id);
        {
            let mut doc = self.page.document();
            if let Placement::Anchored { top, left } = placement {
                doc.set_style(popover, "top", &format!("{}px", top));
                doc.set_style(popover, "left", &format!("{}px", left));
            }
            render_comments(&mut doc, popover, &comments, Utc::now());
        }

        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.active = Some(ActiveDialog {
                para_id: para_id.to_string(),
                node: popover,
                phase: DialogPhase::Opening,
                generation: state.generation,
            });
            state.generation
        };
        debug!("[Inline Comments] opening dialog for {}", para_id);

        let overlay = Arc::clone(self);
        spawn_after(DIALOG_OPEN_DELAY, async move {
            overlay.finish_open(generation);
        });

        if placement == Placement::BottomSheet {
            self.show_backdrop(generation);
        }
        true
    }

    fn finish_open(&self, generation: u64) {
        let node = {
            let mut state = lock(&self.state);
            match state.active.as_mut() {
                Some(dialog) if dialog.generation == generation && dialog.phase == DialogPhase::Opening => {
                    dialog.phase = DialogPhase::Open;
                    dialog.node
                }
                _ => return,
            }
        };

        let input = {
            let mut doc = self.page.document();
            doc.add_class(node, OPEN_CLASS);
            doc.query(node, &Selector::new(".comment-input"))
        };
        if let Some(input) = input {
            self.page.host().focus(input);
        }
    }

    /// Close the active dialog, if any.
    pub fn close(&self) {
        let Some(dialog) = lock(&self.state).active.take() else {
            return;
        };
        debug!("[Inline Comments] closing dialog for {}", dialog.para_id);
        self.page.document().remove_class(dialog.node, OPEN_CLASS);
        self.hide_backdrop();
    }

    fn is_current(&self, generation: u64) -> bool {
        lock(&self.state)
            .active
            .as_ref()
            .is_some_and(|d| d.generation == generation)
    }

    fn show_backdrop(self: &Arc<Self>, generation: u64) {
        let backdrop = {
            let mut doc = self.page.document();
            match doc.query(doc.root(), &Selector::new(&format!(".{}", BACKDROP_CLASS))) {
                Some(existing) => existing,
                None => {
                    let body = doc.body();
                    doc.append_element(body, "div", &[("class", BACKDROP_CLASS)])
                }
            }
        };

        let overlay = Arc::clone(self);
        spawn_after(DIALOG_OPEN_DELAY, async move {
            if overlay.is_current(generation) {
                overlay.page.document().add_class(backdrop, OPEN_CLASS);
            }
        });
    }

    fn hide_backdrop(&self) {
        let Some(backdrop) = self.page.query(&Selector::new(&format!(".{}", BACKDROP_CLASS))) else {
            return;
        };
        self.page.document().remove_class(backdrop, OPEN_CLASS);
        // A dialog reopened during the exit animation keeps the backdrop.
        self.page.after(BACKDROP_EXIT_DELAY, move |doc| {
            if !doc.has_class(backdrop, OPEN_CLASS) {
                doc.detach(backdrop);
            }
        });
    }

    // ------------------------------------------------------------------------
    // Deep Links
    // ------------------------------------------------------------------------

    pub fn resolves(&self, hash: &str) -> bool {
        self.navigator.resolves(hash)
    }

    /// Scroll to and flash the paragraph named by `hash`, then open its
    /// dialog once the scroll has had time to settle.
    pub fn handle_deep_link(self: &Arc<Self>, hash: &str) -> bool {
        if self.navigator.handle_fragment(hash).is_none() {
            return false;
        }
        let para_id = hash[1..].to_string();
        let overlay = Arc::clone(self);
        spawn_after(DEEP_LINK_OPEN_DELAY, async move {
            overlay.open(&para_id);
        });
        true
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    /// Refresh comments from the widget. Skipped until the widget is ready.
    pub async fn load_existing_comments(&self) {
        if !self.widget_status().is_ready() {
            info!("[Inline Comments] giscus not ready, skipping comment load");
            return;
        }

        info!("[Inline Comments] loading existing inline comments");
        match self.widget.fetch_comments().await {
            Ok(remote) => {
                self.ingest_comments(&remote);
            }
            Err(e) => error!("[Inline Comments] failed to load comments: {}", e),
        }
    }

    /// Replace the known inline comments with those found in `remote`.
    /// Comments without metadata are ignored; a comment with unreadable
    /// metadata is skipped on its own. Returns the number kept.
    pub fn ingest_comments(&self, remote: &[RemoteComment]) -> usize {
        let mut grouped: HashMap<String, Vec<CommentRecord>> = HashMap::new();
        let mut kept = 0;

        for comment in remote {
            match metadata::decode(&comment.body) {
                Ok(Some(decoded)) => {
                    grouped
                        .entry(decoded.metadata.paragraph_id.clone())
                        .or_default()
                        .push(CommentRecord {
                            id: comment.id.clone(),
                            author: comment.author.clone(),
                            body: decoded.body,
                            created_at: comment.created_at,
                            metadata: decoded.metadata,
                        });
                    kept += 1;
                }
                Ok(None) => {}
                Err(e) => error!("[Inline Comments] skipping comment {}: {}", comment.id, e),
            }
        }

        let counts: Vec<(String, usize)> = self
            .registry
            .ids()
            .map(|id| (id.to_string(), grouped.get(id).map(Vec::len).unwrap_or(0)))
            .collect();
        lock(&self.state).comments = grouped;

        for (id, count) in counts {
            self.update_comment_count(&id, count);
        }
        kept
    }

    pub fn update_comment_count(&self, para_id: &str, count: usize) {
        let Some(tracked) = self.registry.get(para_id) else {
            return;
        };
        let mut doc = self.page.document();
        if let Some(badge) = doc.query(tracked.node, &Selector::new(".comment-count")) {
            doc.set_attr(badge, "data-count", &count.to_string());
            let text = if count > 0 { count.to_string() } else { String::new() };
            doc.set_text(badge, &text);
        }
        if count > 0 {
            doc.add_class(tracked.node, HAS_COMMENTS_CLASS);
        } else {
            doc.remove_class(tracked.node, HAS_COMMENTS_CLASS);
        }
    }

    // ------------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------------

    /// Submit the dialog form of `para_id`.
    pub async fn submit(self: &Arc<Self>, para_id: &str) -> SubmitOutcome {
        let Some(tracked) = self.registry.get(para_id) else {
            return SubmitOutcome::Ignored;
        };

        let (parts, text) = {
            let doc = self.page.document();
            let parts = doc
                .find_by_id(&format!("popover-{}", para_id))
                .and_then(|popover| FormParts::find(&doc, popover));
            let Some(parts) = parts else {
                return SubmitOutcome::Ignored;
            };
            // A disabled submit control means a post is already in flight.
            if doc.attr(parts.submit, "disabled").is_some() {
                return SubmitOutcome::Ignored;
            }
            let text = doc.value(parts.input).trim().to_string();
            (parts, text)
        };
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let label = {
            let mut doc = self.page.document();
            let label = doc.take_children(parts.submit);
            doc.set_attr(parts.submit, "disabled", "");
            doc.set_text(parts.submit, BUSY_LABEL);
            label
        };

        let outcome = match self.post_comment(tracked, &text).await {
            Ok(()) => {
                self.page.document().set_value(parts.input, "");
                self.show_success(parts.hint);

                let overlay = Arc::clone(self);
                spawn_after(CLOSE_AFTER_POST_DELAY, async move {
                    overlay.close();
                    overlay.load_existing_comments().await;
                });
                SubmitOutcome::Posted
            }
            Err(e) => {
                error!("[Inline Comments] error posting comment: {}", e);
                self.show_error(parts);
                SubmitOutcome::Failed
            }
        };

        let mut doc = self.page.document();
        doc.remove_attr(parts.submit, "disabled");
        doc.set_children(parts.submit, label);
        outcome
    }

    async fn post_comment(&self, tracked: &Tracked, text: &str) -> Result<()> {
        if !self.widget_status().is_ready() {
            return Err(Error::WidgetNotReady);
        }
        let metadata = CommentMetadata::inline(
            &tracked.id,
            &tracked.text,
            &self.page.location().pathname,
            Utc::now(),
            MAX_CITATION_LENGTH,
        );
        let body = metadata::encode(&metadata, text)?;
        self.widget.post(&body).await
    }

    fn show_success(&self, hint: NodeId) {
        {
            let mut doc = self.page.document();
            doc.set_style(hint, "color", "var(--color-success)");
            doc.set_text(hint, SUCCESS_MESSAGE);
        }
        self.page.after(SUCCESS_MESSAGE_DURATION, move |doc| {
            doc.set_style(hint, "color", "");
            doc.set_text(hint, HINT_TEXT);
        });
    }

    fn show_error(&self, parts: FormParts) {
        {
            let mut doc = self.page.document();
            doc.set_text(parts.error_message, ERROR_MESSAGE);
            doc.set_style(parts.error_box, "display", "block");
        }
        self.page.after(ERROR_BANNER_DURATION, move |doc| {
            doc.set_style(parts.error_box, "display", "none");
        });
    }
}
