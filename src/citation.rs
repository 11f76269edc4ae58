//! Citation link controls.
//!
//! Every identified paragraph or section gets a small button that copies a
//! deep link (`origin + pathname + "#" + id`) to the clipboard. A successful
//! copy swaps the icon for a check mark and shows a tooltip for two seconds;
//! a rejected write falls back to a prompt holding the link.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::config::COPY_FEEDBACK_DURATION;
use crate::dom::{Document, NodeId};
use crate::identify::Registry;
use crate::models::Location;
use crate::page::Page;

pub const LINK_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 16 16" fill="currentColor" aria-hidden="true"><path d="M7.775 3.275a.75.75 0 001.06 1.06l1.25-1.25a2 2 0 112.83 2.83l-2.5 2.5a2 2 0 01-2.83 0 .75.75 0 00-1.06 1.06 3.5 3.5 0 004.95 0l2.5-2.5a3.5 3.5 0 00-4.95-4.95l-1.25 1.25zm-4.69 9.64a2 2 0 010-2.83l2.5-2.5a2 2 0 012.83 0 .75.75 0 001.06-1.06 3.5 3.5 0 00-4.95 0l-2.5 2.5a3.5 3.5 0 004.95 4.95l1.25-1.25a.75.75 0 00-1.06-1.06l-1.25 1.25a2 2 0 01-2.83 0z"/></svg>"#;

pub const CHECK_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 16 16" fill="currentColor" aria-hidden="true"><path d="M13.78 4.22a.75.75 0 010 1.06l-7.25 7.25a.75.75 0 01-1.06 0L2.22 9.28a.75.75 0 011.06-1.06L6 10.94l6.72-6.72a.75.75 0 011.06 0z"/></svg>"#;

pub const CONTROL_CLASS: &str = "para-link-icon";
pub const COPIED_CLASS: &str = "copied";
pub const TOOLTIP_TEXT: &str = "Link copied!";
pub const PROMPT_MESSAGE: &str = "Copy this link:";

/// Deep link for `id` on the page at `location`.
pub fn link_for(location: &Location, id: &str) -> String {
    format!("{}{}#{}", location.origin, location.pathname, id)
}

/// Append a copy-link button to every tracked element. Returns the button
/// for each identifier.
pub fn inject_link_controls(doc: &mut Document, registry: &Registry) -> HashMap<String, NodeId> {
    let mut controls = HashMap::new();
    for tracked in registry.iter() {
        let label = if doc.tag(tracked.node).is_some_and(|t| t.starts_with('h')) {
            "Copy link to this section"
        } else {
            "Copy link to this paragraph"
        };
        let button = doc.append_element(
            tracked.node,
            "button",
            &[
                ("class", CONTROL_CLASS),
                ("type", "button"),
                ("aria-label", label),
                ("data-para-id", tracked.id.as_str()),
            ],
        );
        doc.append_raw(button, LINK_ICON);
        controls.insert(tracked.id.clone(), button);
    }
    controls
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Written to the clipboard; feedback is showing.
    Copied,
    /// Clipboard rejected the write; the link was shown in a prompt.
    Prompted,
}

/// Copy-link controls for one identifier scheme on one page.
pub struct CitationLinks {
    page: Arc<Page>,
    registry: Registry,
    controls: HashMap<String, NodeId>,
}

impl CitationLinks {
    /// Inject the controls for `registry` into the page.
    pub fn install(page: &Arc<Page>, registry: Registry) -> Self {
        let controls = inject_link_controls(&mut page.document(), &registry);
        Self {
            page: Arc::clone(page),
            registry,
            controls,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn control_for(&self, id: &str) -> Option<NodeId> {
        self.controls.get(id).copied()
    }

    pub fn link_for(&self, id: &str) -> String {
        link_for(self.page.location(), id)
    }

    /// Copy the deep link for `id`. `None` when the id is not tracked.
    pub async fn copy_link(&self, id: &str) -> Option<CopyOutcome> {
        let control = self.control_for(id)?;
        let url = self.link_for(id);

        match self.page.host().write_clipboard(&url).await {
            Ok(()) => {
                self.show_copy_success(control);
                Some(CopyOutcome::Copied)
            }
            Err(e) => {
                error!("[Paragraph Links] failed to copy {}: {}", url, e);
                self.page.host().prompt(PROMPT_MESSAGE, &url);
                Some(CopyOutcome::Prompted)
            }
        }
    }

    fn show_copy_success(&self, control: NodeId) {
        {
            let mut doc = self.page.document();
            let check = doc.create_raw(CHECK_ICON);
            let tooltip = doc.create_element("span");
            doc.set_attr(tooltip, "class", "copy-tooltip");
            doc.set_text(tooltip, TOOLTIP_TEXT);
            doc.set_children(control, vec![check, tooltip]);
            doc.add_class(control, COPIED_CLASS);
        }

        self.page.after(COPY_FEEDBACK_DURATION, move |doc| {
            let icon = doc.create_raw(LINK_ICON);
            doc.set_children(control, vec![icon]);
            doc.remove_class(control, COPIED_CLASS);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONTENT_SELECTOR;
    use crate::dom::Selector;
    use crate::host::{HostCall, RecordingHost};
    use crate::identify::{assign_ids, IdScheme};
    use crate::models::Viewport;
    use std::time::Duration;

    const LONG: &str = "A paragraph long enough to be cited by readers of this blog post.";

    fn setup() -> (Arc<Page>, Arc<RecordingHost>, CitationLinks) {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.append_element(body, "div", &[("class", "post-content")]);
        doc.append_markdown(container, &format!("{LONG}\n\n{LONG}\n\n{LONG}\n"));
        let registry = assign_ids(&mut doc, &Selector::new(CONTENT_SELECTOR), &IdScheme::paragraphs());

        let host = Arc::new(RecordingHost::new(Viewport::new(1280.0, 800.0)));
        let location = Location::parse("https://example.com/post/").unwrap();
        let page = Page::new(doc, location, host.clone());
        let links = CitationLinks::install(&page, registry);
        (page, host, links)
    }

    #[test]
    fn test_link_for_joins_origin_path_and_id() {
        let location = Location::parse("https://example.com/post/#p1").unwrap();
        assert_eq!(link_for(&location, "p3"), "https://example.com/post/#p3");
    }

    #[tokio::test]
    async fn test_controls_are_injected_per_tracked_element() {
        let (page, _host, links) = setup();
        let doc = page.document();
        assert_eq!(doc.select(doc.body(), &Selector::new(".para-link-icon")).len(), 3);
        let button = links.control_for("p2").unwrap();
        assert_eq!(doc.attr(button, "data-para-id"), Some("p2"));
        assert_eq!(doc.parent(button), Some(links.registry().get("p2").unwrap().node));
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_writes_link_and_reverts_after_two_seconds() {
        let (page, host, links) = setup();
        let button = links.control_for("p3").unwrap();

        assert_eq!(links.copy_link("p3").await, Some(CopyOutcome::Copied));
        assert_eq!(host.clipboard().as_deref(), Some("https://example.com/post/#p3"));
        {
            let doc = page.document();
            assert!(doc.has_class(button, COPIED_CLASS));
            assert!(doc.text_content(button).contains(TOOLTIP_TEXT));
        }

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(page.document().has_class(button, COPIED_CLASS));

        tokio::time::sleep(Duration::from_millis(2)).await;
        let doc = page.document();
        assert!(!doc.has_class(button, COPIED_CLASS));
        assert!(!doc.text_content(button).contains(TOOLTIP_TEXT));
        assert_eq!(doc.inner_html(button), LINK_ICON);
    }

    #[tokio::test]
    async fn test_clipboard_failure_falls_back_to_prompt() {
        let (page, host, links) = setup();
        host.deny_clipboard();

        assert_eq!(links.copy_link("p1").await, Some(CopyOutcome::Prompted));
        assert_eq!(
            host.calls(),
            vec![HostCall::Prompt {
                message: PROMPT_MESSAGE.to_string(),
                value: "https://example.com/post/#p1".to_string(),
            }]
        );
        let button = links.control_for("p1").unwrap();
        assert!(!page.document().has_class(button, COPIED_CLASS));
    }

    #[tokio::test]
    async fn test_unknown_id_is_ignored() {
        let (_page, host, links) = setup();
        assert_eq!(links.copy_link("p99").await, None);
        assert!(host.calls().is_empty());
    }
}
