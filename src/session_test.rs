use super::*;
use crate::citation::COPIED_CLASS;
use crate::error::Result;
use crate::host::{HostCall, RecordingHost};
use crate::metadata;
use crate::models::{Location, RemoteComment, Viewport};
use crate::overlay::{DialogPhase, FLASH_CLASS, OPEN_CLASS};
use crate::widget::{GiscusFrame, WidgetStatus};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

const FIRST: &str = "The opening paragraph sets the scene and is long enough to cite.";
const SECOND: &str = "A second paragraph continues the argument with more supporting detail.";
const THIRD: &str = "The closing paragraph wraps up the discussion for the curious reader.";

#[derive(Default)]
struct StubWidget {
    posted: Mutex<Vec<String>>,
}

#[async_trait]
impl DiscussionWidget for StubWidget {
    async fn post(&self, body: &str) -> Result<()> {
        lock(&self.posted).push(body.to_string());
        Ok(())
    }

    async fn fetch_comments(&self) -> Result<Vec<RemoteComment>> {
        Ok(Vec::new())
    }
}

fn document(with_widget: bool) -> Document {
    let mut doc = Document::new();
    let body = doc.body();
    let article = doc.append_element(body, "article", &[]);
    let content = doc.append_element(article, "div", &[("class", "post-content")]);
    let markdown = format!(
        "## Introduction {{#intro}}\n\n{FIRST}\n\n{SECOND}\n\nSee [the second paragraph](#p2) for the argument, or [elsewhere](#nowhere) for nothing.\n\n## Details\n\n{THIRD}\n\n```rust\nfn main() {{ println!(\"a code block that is long enough to count\"); }}\n```\n"
    );
    doc.append_markdown(content, &markdown);
    if with_widget {
        doc.append_element(body, "script", &[("src", "https://giscus.app/client.js")]);
        doc.append_element(body, "iframe", &[("class", "giscus-frame")]);
    }
    doc
}

fn load_with(
    href: &str,
    doc: Document,
    widget: Arc<dyn DiscussionWidget>,
    options: SessionOptions,
) -> (Arc<Session>, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::new(Viewport::new(1280.0, 800.0)));
    let page = Page::new(doc, Location::parse(href).unwrap(), host.clone());
    (Session::load(&page, widget, options), host)
}

fn load(href: &str) -> (Arc<Session>, Arc<RecordingHost>) {
    load_with(href, document(false), Arc::new(GiscusFrame), SessionOptions::default())
}

fn icon_for(session: &Session, para_id: &str) -> NodeId {
    let overlay = session.overlay().unwrap();
    let node = overlay.registry().get(para_id).unwrap().node;
    let doc = session.page().document();
    doc.query(node, &Selector::new(".para-comment-icon")).unwrap()
}

fn click(target: NodeId) -> PageEvent {
    PageEvent::Click { target }
}

// ============================================================================
// Setup
// ============================================================================

#[tokio::test]
async fn test_load_runs_every_scheme() {
    let (session, _host) = load("https://example.com/posts/hello/");
    let doc = session.page().document();

    let paragraphs = session.paragraphs().unwrap();
    assert_eq!(paragraphs.links.registry().ids().collect::<Vec<_>>(), ["p1", "p2", "p3", "p4"]);
    let p1 = paragraphs.links.registry().get("p1").unwrap().node;
    assert_eq!(doc.attr(p1, "id"), Some("p1"));
    assert!(doc.has_class(p1, "citable-paragraph"));
    assert_eq!(doc.attr(p1, "data-para-id"), Some("p1"));

    let sections = session.sections().unwrap();
    assert_eq!(sections.links.registry().ids().collect::<Vec<_>>(), ["intro", "section-2"]);

    let overlay = session.overlay().unwrap();
    assert_eq!(overlay.registry().len(), 4);
    assert_eq!(doc.select(doc.root(), &Selector::new(".para-link-icon")).len(), 6);
    assert_eq!(doc.select(doc.root(), &Selector::new(".para-comment-icon")).len(), 4);
}

#[tokio::test]
async fn test_schemes_measure_text_before_controls() {
    let (session, _host) = load("https://example.com/posts/hello/");
    let p1 = session.overlay().unwrap().registry().get("p1").unwrap();
    assert_eq!(p1.text, FIRST);
}

#[tokio::test]
async fn test_options_disable_behaviors() {
    let options = SessionOptions {
        section_links: false,
        inline_comments: false,
        ..SessionOptions::default()
    };
    let (session, _host) = load_with(
        "https://example.com/posts/hello/",
        document(false),
        Arc::new(GiscusFrame),
        options,
    );
    assert!(session.paragraphs().is_some());
    assert!(session.sections().is_none());
    assert!(session.overlay().is_none());
    let doc = session.page().document();
    assert!(doc.select(doc.root(), &Selector::new(".para-comment-icon")).is_empty());
}

#[tokio::test]
async fn test_page_without_content_is_inert() {
    let mut doc = Document::new();
    let body = doc.body();
    doc.append_element(body, "p", &[]);
    let (session, host) = load_with(
        "https://example.com/about/#p1",
        doc,
        Arc::new(GiscusFrame),
        SessionOptions::default(),
    );

    assert!(session.paragraphs().is_none());
    assert!(session.overlay().is_none());
    assert!(!session.dispatch(click(body)).await);
    assert!(host.calls().is_empty());
}

#[test]
fn test_key_parsing() {
    assert_eq!("Enter".parse::<Key>().unwrap(), Key::Enter);
    assert_eq!(" ".parse::<Key>().unwrap(), Key::Space);
    assert_eq!("Escape".parse::<Key>().unwrap(), Key::Escape);
    assert_eq!("a".parse::<Key>().unwrap(), Key::Other("a".to_string()));
}

// ============================================================================
// Deep Links
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_initial_paragraph_link_flashes_and_opens_dialog() {
    let (session, host) = load("https://example.com/posts/hello/#p2");
    let overlay = session.overlay().unwrap();
    let node = overlay.registry().get("p2").unwrap().node;

    assert_eq!(host.scrolled_to(), vec![node]);
    assert!(session.page().document().has_class(node, FLASH_CLASS));

    sleep(Duration::from_millis(520)).await;
    let active = overlay.active().unwrap();
    assert_eq!(active.para_id, "p2");
    assert_eq!(active.phase, DialogPhase::Open);
}

#[tokio::test(start_paused = true)]
async fn test_copied_paragraph_link_lands_on_cited_element_after_list_item() {
    let mut doc = Document::new();
    let body = doc.body();
    let content = doc.append_element(body, "div", &[("class", "post-content")]);
    doc.append_markdown(content, &format!("- {FIRST}\n\n{SECOND}\n\n{THIRD}\n"));
    let (session, host) = load_with(
        "https://example.com/posts/hello/#p1",
        doc,
        Arc::new(GiscusFrame),
        SessionOptions::default(),
    );

    let cited = session.paragraphs().unwrap().links.registry().get("p1").unwrap().node;
    let overlay = session.overlay().unwrap();
    let comment_id = overlay.registry().id_of(cited).unwrap().to_string();
    {
        let doc = session.page().document();
        assert_eq!(doc.tag(cited), Some("p"));
        assert!(doc.text_content(cited).contains(SECOND));
    }
    assert_ne!(comment_id, "p1");

    assert_eq!(host.scrolled_to(), vec![cited]);
    assert!(session.page().document().has_class(cited, FLASH_CLASS));

    sleep(Duration::from_millis(520)).await;
    let active = overlay.active().unwrap();
    assert_eq!(active.para_id, comment_id);
    assert_eq!(overlay.registry().get(&active.para_id).unwrap().node, cited);
}

#[tokio::test(start_paused = true)]
async fn test_initial_paragraph_link_without_overlay() {
    let options = SessionOptions {
        inline_comments: false,
        ..SessionOptions::default()
    };
    let (session, host) = load_with(
        "https://example.com/posts/hello/#p3",
        document(false),
        Arc::new(GiscusFrame),
        options,
    );
    let node = session.paragraphs().unwrap().links.registry().get("p3").unwrap().node;
    assert_eq!(host.scrolled_to(), vec![node]);
    assert!(session.page().document().has_class(node, HIGHLIGHT_CLASS));

    sleep(Duration::from_millis(2001)).await;
    assert!(!session.page().document().has_class(node, HIGHLIGHT_CLASS));
}

#[tokio::test(start_paused = true)]
async fn test_section_fragment_reuses_heading_id() {
    let (session, host) = load("https://example.com/posts/hello/#intro");
    let node = session.sections().unwrap().links.registry().get("intro").unwrap().node;
    assert_eq!(host.scrolled_to(), vec![node]);
    assert!(session.page().document().has_class(node, HIGHLIGHT_CLASS));
    assert_eq!(session.overlay().unwrap().active(), None);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_fragment_does_nothing() {
    let (session, host) = load("https://example.com/posts/hello/#p99");
    sleep(Duration::from_millis(600)).await;
    assert!(host.scrolled_to().is_empty());
    assert_eq!(session.overlay().unwrap().active(), None);
}

#[tokio::test(start_paused = true)]
async fn test_hash_change_routes_to_section() {
    let (session, host) = load("https://example.com/posts/hello/");
    let prevented = session
        .dispatch(PageEvent::HashChange {
            hash: "#section-2".to_string(),
        })
        .await;
    assert!(!prevented);
    let node = session.sections().unwrap().links.registry().get("section-2").unwrap().node;
    assert_eq!(host.scrolled_to(), vec![node]);
}

#[tokio::test(start_paused = true)]
async fn test_in_page_anchor_click_is_handled() {
    let (session, host) = load("https://example.com/posts/hello/");
    let (known, unknown) = {
        let doc = session.page().document();
        (
            doc.query(doc.root(), &Selector::new("a[href=\"#p2\"]")).unwrap(),
            doc.query(doc.root(), &Selector::new("a[href=\"#nowhere\"]")).unwrap(),
        )
    };

    assert!(session.dispatch(click(known)).await);
    assert_eq!(host.scrolled_to().len(), 1);

    assert!(!session.dispatch(click(unknown)).await);
    assert_eq!(host.scrolled_to().len(), 1);
}

// ============================================================================
// Citation Links
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_clicking_paragraph_control_copies_link() {
    let (session, host) = load("https://example.com/posts/hello/#ignored");
    let button = session.paragraphs().unwrap().links.control_for("p3").unwrap();

    assert!(session.dispatch(click(button)).await);
    assert_eq!(host.clipboard().as_deref(), Some("https://example.com/posts/hello/#p3"));
    assert!(session.page().document().has_class(button, COPIED_CLASS));

    sleep(Duration::from_millis(2001)).await;
    assert!(!session.page().document().has_class(button, COPIED_CLASS));
}

#[tokio::test]
async fn test_clicking_section_control_copies_section_link() {
    let (session, host) = load("https://example.com/posts/hello/");
    let button = session.sections().unwrap().links.control_for("intro").unwrap();

    assert!(session.dispatch(click(button)).await);
    assert_eq!(host.clipboard().as_deref(), Some("https://example.com/posts/hello/#intro"));
}

#[tokio::test]
async fn test_denied_clipboard_prompts() {
    let (session, host) = load("https://example.com/posts/hello/");
    host.deny_clipboard();
    let button = session.paragraphs().unwrap().links.control_for("p1").unwrap();

    session.dispatch(click(button)).await;
    assert!(host
        .calls()
        .iter()
        .any(|c| matches!(c, HostCall::Prompt { value, .. } if value == "https://example.com/posts/hello/#p1")));
}

// ============================================================================
// Comment Dialog
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_icon_click_opens_and_outside_click_closes() {
    let (session, _host) = load("https://example.com/posts/hello/");
    let overlay = session.overlay().unwrap();

    assert!(session.dispatch(click(icon_for(&session, "p1"))).await);
    sleep(Duration::from_millis(20)).await;
    let popover = overlay.active().unwrap().node;

    let textarea = {
        let doc = session.page().document();
        doc.query(popover, &Selector::new("textarea")).unwrap()
    };
    assert!(!session.dispatch(click(textarea)).await);
    assert!(overlay.active().is_some());

    let body = session.page().document().body();
    session.dispatch(click(body)).await;
    assert_eq!(overlay.active(), None);
    assert!(!session.page().document().has_class(popover, OPEN_CLASS));
}

#[tokio::test(start_paused = true)]
async fn test_only_one_dialog_is_ever_open() {
    let (session, _host) = load("https://example.com/posts/hello/");
    for id in ["p1", "p2", "p3", "p2"] {
        session.dispatch(click(icon_for(&session, id))).await;
        sleep(Duration::from_millis(5)).await;
    }
    sleep(Duration::from_millis(20)).await;

    let doc = session.page().document();
    let open = doc.select(doc.root(), &Selector::new(".inline-comment-popover.open"));
    assert_eq!(open.len(), 1);
    assert_eq!(doc.attr(open[0], "id"), Some("popover-p2"));
}

#[tokio::test(start_paused = true)]
async fn test_close_controls_and_escape() {
    let (session, _host) = load("https://example.com/posts/hello/");
    let overlay = session.overlay().unwrap();

    session.dispatch(click(icon_for(&session, "p1"))).await;
    let cancel = {
        let doc = session.page().document();
        doc.query(overlay.active().unwrap().node, &Selector::new(".btn-cancel")).unwrap()
    };
    session.dispatch(click(cancel)).await;
    assert_eq!(overlay.active(), None);

    session.dispatch(click(icon_for(&session, "p2"))).await;
    let close = {
        let doc = session.page().document();
        doc.query(overlay.active().unwrap().node, &Selector::new(".popover-close")).unwrap()
    };
    session.dispatch(click(close)).await;
    assert_eq!(overlay.active(), None);

    session.dispatch(click(icon_for(&session, "p3"))).await;
    let body = session.page().document().body();
    let prevented = session
        .dispatch(PageEvent::KeyDown {
            target: body,
            key: Key::Escape,
        })
        .await;
    assert!(!prevented);
    assert_eq!(overlay.active(), None);
}

#[tokio::test(start_paused = true)]
async fn test_keyboard_activation_of_icon() {
    let (session, _host) = load("https://example.com/posts/hello/");
    let icon = icon_for(&session, "p4");

    let ignored = session
        .dispatch(PageEvent::KeyDown {
            target: icon,
            key: Key::Other("a".to_string()),
        })
        .await;
    assert!(!ignored);
    assert_eq!(session.overlay().unwrap().active(), None);

    for key in [Key::Enter, Key::Space] {
        let prevented = session.dispatch(PageEvent::KeyDown { target: icon, key }).await;
        assert!(prevented);
        assert_eq!(session.overlay().unwrap().active().unwrap().para_id, "p4");
    }
}

#[tokio::test(start_paused = true)]
async fn test_form_submit_posts_through_widget() {
    let widget = Arc::new(StubWidget::default());
    let (session, _host) = load_with(
        "https://example.com/posts/hello/",
        document(true),
        widget.clone(),
        SessionOptions::default(),
    );
    sleep(Duration::from_millis(150)).await;
    let overlay = session.overlay().unwrap();
    assert!(overlay.widget_status().is_ready());

    session.dispatch(click(icon_for(&session, "p1"))).await;
    sleep(Duration::from_millis(20)).await;
    let (form, input) = {
        let doc = session.page().document();
        let popover = overlay.active().unwrap().node;
        (
            doc.query(popover, &Selector::new("form.comment-form")).unwrap(),
            doc.query(popover, &Selector::new("textarea")).unwrap(),
        )
    };

    session.page().document().set_value(input, "   ");
    assert!(session.dispatch(PageEvent::Submit { form }).await);
    assert!(lock(&widget.posted).is_empty());

    session.page().document().set_value(input, "Thoughtful reply");
    assert!(session.dispatch(PageEvent::Submit { form }).await);
    let posted = lock(&widget.posted).clone();
    assert_eq!(posted.len(), 1);
    let decoded = metadata::decode(&posted[0]).unwrap().unwrap();
    assert_eq!(decoded.metadata.paragraph_id, "p1");
    assert_eq!(decoded.body, "Thoughtful reply");

    sleep(Duration::from_millis(1501)).await;
    assert_eq!(overlay.active(), None);
}

#[tokio::test(start_paused = true)]
async fn test_missing_widget_frame_degrades_after_ten_seconds() {
    let mut doc = document(false);
    let body = doc.body();
    doc.append_element(body, "script", &[("src", "https://giscus.app/client.js")]);
    let (session, host) = load_with(
        "https://example.com/posts/hello/",
        doc,
        Arc::new(GiscusFrame),
        SessionOptions::default(),
    );
    let overlay = session.overlay().unwrap();

    sleep(Duration::from_millis(9_900)).await;
    assert_eq!(overlay.widget_status(), WidgetStatus::Pending);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(overlay.widget_status(), WidgetStatus::TimedOut);

    // Everything else keeps working.
    let button = session.paragraphs().unwrap().links.control_for("p1").unwrap();
    assert!(session.dispatch(click(button)).await);
    assert!(host.clipboard().is_some());
    assert!(session.dispatch(click(icon_for(&session, "p1"))).await);
    assert!(overlay.active().is_some());
}
