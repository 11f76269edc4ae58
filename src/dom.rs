//! Arena document model.
//!
//! A deliberately small DOM: elements, text and pre-sanitized raw HTML
//! fragments stored in a flat arena and addressed by [`NodeId`]. It supports
//! what the page behaviors need (attributes, classes, inline styles, form
//! values, simple selectors) plus building from Markdown and serializing
//! back to HTML.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// URL schemes ammonia lets through by default.
static URL_SCHEMES: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ammonia::Builder::default().clone_url_schemes());

/// Handle to a node in a [`Document`]. Non-owning; stays valid for the
/// document's lifetime even after the node is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Element(Element),
    Text(String),
    /// Sanitized HTML emitted verbatim. Contributes nothing to text content.
    Raw(String),
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    /// Form control value (`textarea`, `input`).
    value: String,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

// ============================================================================
// Selectors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Contains(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
    invalid: bool,
}

/// A comma separated list of compound selectors: `tag`, `.class`, `#id`,
/// `[attr]`, `[attr="v"]`, `[attr^="v"]`, `[attr*="v"]` and combinations
/// such as `iframe.giscus-frame`. Combinators are not supported; a selector
/// using them never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn new(source: &str) -> Self {
        let alternatives = source
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_compound)
            .collect();
        Self { alternatives }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(source: &str) -> Compound {
    let mut compound = Compound::default();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && is_ident_char(chars[*i]) {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                let class = read_ident(&mut i);
                if class.is_empty() {
                    compound.invalid = true;
                }
                compound.classes.push(class);
            }
            '#' => {
                i += 1;
                compound.id = Some(read_ident(&mut i));
            }
            '[' => {
                let end = chars[i..].iter().position(|c| *c == ']').map(|p| p + i);
                let Some(end) = end else {
                    compound.invalid = true;
                    break;
                };
                let inner: String = chars[i + 1..end].iter().collect();
                compound.attrs.push(parse_attr(&inner));
                i = end + 1;
            }
            c if is_ident_char(c) && compound.tag.is_none() => {
                compound.tag = Some(read_ident(&mut i).to_ascii_lowercase());
            }
            _ => {
                compound.invalid = true;
                break;
            }
        }
    }

    compound
}

fn parse_attr(inner: &str) -> (String, AttrOp) {
    let unquote = |v: &str| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string();

    if let Some((name, value)) = inner.split_once("^=") {
        (name.trim().to_string(), AttrOp::Prefix(unquote(value)))
    } else if let Some((name, value)) = inner.split_once("*=") {
        (name.trim().to_string(), AttrOp::Contains(unquote(value)))
    } else if let Some((name, value)) = inner.split_once('=') {
        (name.trim().to_string(), AttrOp::Equals(unquote(value)))
    } else {
        (inner.trim().to_string(), AttrOp::Exists)
    }
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty `html > (head, body)` document.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };
        doc.root = doc.create_element("html");
        doc.head = doc.append_element(doc.root, "head", &[]);
        doc.body = doc.append_element(doc.root, "body", &[]);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Raw markup is trusted as-is; callers sanitize untrusted input first.
    pub fn create_raw(&mut self, html: &str) -> NodeId {
        self.push(NodeData::Raw(html.to_string()))
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attr(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.create_text(text);
        self.append_child(parent, node);
        node
    }

    pub fn append_raw(&mut self, parent: NodeId, html: &str) -> NodeId {
        let node = self.create_raw(html);
        self.append_child(parent, node);
        node
    }

    // ------------------------------------------------------------------------
    // Tree Mutation
    // ------------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` before the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    /// Remove a node from its parent. The node and its subtree stay in the
    /// arena and can be re-attached.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    /// Detach and return all children of `node`.
    pub fn take_children(&mut self, node: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    /// Replace the children of `node` with `children`.
    pub fn set_children(&mut self, node: NodeId, children: Vec<NodeId>) {
        self.take_children(node);
        for child in children {
            self.append_child(node, child);
        }
    }

    /// Replace the children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.take_children(node);
        if !text.is_empty() {
            self.append_text(node, text);
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.root {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Descendants of `scope` in document (pre-)order, excluding `scope`.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    // ------------------------------------------------------------------------
    // Attributes, Classes, Styles, Values
    // ------------------------------------------------------------------------

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        match el.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.attrs.retain(|(n, _)| n != name);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) || !self.is_element(node) {
            return;
        }
        let classes = match self.attr(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr(node, "class", &classes);
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(existing) = self.attr(node, "class") else {
            return;
        };
        let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        let remaining = remaining.join(" ");
        if remaining.is_empty() {
            self.remove_attr(node, "class");
        } else {
            self.set_attr(node, "class", &remaining);
        }
    }

    /// Read one property from the inline `style` attribute.
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        parse_style(self.attr(node, "style")?)
            .into_iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v)
    }

    /// Set one inline style property; an empty value removes it.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let mut props = self.attr(node, "style").map(parse_style).unwrap_or_default();
        props.retain(|(p, _)| p != property);
        if !value.is_empty() {
            props.push((property.to_string(), value.to_string()));
        }
        if props.is_empty() {
            self.remove_attr(node, "style");
        } else {
            let style: Vec<String> = props.iter().map(|(p, v)| format!("{}: {};", p, v)).collect();
            self.set_attr(node, "style", &style.join(" "));
        }
    }

    pub fn value(&self, node: NodeId) -> &str {
        self.element(node).map(|el| el.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.value = value.to_string();
        }
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        if let Some(NodeData::Text(t)) = self.nodes.get(node.0).map(|n| &n.data) {
            text.push_str(t);
        }
        for d in self.descendants(node) {
            if let NodeData::Text(t) = &self.nodes[d.0].data {
                text.push_str(t);
            }
        }
        text
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let Some(el) = self.element(node) else {
            return false;
        };
        selector.alternatives.iter().any(|c| self.matches_compound(node, el, c))
    }

    fn matches_compound(&self, node: NodeId, el: &Element, c: &Compound) -> bool {
        if c.invalid {
            return false;
        }
        if let Some(tag) = &c.tag {
            if *tag != el.tag {
                return false;
            }
        }
        if let Some(id) = &c.id {
            if self.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !c.classes.iter().all(|class| self.has_class(node, class)) {
            return false;
        }
        c.attrs.iter().all(|(name, op)| match (self.attr(node, name), op) {
            (None, _) => false,
            (Some(_), AttrOp::Exists) => true,
            (Some(v), AttrOp::Equals(want)) => v == want,
            (Some(v), AttrOp::Prefix(want)) => v.starts_with(want.as_str()),
            (Some(v), AttrOp::Contains(want)) => v.contains(want.as_str()),
        })
    }

    /// All matching descendants of `scope` in document order.
    pub fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.matches(*n, selector))
            .collect()
    }

    /// First matching descendant of `scope`.
    pub fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| self.matches(*n, selector))
    }

    /// The node itself or its nearest ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.matches(n, selector) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Attached element carrying the given `id` attribute.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    /// Outer HTML of `node`.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => out.push_str(&html_escape(text)),
            NodeData::Raw(html) => out.push_str(html),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, html_escape(value)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                if el.tag == "textarea" {
                    out.push_str(&html_escape(&el.value));
                }
                for child in &self.nodes[node.0].children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", el.tag));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Markdown
    // ------------------------------------------------------------------------

    /// Parse Markdown and append the resulting blocks under `parent`.
    /// Raw HTML is sanitized with ammonia on the way in.
    pub fn append_markdown(&mut self, parent: NodeId, source: &str) {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_TASKLISTS;

        let mut stack = vec![parent];
        let mut html_block: Option<String> = None;
        let mut in_table_head = false;

        for event in Parser::new_ext(source, options) {
            let top = stack.last().copied().unwrap_or(parent);
            match event {
                Event::Start(Tag::HtmlBlock) => html_block = Some(String::new()),
                Event::End(TagEnd::HtmlBlock) => {
                    if let Some(raw) = html_block.take() {
                        self.append_raw(top, &ammonia::clean(&raw));
                    }
                }
                Event::Html(html) => match html_block.as_mut() {
                    Some(buf) => buf.push_str(&html),
                    None => {
                        self.append_raw(top, &ammonia::clean(&html));
                    }
                },
                Event::InlineHtml(html) => {
                    self.append_raw(top, &ammonia::clean(&html));
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let pre = self.append_element(top, "pre", &[]);
                    let code = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                            let class = format!("language-{}", lang);
                            self.append_element(pre, "code", &[("class", class.as_str())])
                        }
                        _ => self.append_element(pre, "code", &[]),
                    };
                    stack.push(pre);
                    stack.push(code);
                }
                Event::Start(Tag::TableHead) => {
                    in_table_head = true;
                    let thead = self.append_element(top, "thead", &[]);
                    let row = self.append_element(thead, "tr", &[]);
                    stack.push(thead);
                    stack.push(row);
                }
                Event::End(TagEnd::CodeBlock) => {
                    stack.pop();
                    stack.pop();
                }
                Event::End(TagEnd::TableHead) => {
                    in_table_head = false;
                    stack.pop();
                    stack.pop();
                }
                Event::Start(tag) => {
                    let node = self.open_markdown_tag(top, tag, in_table_head);
                    stack.push(node);
                }
                Event::End(_) => {
                    if stack.len() > 1 {
                        stack.pop();
                    }
                }
                Event::Text(text) => {
                    if self.tag(top) == Some("img") {
                        let alt = format!("{}{}", self.attr(top, "alt").unwrap_or(""), text);
                        self.set_attr(top, "alt", &alt);
                    } else {
                        self.append_text(top, &text);
                    }
                }
                Event::Code(code) => {
                    let node = self.append_element(top, "code", &[]);
                    self.append_text(node, &code);
                }
                Event::SoftBreak => {
                    self.append_text(top, "\n");
                }
                Event::HardBreak => {
                    self.append_element(top, "br", &[]);
                }
                Event::Rule => {
                    self.append_element(top, "hr", &[]);
                }
                Event::TaskListMarker(checked) => {
                    let input = self.append_element(top, "input", &[("type", "checkbox"), ("disabled", "")]);
                    if checked {
                        self.set_attr(input, "checked", "");
                    }
                }
                _ => {}
            }
        }
    }

    fn open_markdown_tag(&mut self, parent: NodeId, tag: Tag<'_>, in_table_head: bool) -> NodeId {
        match tag {
            Tag::Paragraph => self.append_element(parent, "p", &[]),
            Tag::Heading {
                level, id, classes, ..
            } => {
                let node = self.append_element(parent, heading_tag(level), &[]);
                if let Some(id) = id {
                    self.set_attr(node, "id", &id);
                }
                for class in classes {
                    self.add_class(node, &class);
                }
                node
            }
            Tag::BlockQuote => self.append_element(parent, "blockquote", &[]),
            Tag::List(Some(start)) => {
                let list = self.append_element(parent, "ol", &[]);
                if start != 1 {
                    self.set_attr(list, "start", &start.to_string());
                }
                list
            }
            Tag::List(None) => self.append_element(parent, "ul", &[]),
            Tag::Item => self.append_element(parent, "li", &[]),
            Tag::Emphasis => self.append_element(parent, "em", &[]),
            Tag::Strong => self.append_element(parent, "strong", &[]),
            Tag::Strikethrough => self.append_element(parent, "del", &[]),
            Tag::Link {
                dest_url, title, ..
            } => {
                let link = self.append_element(parent, "a", &[]);
                if is_safe_url(&dest_url) {
                    self.set_attr(link, "href", &dest_url);
                }
                if !title.is_empty() {
                    self.set_attr(link, "title", &title);
                }
                link
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let img = self.append_element(parent, "img", &[]);
                if is_safe_url(&dest_url) {
                    self.set_attr(img, "src", &dest_url);
                }
                self.set_attr(img, "alt", "");
                if !title.is_empty() {
                    self.set_attr(img, "title", &title);
                }
                img
            }
            Tag::Table(_) => self.append_element(parent, "table", &[]),
            Tag::TableRow => self.append_element(parent, "tr", &[]),
            Tag::TableCell if in_table_head => self.append_element(parent, "th", &[]),
            Tag::TableCell => self.append_element(parent, "td", &[]),
            _ => self.append_element(parent, "div", &[]),
        }
    }
}

/// Markdown link and image targets follow the same scheme policy as raw
/// HTML: relative URLs pass, absolute ones need an allowed scheme.
fn is_safe_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => URL_SCHEMES.contains(parsed.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            (!prop.is_empty()).then(|| (prop.to_string(), value.trim().to_string()))
        })
        .collect()
}

// ============================================================================
// Text Escaping
// ============================================================================

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(markdown: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.append_element(body, "div", &[("class", "post-content")]);
        doc.append_markdown(container, markdown);
        (doc, container)
    }

    #[test]
    fn test_markdown_blocks_in_document_order() {
        let (doc, container) = article("# Title\n\nFirst paragraph.\n\n> quoted\n\n- one\n- two\n");
        let tags: Vec<&str> = doc
            .children(container)
            .iter()
            .filter_map(|n| doc.tag(*n))
            .collect();
        assert_eq!(tags, vec!["h1", "p", "blockquote", "ul"]);
        let items = doc.select(container, &Selector::new("li"));
        assert_eq!(items.len(), 2);
        assert_eq!(doc.text_content(items[1]), "two");
    }

    #[test]
    fn test_heading_attributes_become_id() {
        let (doc, container) = article("## Setup {#getting-started}\n");
        let h2 = doc.query(container, &Selector::new("h2")).unwrap();
        assert_eq!(doc.attr(h2, "id"), Some("getting-started"));
        assert_eq!(doc.text_content(h2), "Setup");
    }

    #[test]
    fn test_markdown_link_targets_follow_scheme_policy() {
        let (doc, container) = article(
            "[bad](javascript:alert(1)) [ok](https://example.com/) [local](#p2) ![img](data:text/html,x) ![pic](/media/a.png)\n",
        );
        let hrefs: Vec<_> = doc
            .select(container, &Selector::new("a"))
            .into_iter()
            .map(|a| doc.attr(a, "href"))
            .collect();
        assert_eq!(hrefs, vec![None, Some("https://example.com/"), Some("#p2")]);
        let srcs: Vec<_> = doc
            .select(container, &Selector::new("img"))
            .into_iter()
            .map(|img| doc.attr(img, "src"))
            .collect();
        assert_eq!(srcs, vec![None, Some("/media/a.png")]);
    }

    #[test]
    fn test_code_block_nests_code_in_pre() {
        let (doc, container) = article("```rust\nfn main() {}\n```\n");
        let code = doc.query(container, &Selector::new("code")).unwrap();
        assert_eq!(doc.tag(doc.parent(code).unwrap()), Some("pre"));
        assert!(doc.has_class(code, "language-rust"));
    }

    #[test]
    fn test_raw_html_is_sanitized() {
        let (doc, container) = article("<div>ok</div>\n<script>alert(1)</script>\n\nafter\n");
        let html = doc.inner_html(container);
        assert!(!html.contains("<script>"));
        assert!(html.contains("<p>after</p>"));
    }

    #[test]
    fn test_selector_forms() {
        let mut doc = Document::new();
        let head = doc.head();
        let body = doc.body();
        doc.append_element(head, "script", &[("src", "https://giscus.app/client.js")]);
        let frame = doc.append_element(body, "iframe", &[("class", "giscus-frame other")]);
        let link = doc.append_element(body, "a", &[("href", "#p4")]);

        assert!(doc.query(doc.root(), &Selector::new(r#"script[src*="giscus.app/client.js"]"#)).is_some());
        assert_eq!(doc.query(body, &Selector::new("iframe.giscus-frame")), Some(frame));
        assert_eq!(doc.query(body, &Selector::new("a[href^=\"#p\"]")), Some(link));
        assert!(doc.query(body, &Selector::new("div a")).is_none());
    }

    #[test]
    fn test_closest_is_inclusive() {
        let mut doc = Document::new();
        let body = doc.body();
        let pop = doc.append_element(body, "div", &[("class", "inline-comment-popover")]);
        let button = doc.append_element(pop, "button", &[("class", "popover-close")]);
        let sel = Selector::new(".popover-close, .btn-cancel");
        assert_eq!(doc.closest(button, &sel), Some(button));
        assert_eq!(doc.closest(button, &Selector::new(".inline-comment-popover")), Some(pop));
        assert_eq!(doc.closest(pop, &sel), None);
    }

    #[test]
    fn test_class_and_style_editing() {
        let mut doc = Document::new();
        let body = doc.body();
        let node = doc.append_element(body, "div", &[("class", "a")]);
        doc.add_class(node, "b");
        doc.add_class(node, "b");
        assert_eq!(doc.attr(node, "class"), Some("a b"));
        doc.remove_class(node, "a");
        doc.remove_class(node, "b");
        assert_eq!(doc.attr(node, "class"), None);

        doc.set_style(node, "display", "none");
        doc.set_style(node, "top", "12px");
        assert_eq!(doc.style(node, "display").as_deref(), Some("none"));
        doc.set_style(node, "display", "block");
        assert_eq!(doc.attr(node, "style"), Some("top: 12px; display: block;"));
        doc.set_style(node, "top", "");
        doc.set_style(node, "display", "");
        assert_eq!(doc.attr(node, "style"), None);
    }

    #[test]
    fn test_detached_nodes_are_not_found_by_id() {
        let mut doc = Document::new();
        let body = doc.body();
        let node = doc.append_element(body, "div", &[("id", "popover-p1")]);
        assert_eq!(doc.find_by_id("popover-p1"), Some(node));
        doc.detach(node);
        assert_eq!(doc.find_by_id("popover-p1"), None);
        assert!(!doc.is_attached(node));
    }

    #[test]
    fn test_serialization_escapes_text_and_attributes() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append_element(body, "p", &[("title", "a \"b\"")]);
        doc.append_text(p, "1 < 2 & 3");
        doc.append_element(p, "br", &[]);
        assert_eq!(
            doc.to_html(p),
            "<p title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 3<br></p>"
        );
    }
}
