//! Post loading and server-side annotation.
//!
//! Posts are Markdown files with an optional frontmatter block. Rendering a
//! post runs the same identifier schemes and control injection the page
//! session uses, so the served markup already carries paragraph ids, link
//! buttons and comment icons.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::citation::{self, inject_link_controls};
use crate::config::{Config, GiscusConfig, CONTENT_SELECTOR, MAX_CITATION_LENGTH};
use crate::dom::{Document, NodeId, Selector};
use crate::error::{Error, Result};
use crate::identify::{assign_ids, IdScheme};
use crate::metadata;
use crate::models::{Location, ParagraphLink, Post};
use crate::overlay::inject_comment_icons;

pub const GISCUS_CLIENT: &str = "https://giscus.app/client.js";

// ============================================================================
// Frontmatter Parsing
// ============================================================================

#[derive(Debug)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub comments: bool,
    pub draft: bool,
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            title: None,
            date: None,
            comments: true,
            draft: false,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a `---` delimited frontmatter block from the body. Content without
/// a closed block is all body.
pub fn parse_frontmatter(content: &str) -> (Frontmatter, String) {
    let mut fm = Frontmatter::default();
    let lines: Vec<&str> = content.lines().collect();

    if lines.is_empty() || lines[0].trim() != "---" {
        return (fm, content.to_string());
    }

    let end_idx = match lines.iter().skip(1).position(|l| l.trim() == "---") {
        Some(i) => i + 1,
        None => return (fm, content.to_string()),
    };

    for line in &lines[1..end_idx] {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches('"');

        match key.trim().to_lowercase().as_str() {
            "title" => fm.title = Some(value.to_string()),
            "date" => {
                if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                    fm.date = Some(date);
                }
            }
            "comments" => {
                if let Some(flag) = parse_bool(value) {
                    fm.comments = flag;
                }
            }
            "draft" => fm.draft = parse_bool(value).unwrap_or(false),
            _ => {}
        }
    }

    let body = lines[end_idx + 1..].join("\n");
    (fm, body)
}

// ============================================================================
// Post Loading
// ============================================================================

/// URL slug for a post file: its path under the content directory without
/// the extension, directories joined with `-`.
pub fn slug_for(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn load_post(path: &Path, content_dir: &Path) -> Result<Post> {
    let content = fs::read_to_string(path)?;
    let relative = path.strip_prefix(content_dir).unwrap_or(path).to_path_buf();
    let (fm, body) = parse_frontmatter(&content);

    let title = fm.title.unwrap_or_else(|| {
        relative
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    Ok(Post {
        slug: slug_for(&relative),
        path: relative,
        title,
        date: fm.date,
        comments: fm.comments,
        draft: fm.draft,
        body,
    })
}

/// All published posts under `content_dir`, newest first. Undated posts
/// come last.
pub fn load_all_posts(content_dir: &Path) -> Vec<Post> {
    use rayon::prelude::*;

    let paths: Vec<PathBuf> = WalkDir::new(content_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "md").unwrap_or(false))
        .map(|e| e.path().to_path_buf())
        .collect();

    let mut posts: Vec<Post> = paths
        .par_iter()
        .filter_map(|path| match load_post(path, content_dir) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                None
            }
        })
        .filter(|post| !post.draft)
        .collect();

    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));
    info!("loaded {} posts from {}", posts.len(), content_dir.display());
    posts
}

pub fn find_post(content_dir: &Path, slug: &str) -> Result<Post> {
    load_all_posts(content_dir)
        .into_iter()
        .find(|p| p.slug == slug)
        .ok_or_else(|| Error::PostNotFound(slug.to_string()))
}

// ============================================================================
// Rendering
// ============================================================================

#[derive(Debug, Clone)]
pub struct RenderedPost {
    /// The annotated `<article>` element.
    pub html: String,
    pub paragraphs: Vec<ParagraphLink>,
}

pub fn post_path(slug: &str) -> String {
    format!("/posts/{}", slug)
}

/// Render `post` with ids, link controls and (when enabled) comment icons.
pub fn render_post(post: &Post, config: &Config) -> Result<RenderedPost> {
    let location = Location::parse(&format!("{}{}", config.site_origin, post_path(&post.slug)))?;

    let mut doc = Document::new();
    let body = doc.body();
    let article = doc.append_element(body, "article", &[("class", "post")]);
    let header = doc.append_element(article, "header", &[("class", "post-header")]);
    let title = doc.append_element(header, "h1", &[("class", "post-title")]);
    doc.append_text(title, &post.title);
    if let Some(date) = post.date {
        let datetime = date.format("%Y-%m-%d").to_string();
        let time = doc.append_element(header, "time", &[("class", "post-date"), ("datetime", datetime.as_str())]);
        doc.append_text(time, &date.format("%B %-d, %Y").to_string());
    }

    let content = doc.append_element(article, "div", &[("class", "post-content")]);
    doc.append_markdown(content, &post.body);

    let container = Selector::new(CONTENT_SELECTOR);
    let paragraphs = assign_ids(
        &mut doc,
        &container,
        &IdScheme::paragraphs().with_min_length(config.min_paragraph_length),
    );
    let sections = assign_ids(&mut doc, &container, &IdScheme::sections());
    let commentable = post.comments.then(|| {
        let scheme = IdScheme::commentable().with_min_length(config.min_paragraph_length);
        assign_ids(&mut doc, &container, &scheme)
    });

    inject_link_controls(&mut doc, &paragraphs);
    inject_link_controls(&mut doc, &sections);
    if let Some(commentable) = &commentable {
        inject_comment_icons(&mut doc, commentable);
        if let Some(giscus) = &config.giscus {
            append_giscus(&mut doc, article, giscus);
        }
    }

    let links = paragraphs
        .iter()
        .map(|tracked| ParagraphLink {
            id: tracked.id.clone(),
            excerpt: metadata::excerpt(&tracked.text, MAX_CITATION_LENGTH),
            link: citation::link_for(&location, &tracked.id),
        })
        .collect();

    Ok(RenderedPost {
        html: doc.to_html(article),
        paragraphs: links,
    })
}

fn append_giscus(doc: &mut Document, article: NodeId, giscus: &GiscusConfig) -> NodeId {
    let section = doc.append_element(article, "section", &[("class", "comments")]);
    doc.append_element(
        section,
        "script",
        &[
            ("src", GISCUS_CLIENT),
            ("data-repo", giscus.repo.as_str()),
            ("data-repo-id", giscus.repo_id.as_str()),
            ("data-category", giscus.category.as_str()),
            ("data-category-id", giscus.category_id.as_str()),
            ("data-mapping", "pathname"),
            ("data-reactions-enabled", "1"),
            ("data-input-position", "bottom"),
            ("data-theme", "preferred_color_scheme"),
            ("crossorigin", "anonymous"),
            ("async", ""),
        ],
    );
    section
}
