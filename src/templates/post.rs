//! Post index and post page.

use crate::dom::html_escape;
use crate::models::Post;
use crate::posts::{post_path, RenderedPost};

use super::components::base_html;

pub fn index_page(posts: &[Post]) -> String {
    if posts.is_empty() {
        return base_html("Posts", r#"<p class="text-muted">No posts yet.</p>"#);
    }

    let mut list_html = String::from("<ul class=\"post-list\">");
    for post in posts {
        let date = post
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        list_html.push_str(&format!(
            r#"<li class="post-item">
                <a href="{href}" class="title">{title}</a>
                <span class="meta">{date}</span>
            </li>"#,
            href = post_path(&post.slug),
            title = html_escape(&post.title),
            date = date,
        ));
    }
    list_html.push_str("</ul>");

    base_html("Posts", &list_html)
}

pub fn post_page(post: &Post, rendered: &RenderedPost) -> String {
    base_html(&post.title, &rendered.html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn post(slug: &str, title: &str) -> Post {
        Post {
            slug: slug.to_string(),
            path: PathBuf::from(format!("{slug}.md")),
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15),
            comments: true,
            draft: false,
            body: String::new(),
        }
    }

    #[test]
    fn test_index_lists_posts_with_escaped_titles() {
        let html = index_page(&[post("a", "Tips & <Tricks>"), post("b", "Second")]);
        assert!(html.contains(r#"href="/posts/a""#));
        assert!(html.contains("Tips &amp; &lt;Tricks&gt;"));
        assert!(html.contains("2024-01-15"));
        assert!(html.contains("/assets/marginalia.css"));
    }

    #[test]
    fn test_empty_index() {
        assert!(index_page(&[]).contains("No posts yet."));
    }
}
