//! Shared HTML components: navigation bar and the base page template.

use crate::dom::html_escape;

pub const STYLESHEET_PATH: &str = "/assets/marginalia.css";

// ============================================================================
// Navigation Bar
// ============================================================================

pub fn nav_bar(site_title: &str) -> String {
    format!(
        r#"<nav class="nav-bar">
            <a href="/"><strong>{}</strong></a>
            <span class="spacer"></span>
            <a href="/">All posts</a>
        </nav>"#,
        html_escape(site_title)
    )
}

// ============================================================================
// Base HTML Template
// ============================================================================

pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="{stylesheet}">
</head>
<body>
    {nav}
    <div class="container">
        {content}
    </div>
</body>
</html>"#,
        title = html_escape(title),
        stylesheet = STYLESHEET_PATH,
        nav = nav_bar("Marginalia"),
        content = content,
    )
}
