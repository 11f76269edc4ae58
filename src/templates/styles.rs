//! CSS for the blog and its paragraph annotations.

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
/* Solarized Light Theme */
:root {
    --base03: #002b36;
    --base02: #073642;
    --base01: #586e75;
    --base00: #657b83;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;

    --yellow: #b58900;
    --red: #dc322f;
    --blue: #268bd2;
    --cyan: #2aa198;
    --green: #859900;

    --bg: var(--base3);
    --fg: var(--base00);
    --muted: var(--base1);
    --border: var(--base2);
    --link: var(--blue);
    --link-hover: var(--cyan);
    --accent: var(--base2);
    --code-bg: var(--base2);
    --highlight: #f7f2e2;
    --flash: #fbeec1;
    --color-success: var(--green);
    --color-error: var(--red);
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
}

.container {
    max-width: 760px;
    margin: 0 auto;
    padding: 1rem;
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

h1, h2, h3, h4 { font-weight: 600; margin-top: 1.5em; margin-bottom: 0.5em; }
h1 { font-size: 1.6rem; }

.nav-bar {
    position: sticky;
    top: 0;
    background: var(--bg);
    border-bottom: 1px solid var(--border);
    padding: 0.5rem 1rem;
    display: flex;
    gap: 1rem;
    align-items: center;
    z-index: 100;
}
.nav-bar a { font-size: 0.9rem; }
.nav-bar .spacer { flex: 1; }

/* Post list */
.post-list { list-style: none; }
.post-item {
    padding: 0.75rem 0;
    border-bottom: 1px solid var(--border);
    display: flex;
    justify-content: space-between;
    align-items: baseline;
    gap: 1rem;
}
.post-item:last-child { border-bottom: none; }
.post-item .meta { font-size: 0.8rem; color: var(--muted); white-space: nowrap; }

/* Post body */
.post-header .post-date { font-size: 0.85rem; color: var(--muted); }
.post-content p, .post-content blockquote, .post-content ul, .post-content ol, .post-content pre { margin: 1em 0; }
.post-content blockquote { border-left: 3px solid var(--border); padding-left: 1rem; color: var(--base01); }
.post-content pre { background: var(--code-bg); padding: 0.75rem; border-radius: 4px; overflow-x: auto; }
.post-content code { font-family: "SF Mono", "Consolas", "Liberation Mono", monospace; font-size: 0.85em; }
.post-content ul, .post-content ol { padding-left: 1.5rem; }

/* Citation links */
.citable-paragraph, .citable-section { position: relative; }
.para-link-icon {
    position: absolute;
    right: -2rem;
    top: 0.2rem;
    background: none;
    border: none;
    color: var(--muted);
    cursor: pointer;
    opacity: 0;
    transition: opacity 0.15s;
}
.citable-paragraph:hover .para-link-icon,
.citable-section:hover .para-link-icon,
.para-link-icon:focus { opacity: 1; }
.para-link-icon.copied { color: var(--color-success); opacity: 1; }
.copy-tooltip {
    position: absolute;
    bottom: 100%;
    right: 0;
    white-space: nowrap;
    font-size: 0.75rem;
    background: var(--base02);
    color: var(--base3);
    padding: 0.15rem 0.4rem;
    border-radius: 3px;
}

.highlight-flash, .flash-highlight { animation: flash 2s ease-out; }
@keyframes flash {
    from { background: var(--flash); }
    to { background: transparent; }
}

/* Inline comments */
.commentable-paragraph { position: relative; }
.para-comment-icon {
    position: absolute;
    left: -2.25rem;
    top: 0.2rem;
    color: var(--muted);
    cursor: pointer;
    opacity: 0;
    transition: opacity 0.15s;
    display: inline-flex;
    align-items: center;
    gap: 0.15rem;
}
.commentable-paragraph:hover .para-comment-icon,
.para-comment-icon:focus,
.commentable-paragraph.has-comments .para-comment-icon { opacity: 1; }
.commentable-paragraph.has-comments .para-comment-icon { color: var(--link); }
.comment-count { font-size: 0.7rem; }

.visually-hidden {
    position: absolute;
    width: 1px;
    height: 1px;
    overflow: hidden;
    clip: rect(0 0 0 0);
    white-space: nowrap;
}

.inline-comment-popover {
    position: absolute;
    width: 380px;
    background: var(--bg);
    border: 1px solid var(--border);
    border-radius: 6px;
    box-shadow: 0 4px 16px rgba(0, 0, 0, 0.12);
    opacity: 0;
    visibility: hidden;
    transform: translateY(4px);
    transition: opacity 0.2s, transform 0.2s, visibility 0.2s;
    z-index: 200;
}
.inline-comment-popover.open { opacity: 1; visibility: visible; transform: none; }
.popover-header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    padding: 0.5rem 0.75rem;
    border-bottom: 1px solid var(--border);
}
.popover-title { margin: 0; font-size: 0.95rem; }
.popover-close { background: none; border: none; color: var(--muted); cursor: pointer; }
.popover-body { padding: 0.75rem; max-height: 420px; overflow-y: auto; }
.popover-arrow { display: none; }

.inline-comment-item { padding: 0.5rem 0; border-bottom: 1px solid var(--border); }
.comment-author { display: flex; align-items: center; gap: 0.4rem; font-size: 0.8rem; }
.comment-avatar { width: 20px; height: 20px; border-radius: 50%; }
.comment-author-name { font-weight: 600; }
.comment-date { color: var(--muted); }
.comment-body { font-size: 0.9rem; margin-top: 0.25rem; white-space: pre-wrap; }
.text-muted { color: var(--muted); font-size: 0.85rem; }

.comment-input {
    width: 100%;
    margin-top: 0.5rem;
    padding: 0.5rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    font-family: inherit;
    font-size: 0.9rem;
    background: var(--bg);
    color: var(--fg);
    resize: vertical;
}
.form-hint { font-size: 0.75rem; color: var(--muted); margin-top: 0.25rem; }
.form-actions { display: flex; justify-content: flex-end; gap: 0.5rem; margin-top: 0.5rem; }
.btn {
    padding: 0.35rem 0.75rem;
    border-radius: 4px;
    border: 1px solid var(--border);
    font-size: 0.85rem;
    cursor: pointer;
    display: inline-flex;
    align-items: center;
    gap: 0.3rem;
}
.btn-secondary { background: var(--bg); color: var(--fg); }
.btn-primary { background: var(--link); border-color: var(--link); color: var(--base3); }
.btn[disabled] { opacity: 0.6; cursor: progress; }
.comment-error { margin-top: 0.5rem; color: var(--color-error); font-size: 0.85rem; }

.popover-overlay {
    position: fixed;
    inset: 0;
    background: rgba(0, 0, 0, 0.35);
    opacity: 0;
    transition: opacity 0.3s;
    z-index: 150;
}
.popover-overlay.open { opacity: 1; }

.comments { margin-top: 3rem; }

@media (max-width: 767px) {
    .para-link-icon { right: 0; }
    .para-comment-icon { position: static; opacity: 1; margin-right: 0.25rem; }
    .inline-comment-popover {
        position: fixed;
        left: 0 !important;
        right: 0;
        bottom: 0;
        top: auto !important;
        width: 100%;
        border-radius: 12px 12px 0 0;
        transform: translateY(100%);
    }
    .inline-comment-popover.open { transform: none; }
}
"#;
