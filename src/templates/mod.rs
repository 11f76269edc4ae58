//! HTML templates and styling for the blog.
//!
//! ## Module Structure
//!
//! - `styles` - CSS for posts, citation links and the comment overlay
//! - `components` - Navigation bar and base page template
//! - `post` - Post index and post page

mod components;
mod post;
mod styles;

pub use components::{base_html, nav_bar, STYLESHEET_PATH};
pub use post::{index_page, post_page};
pub use styles::STYLE;
