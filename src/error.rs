//! Error type shared across the crate.
//!
//! Only two errors ever reach the reader: a rejected clipboard write (which
//! falls back to a prompt) and a failed comment post (shown as a banner).
//! Everything else is logged and the page carries on.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("clipboard write rejected: {0}")]
    Clipboard(String),

    #[error("discussion widget is not ready")]
    WidgetNotReady,

    #[error("discussion widget rejected the comment: {0}")]
    WidgetPost(String),

    #[error("malformed comment metadata: {0}")]
    MalformedMetadata(#[from] serde_json::Error),

    #[error("invalid page url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("post not found: {0}")]
    PostNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
