//! # turndown-confluence
//!
//! Convert Confluence page HTML to compact Markdown.
//!
//! Confluence's rendered view is full of layout wrappers, auto-generated
//! macros and tracking parameters. This crate strips that noise, then runs a
//! turndown-style rule table over the remaining tree: Confluence rules first
//! (status lozenges, Jira references, user mentions, links), CommonMark rules
//! after them.
//!
//! ## Example
//!
//! ```rust
//! let html = r#"<h2>Overview</h2><p>Status: <span class="status-macro">LIVE</span></p>"#;
//! let markdown = turndown_confluence::convert(html).unwrap();
//! assert_eq!(markdown, "## Overview\n\nStatus: [LIVE]");
//! ```
//!
//! ## Custom options
//!
//! ```rust
//! use turndown_confluence::{HeadingStyle, Options, TurndownService};
//!
//! let service = TurndownService::with_options(Options {
//!     heading_style: HeadingStyle::Setext,
//!     ..Default::default()
//! });
//! let markdown = service.turndown("<h1>Title</h1>").unwrap();
//! assert_eq!(markdown, "Title\n=====");
//! ```

pub mod html;
pub mod node;
mod options;
pub mod preprocess;
mod rules;
mod sanitize;
mod service;
mod utilities;

use once_cell::sync::Lazy;

pub use html::parse_html;
pub use node::{Element, Node, NodeRef};
pub use options::{CodeBlockStyle, EscapeMode, HeadingStyle, Options};
pub use preprocess::{preprocess, Selector};
pub use rules::{commonmark_rules, confluence_rules, Filter, ReplacementFn, Rule, Rules, Tier};
pub use sanitize::{clean_url, TRACKING_PARAMS};
pub use service::TurndownService;
pub use utilities::{escape_markdown, looks_like_url, normalize_inline_text};

/// Error type for conversion
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error{}: {message}", at_offset(.offset))]
    Parse {
        offset: Option<usize>,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

fn at_offset(offset: &Option<usize>) -> String {
    offset.map(|o| format!(" at byte {o}")).unwrap_or_default()
}

static DEFAULT_SERVICE: Lazy<TurndownService> = Lazy::new(TurndownService::new);

/// Convert Confluence HTML to Markdown with the default options.
pub fn convert(html: &str) -> Result<String> {
    DEFAULT_SERVICE.turndown(html)
}

/// Like [`convert`], for a raw response body. The bytes must be UTF-8.
pub fn convert_bytes(bytes: &[u8]) -> Result<String> {
    let html = std::str::from_utf8(bytes).map_err(|e| Error::Parse {
        offset: Some(e.valid_up_to()),
        message: e.to_string(),
    })?;
    convert(html)
}
