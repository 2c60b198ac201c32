//! Content transforms for ebook conversion
//!
//! - HTML: XHTML content documents to Markdown text

pub mod html;

pub use html::{DocumentContext, convert_document, html_to_markdown, normalize_blank_lines};
