//! Export module for writing a book as Markdown on disk.
//!
//! Provides the `Exporter` trait and the Markdown implementation.
//!
//! # Architecture
//!
//! The `Exporter` trait uses a builder pattern:
//! - `new()` creates an exporter with default configuration
//! - `with_config()` allows customization
//! - `export()` writes to an output path and reports what it wrote
//!
//! # Example
//!
//! ```no_run
//! use epubmd::export::{Exporter, Layout, MarkdownConfig, MarkdownExporter};
//!
//! let book = epubmd::read_epub("input.epub")?;
//!
//! let config = MarkdownConfig::new().with_layout(Layout::SingleFile);
//! let summary = MarkdownExporter::with_config(config).export(&book, "book.md".as_ref())?;
//! println!("{} chapters", summary.chapters);
//! # Ok::<(), epubmd::Error>(())
//! ```

use std::path::Path;

use crate::error::Result;
use crate::model::BookModel;

mod resources;
mod text;

pub use resources::materialize_images;
pub use text::{ExportSummary, Layout, MarkdownConfig, MarkdownExporter};

/// Trait for exporting books to an output location.
///
/// Exporters hold their configuration and write everything a layout needs
/// (documents and resources) below `output`.
pub trait Exporter {
    /// Export the book, returning a summary of the files written.
    fn export(&self, book: &BookModel, output: &Path) -> Result<ExportSummary>;
}
