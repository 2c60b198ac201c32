//! # epubmd
//!
//! Convert EPUB ebooks into linked Markdown documents.
//!
//! ## Features
//!
//! - Read EPUB 2/3 files (NCX or EPUB 3 navigation document)
//! - Convert XHTML content to Markdown
//! - Write one document with in-page anchors, or an index plus one file per
//!   chapter with previous/next navigation
//! - Extract embedded images and point image links at them
//!
//! ## Quick Start
//!
//! ```no_run
//! use epubmd::{Exporter, Layout, MarkdownConfig, MarkdownExporter, read_epub};
//!
//! let book = read_epub("input.epub")?;
//!
//! // One directory with README.md and a file per chapter
//! MarkdownExporter::new().export(&book, "output".as_ref())?;
//!
//! // A single Markdown file
//! let config = MarkdownConfig::new().with_layout(Layout::SingleFile);
//! MarkdownExporter::with_config(config).export(&book, "output.md".as_ref())?;
//! # Ok::<(), epubmd::Error>(())
//! ```
//!
//! ## Working with Books
//!
//! The [`BookModel`] struct is what the assembly engine consumes, so books
//! can also be built by hand:
//!
//! ```
//! use epubmd::{BookModel, Metadata, TocEntry};
//! use epubmd::markdown::{ChapterIndex, Labels};
//!
//! let mut book = BookModel::new();
//! book.metadata = Metadata::new("My Book").with_creator("Author Name");
//! book.add_chapter("ch1", "Once upon a time.");
//! book.toc.push(TocEntry::new("Beginning", "Text/ch1.xhtml"));
//!
//! let index = ChapterIndex::build(&book, &Labels::default());
//! assert_eq!(index.entries()[0].output_file_name, "01-Beginning.md");
//! ```

pub mod epub;
pub mod error;
pub mod export;
pub mod markdown;
pub mod model;
pub mod transform;
pub(crate) mod util;

pub use epub::read_epub;
pub use error::{Error, Result};
pub use export::{ExportSummary, Exporter, Layout, MarkdownConfig, MarkdownExporter};
pub use model::{BookModel, ImageAsset, Metadata, TocEntry};
