//! Error types for epubmd operations.

use thiserror::Error;

/// Errors that can occur while reading a book or writing Markdown output.
///
/// Inconsistent internal linking (missing titles, unmatched TOC hrefs,
/// unmatched image references) is not an error; those cases degrade to
/// fallback values instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("No readable chapters: {0}")]
    EmptyBook(String),

    #[error("Invalid labels: {0}")]
    Labels(String),
}

pub type Result<T> = std::result::Result<T, Error>;
