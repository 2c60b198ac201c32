//! Parsed book structure consumed by the Markdown layer.
//!
//! A [`BookModel`] is what the EPUB reader produces and what the assembly
//! engine consumes: metadata, a table-of-contents forest, the spine (linear
//! reading order), already-converted chapter bodies and the image registry.
//! It is immutable once built; every derived structure borrows from it.

mod toc;

use std::collections::BTreeMap;

pub use toc::{TocEntry, TocIter};

/// Intermediate representation of a book ready for Markdown assembly.
///
/// `content` and `images` are ordered maps so that every iteration over them
/// is deterministic.
#[derive(Debug, Clone, Default)]
pub struct BookModel {
    pub metadata: Metadata,
    pub toc: Vec<TocEntry>,
    /// Content-unit identifiers in linear reading order.
    pub spine: Vec<String>,
    /// Content-unit id -> Markdown body.
    pub content: BTreeMap<String, String>,
    /// Image id -> image asset.
    pub images: BTreeMap<String, ImageAsset>,
}

/// Book metadata (the Dublin Core subset the output uses).
///
/// Every field is optional; absent fields are omitted from the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub language: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub identifier: Option<String>,
}

/// An embedded image as declared by the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub data: Vec<u8>,
    /// Declared file name (basename of the manifest href).
    pub file_name: String,
    pub media_type: String,
}

impl BookModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a content unit to both the spine and the content map.
    pub fn add_chapter(&mut self, id: impl Into<String>, body: impl Into<String>) {
        let id = id.into();
        self.spine.push(id.clone());
        self.content.insert(id, body.into());
    }

    pub fn add_image(
        &mut self,
        id: impl Into<String>,
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        data: Vec<u8>,
    ) {
        self.images.insert(
            id.into(),
            ImageAsset {
                data,
                file_name: file_name.into(),
                media_type: media_type.into(),
            },
        );
    }

    /// Content ids in the order identifier reconciliation should try them:
    /// spine order first, then content not reachable from the spine.
    pub fn content_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::with_capacity(self.content.len());
        for id in &self.spine {
            if self.content.contains_key(id) && !ids.contains(&id.as_str()) {
                ids.push(id);
            }
        }
        for id in self.content.keys() {
            if !ids.contains(&id.as_str()) {
                ids.push(id);
            }
        }
        ids
    }

    /// Number of spine items that have content, i.e. the chapters that
    /// will be written.
    pub fn chapter_count(&self) -> usize {
        self.spine
            .iter()
            .filter(|id| self.content.contains_key(*id))
            .count()
    }

    /// Depth-first iterator over the whole TOC forest.
    pub fn toc_entries(&self) -> TocIter<'_> {
        TocIter::new(&self.toc)
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}
