//! The chapter index: one entry per readable spine item.
//!
//! The index drives output file naming, anchors and previous/next
//! navigation. It is built once per conversion and only read afterwards.

use std::collections::HashMap;

use log::debug;

use crate::model::BookModel;

use super::labels::Labels;
use super::links::reconcile_href;
use super::slugify::{make_anchor_id, sanitize_file_name_component};

/// A content unit's place in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct ChapterIndexEntry {
    pub content_id: String,
    /// 1-based position among the included spine items.
    pub sequence_number: usize,
    pub title: String,
    pub output_file_name: String,
    pub anchor_id: String,
}

/// Ordered chapter index, in spine order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(transparent))]
pub struct ChapterIndex {
    entries: Vec<ChapterIndexEntry>,
}

impl ChapterIndex {
    /// Build the index for `book`.
    ///
    /// Spine ids without content (cover images, stylesheets listed in the
    /// spine) are skipped and do not consume a sequence number. Titles come
    /// from the first TOC entry, depth-first, whose href reconciles to the
    /// content id; otherwise from [`Labels::fallback_title`].
    pub fn build(book: &BookModel, labels: &Labels) -> Self {
        let titles = toc_titles(book);
        let mut entries = Vec::new();

        for content_id in &book.spine {
            if !book.content.contains_key(content_id) {
                debug!("Spine item {content_id} has no content, skipping");
                continue;
            }

            let sequence_number = entries.len() + 1;
            let title = titles
                .get(content_id.as_str())
                .map(|title| title.to_string())
                .unwrap_or_else(|| labels.fallback_title(sequence_number));

            let output_file_name = chapter_file_name(sequence_number, &title);
            let anchor_id = make_anchor_id(&title);

            debug!("Chapter {sequence_number}: {content_id} -> {output_file_name}");
            entries.push(ChapterIndexEntry {
                content_id: content_id.clone(),
                sequence_number,
                title,
                output_file_name,
                anchor_id,
            });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[ChapterIndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChapterIndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry for `content_id`.
    pub fn get(&self, content_id: &str) -> Option<&ChapterIndexEntry> {
        self.entries.iter().find(|e| e.content_id == content_id)
    }

    /// The entry before position `i` in reading order.
    pub fn previous(&self, i: usize) -> Option<&ChapterIndexEntry> {
        i.checked_sub(1).and_then(|p| self.entries.get(p))
    }

    /// The entry after position `i` in reading order.
    pub fn next(&self, i: usize) -> Option<&ChapterIndexEntry> {
        self.entries.get(i + 1)
    }
}

impl<'a> IntoIterator for &'a ChapterIndex {
    type Item = &'a ChapterIndexEntry;
    type IntoIter = std::slice::Iter<'a, ChapterIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Content id -> title of the first non-blank TOC entry, depth-first, whose
/// href reconciles to it.
fn toc_titles(book: &BookModel) -> HashMap<&str, &str> {
    let candidates = book.content_ids();
    let mut titles = HashMap::new();
    for entry in book.toc_entries() {
        let title = entry.title.trim();
        if title.is_empty() {
            continue;
        }
        if let Some(content_id) = reconcile_href(&entry.href, &candidates) {
            titles.entry(content_id).or_insert(title);
        }
    }
    titles
}

/// `{n:02}-{title}.md`, or `{n:02}.md` when the title has no safe characters.
fn chapter_file_name(sequence_number: usize, title: &str) -> String {
    let safe_title = sanitize_file_name_component(title);
    if safe_title.is_empty() {
        format!("{sequence_number:02}.md")
    } else {
        format!("{sequence_number:02}-{safe_title}.md")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TocEntry;
    use proptest::prelude::*;

    #[test]
    fn test_fallback_titles() {
        let mut book = BookModel::new();
        book.add_chapter("a", "<h1>A</h1>");
        book.add_chapter("b", "<h1>B</h1>");
        book.add_chapter("c", "<h1>C</h1>");

        let index = ChapterIndex::build(&book, &Labels::default());
        let titles: Vec<&str> = index.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Chapter 1", "Chapter 2", "Chapter 3"]);
        assert_eq!(index.entries()[0].output_file_name, "01-Chapter_1.md");
        assert_eq!(index.entries()[2].anchor_id, "chapter-3");
    }

    #[test]
    fn test_localized_fallback() {
        let mut book = BookModel::new();
        book.add_chapter("a", "");
        let index = ChapterIndex::build(&book, &Labels::chinese());
        assert_eq!(index.entries()[0].title, "第1章");
        assert_eq!(index.entries()[0].output_file_name, "01-第1章.md");
    }

    #[test]
    fn test_titles_from_nested_toc() {
        let mut book = BookModel::new();
        book.add_chapter("part1", "");
        book.add_chapter("ch1", "");
        book.toc = vec![
            TocEntry::new("Part One", "Text/part1.xhtml")
                .with_child(TocEntry::new("The Beginning", "Text/ch1.xhtml")),
        ];

        let index = ChapterIndex::build(&book, &Labels::default());
        assert_eq!(index.entries()[0].title, "Part One");
        assert_eq!(index.entries()[1].title, "The Beginning");
        assert_eq!(index.entries()[1].output_file_name, "02-The_Beginning.md");
    }

    #[test]
    fn test_first_matching_toc_entry_wins() {
        let mut book = BookModel::new();
        book.add_chapter("ch1", "");
        book.toc = vec![
            TocEntry::new("Chapter 1", "ch1.xhtml")
                .with_child(TocEntry::new("Section", "ch1.xhtml#s1")),
        ];
        let index = ChapterIndex::build(&book, &Labels::default());
        assert_eq!(index.entries()[0].title, "Chapter 1");
    }

    #[test]
    fn test_later_toc_entry_titles_other_chapter() {
        let mut book = BookModel::new();
        book.add_chapter("ch1", "");
        book.add_chapter("ch2", "");
        book.toc = vec![
            TocEntry::new("Second", "ch2.xhtml"),
            TocEntry::new("Second Again", "ch2.xhtml#later"),
            TocEntry::new("First", "ch1.xhtml"),
        ];
        let index = ChapterIndex::build(&book, &Labels::default());
        assert_eq!(index.entries()[0].title, "First");
        assert_eq!(index.entries()[1].title, "Second");
    }

    #[test]
    fn test_blank_toc_title_falls_back() {
        let mut book = BookModel::new();
        book.add_chapter("ch1", "");
        book.toc = vec![TocEntry::new("   ", "ch1.xhtml")];
        let index = ChapterIndex::build(&book, &Labels::default());
        assert_eq!(index.entries()[0].title, "Chapter 1");
    }

    #[test]
    fn test_spine_without_content_is_skipped_and_not_counted() {
        let mut book = BookModel::new();
        book.spine.push("cover-img".into());
        book.add_chapter("ch1", "");
        book.spine.push("missing".into());
        book.add_chapter("ch2", "");

        let index = ChapterIndex::build(&book, &Labels::default());
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[0].content_id, "ch1");
        assert_eq!(index.entries()[0].sequence_number, 1);
        assert_eq!(index.entries()[1].content_id, "ch2");
        assert_eq!(index.entries()[1].output_file_name, "02-Chapter_2.md");
    }

    #[test]
    fn test_file_name_padding_grows_past_99() {
        assert_eq!(chapter_file_name(7, "Seven"), "07-Seven.md");
        assert_eq!(chapter_file_name(100, "Hundred"), "100-Hundred.md");
        assert_eq!(chapter_file_name(3, "???"), "03.md");
    }

    #[test]
    fn test_neighbours() {
        let mut book = BookModel::new();
        book.add_chapter("a", "");
        book.add_chapter("b", "");
        let index = ChapterIndex::build(&book, &Labels::default());

        assert!(index.previous(0).is_none());
        assert_eq!(index.next(0).map(|e| e.content_id.as_str()), Some("b"));
        assert_eq!(index.previous(1).map(|e| e.content_id.as_str()), Some("a"));
        assert!(index.next(1).is_none());
    }

    proptest! {
        #[test]
        fn prop_index_follows_spine(
            spine in prop::collection::vec("[a-e]", 0..12),
            present in prop::collection::btree_set("[a-e]", 0..5),
        ) {
            let mut book = BookModel::new();
            book.spine = spine.clone();
            for id in &present {
                book.content.insert(id.clone(), String::new());
            }

            let index = ChapterIndex::build(&book, &Labels::default());
            let expected: Vec<&String> = spine.iter().filter(|id| present.contains(*id)).collect();
            let actual: Vec<&String> = index.iter().map(|e| &e.content_id).collect();
            prop_assert_eq!(actual, expected);

            for (i, entry) in index.iter().enumerate() {
                prop_assert_eq!(entry.sequence_number, i + 1);
            }
        }
    }
}
