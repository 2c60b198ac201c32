//! Cross-reference resolution between TOC hrefs, content ids and output targets.
//!
//! Container hrefs (`Text/ch01.xhtml#s2`), content ids (`ch01`) and the
//! generated names (`01-Intro.md`, `#intro`) are three separate addressing
//! schemes. [`reconcile_href`] maps the first onto the second; [`resolve_toc`]
//! then maps the TOC onto the third for the chosen layout.

use log::debug;

use crate::model::{BookModel, TocEntry};
use crate::util::{basename, strip_fragment};

use super::index::ChapterIndex;
use super::slugify::sanitize_file_name_component;

/// Best-effort match of a container href against known content ids.
///
/// The fragment and directory part of `href` are dropped. A candidate equal
/// to the remaining file name (or to its stem) wins; otherwise the first
/// candidate, in the given order, where either string contains the other.
/// Returns `None` for hrefs with no file part (`#note-1`).
///
/// # Examples
///
/// ```
/// use epubmd::markdown::reconcile_href;
///
/// let ids = ["cover", "chapter-1", "chapter-2"];
/// assert_eq!(reconcile_href("Text/chapter-2.xhtml#s1", &ids), Some("chapter-2"));
/// assert_eq!(reconcile_href("#top", &ids), None);
/// ```
pub fn reconcile_href<'a>(href: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let name = basename(strip_fragment(href));
    if name.is_empty() {
        return None;
    }
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);

    let candidates = candidates.iter().copied().filter(|id| !id.is_empty());

    candidates
        .clone()
        .find(|&id| id == name || id == stem)
        .or_else(|| candidates.into_iter().find(|&id| name.contains(id) || id.contains(name)))
}

/// How resolved TOC links address their targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Links point at sibling chapter files (the multi-file index).
    File,
    /// Links point at anchors inside one document.
    Anchor,
}

/// A TOC entry with its output link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub display_title: String,
    pub target_reference: String,
    pub children: Vec<ResolvedLink>,
}

/// Resolve every TOC entry, preserving the tree shape.
///
/// In [`LinkMode::File`] a matched chapter links to its output file name
/// (the fragment is discarded). A matched content unit that is not in the
/// index links to a file named after the entry title, or `{contentId}.md`
/// when the title sanitizes to nothing. Unmatched hrefs are kept verbatim.
///
/// In [`LinkMode::Anchor`] a matched chapter links to `#{anchorId}`; every
/// other entry keeps its original href.
pub fn resolve_toc(book: &BookModel, index: &ChapterIndex, mode: LinkMode) -> Vec<ResolvedLink> {
    let candidates = book.content_ids();
    resolve_entries(&book.toc, index, &candidates, mode)
}

fn resolve_entries(
    entries: &[TocEntry],
    index: &ChapterIndex,
    candidates: &[&str],
    mode: LinkMode,
) -> Vec<ResolvedLink> {
    entries
        .iter()
        .map(|entry| ResolvedLink {
            display_title: entry.title.clone(),
            target_reference: resolve_entry(entry, index, candidates, mode),
            children: resolve_entries(&entry.children, index, candidates, mode),
        })
        .collect()
}

fn resolve_entry(
    entry: &TocEntry,
    index: &ChapterIndex,
    candidates: &[&str],
    mode: LinkMode,
) -> String {
    let Some(content_id) = reconcile_href(&entry.href, candidates) else {
        debug!("TOC entry {:?} ({}) matches no content", entry.title, entry.href);
        return entry.href.clone();
    };

    let chapter = index.get(content_id);
    match (mode, chapter) {
        (LinkMode::File, Some(chapter)) => chapter.output_file_name.clone(),
        (LinkMode::File, None) => {
            let safe_title = sanitize_file_name_component(&entry.title);
            if safe_title.is_empty() {
                format!("{content_id}.md")
            } else {
                format!("{safe_title}.md")
            }
        }
        (LinkMode::Anchor, Some(chapter)) => format!("#{}", chapter.anchor_id),
        (LinkMode::Anchor, None) => {
            debug!("TOC entry {:?} targets {content_id}, which is not in the reading order", entry.title);
            entry.href.clone()
        }
    }
}
