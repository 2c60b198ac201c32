//! Document assembly: metadata, table of contents, navigation and chapters.
//!
//! Everything here is pure string building over explicitly ordered inputs,
//! so the same book and configuration always give byte-identical output.
//! Writing the result to disk is the export layer's job.

use std::fmt::Write as _;

use crate::model::{BookModel, Metadata};

use super::escape::escape_link_text;
use super::index::{ChapterIndex, ChapterIndexEntry};
use super::labels::Labels;
use super::links::ResolvedLink;

/// File name of the multi-file index document.
pub const INDEX_FILE_NAME: &str = "README.md";

/// One generated chapter file in the multi-file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    pub file_name: String,
    pub text: String,
}

/// Output of the multi-file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiDocument {
    /// Contents of [`INDEX_FILE_NAME`].
    pub index_file: String,
    /// Chapter files in reading order.
    pub chapter_files: Vec<ChapterFile>,
}

/// Render the metadata block.
///
/// The title becomes a level-1 heading; creator, publisher, date and
/// language become labeled lines. Absent fields produce no line at all.
pub fn render_metadata(metadata: &Metadata, labels: &Labels) -> String {
    let mut out = String::new();

    if let Some(title) = &metadata.title {
        let _ = write!(out, "# {title}\n\n");
    }
    if let Some(creator) = &metadata.creator {
        let _ = write!(out, "{}: {creator}\n\n", labels.author);
    }

    let lines = [
        (&labels.publisher, &metadata.publisher),
        (&labels.date, &metadata.date),
        (&labels.language, &metadata.language),
    ];
    for (label, value) in lines {
        if let Some(value) = value {
            let _ = writeln!(out, "{label}: {value}");
        }
    }

    out
}

/// Render the table of contents as a nested Markdown list.
///
/// Each entry is `- [title](href)`, indented two spaces per nesting level,
/// children directly after their parent.
pub fn render_toc(links: &[ResolvedLink], labels: &Labels) -> String {
    let mut out = format!("## {}\n\n", labels.contents);
    render_toc_entries(&mut out, links, 0);
    out
}

fn render_toc_entries(out: &mut String, links: &[ResolvedLink], level: usize) {
    for link in links {
        let indent = "  ".repeat(level);
        let _ = writeln!(
            out,
            "{indent}- [{}]({})",
            escape_link_text(&link.display_title),
            link.target_reference
        );
        render_toc_entries(out, &link.children, level + 1);
    }
}

/// Assemble the whole book as one Markdown document.
///
/// Layout: metadata block, blank line, optional TOC (whose links should be
/// resolved in anchor mode), blank line, then per chapter an anchor marker,
/// a level-1 heading and the body.
pub fn assemble_single_document(
    book: &BookModel,
    index: &ChapterIndex,
    resolved_toc: &[ResolvedLink],
    include_toc: bool,
    labels: &Labels,
) -> String {
    let mut out = render_metadata(&book.metadata, labels);
    out.push_str("\n\n");

    if include_toc {
        out.push_str(&render_toc(resolved_toc, labels));
        out.push_str("\n\n");
    }

    for chapter in index {
        if !chapter.anchor_id.is_empty() {
            let _ = write!(out, "<a id=\"{}\"></a>\n\n", chapter.anchor_id);
        }
        let _ = write!(out, "# {}\n\n", chapter.title);
        out.push_str(chapter_body(book, chapter));
        out.push_str("\n\n");
    }

    out
}

/// Assemble the book as an index document plus one file per chapter.
///
/// The index holds the metadata block and, if `include_toc`, the TOC (whose
/// links should be resolved in file mode). Each chapter file is framed by
/// navigation lines linking to the index and to its neighbours in reading
/// order.
pub fn assemble_multi_document(
    book: &BookModel,
    index: &ChapterIndex,
    resolved_toc: &[ResolvedLink],
    include_toc: bool,
    labels: &Labels,
) -> MultiDocument {
    let mut index_file = render_metadata(&book.metadata, labels);
    index_file.push_str("\n\n");
    if include_toc {
        index_file.push_str(&render_toc(resolved_toc, labels));
    }

    let chapter_files = index
        .iter()
        .enumerate()
        .map(|(i, chapter)| {
            let nav = render_nav_line(index, i, labels);
            let mut text = String::new();
            let _ = write!(text, "{nav}\n\n---\n\n");
            let _ = write!(text, "# {}\n\n", chapter.title);
            text.push_str(chapter_body(book, chapter));
            text.push_str("\n\n");
            let _ = writeln!(text, "\n\n---\n\n{nav}");

            ChapterFile {
                file_name: chapter.output_file_name.clone(),
                text,
            }
        })
        .collect();

    MultiDocument {
        index_file,
        chapter_files,
    }
}

/// `[ [Contents](README.md) ] [ [← prev](…) ] [ [next →](…) ]`
fn render_nav_line(index: &ChapterIndex, position: usize, labels: &Labels) -> String {
    let mut nav = format!("[ [{}]({INDEX_FILE_NAME}) ]", escape_link_text(&labels.contents));

    if let Some(prev) = index.previous(position) {
        let title = nav_title(prev, &labels.previous);
        let _ = write!(nav, " [ [← {title}]({}) ]", prev.output_file_name);
    }
    if let Some(next) = index.next(position) {
        let title = nav_title(next, &labels.next);
        let _ = write!(nav, " [ [{title} →]({}) ]", next.output_file_name);
    }

    nav
}

fn nav_title(chapter: &ChapterIndexEntry, fallback: &str) -> String {
    if chapter.title.is_empty() {
        escape_link_text(fallback)
    } else {
        escape_link_text(&chapter.title)
    }
}

fn chapter_body<'a>(book: &'a BookModel, chapter: &ChapterIndexEntry) -> &'a str {
    book.content
        .get(&chapter.content_id)
        .map(String::as_str)
        .unwrap_or_default()
}
