//! Pure Markdown document assembly and linking.
//!
//! This module turns a [`BookModel`](crate::model::BookModel) into Markdown
//! text without touching the filesystem:
//!
//! - [`slugify`]: file-name and anchor identifiers derived from titles
//! - [`index`]: the ordered chapter index (titles, file names, anchors)
//! - [`links`]: TOC href reconciliation and resolution per layout
//! - [`render`]: single-document and multi-document assembly
//! - [`images`]: rewriting image link targets to materialized files
//! - [`escape`]: Markdown escaping shared with the XHTML transform
//!
//! The export layer ([`crate::export`]) handles I/O orchestration, calling
//! these pure functions to generate content.
//!
//! ## Addressing
//!
//! Three naming schemes meet here. Container hrefs (`Text/ch01.xhtml#s2`)
//! are reconciled to content ids (`ch01`) by loose file-name matching; the
//! chapter index then gives every content id an output file
//! (`01-Introduction.md`) and an anchor (`introduction`). TOC links point at
//! files in the multi-file layout and at anchors in the single-file layout,
//! always at the top of the target chapter.

mod escape;
mod images;
mod index;
mod labels;
mod links;
mod render;
mod slugify;

pub use escape::{
    calculate_fence_length, calculate_inline_code_ticks, escape_link_text, escape_markdown,
};
pub use images::{IMAGE_DIR, rewrite_image_refs};
pub use index::{ChapterIndex, ChapterIndexEntry};
pub use labels::Labels;
pub use links::{LinkMode, ResolvedLink, reconcile_href, resolve_toc};
pub use render::{
    ChapterFile, INDEX_FILE_NAME, MultiDocument, assemble_multi_document,
    assemble_single_document, render_metadata, render_toc,
};
pub use slugify::{MAX_FILE_NAME_CHARS, make_anchor_id, sanitize_file_name_component};
