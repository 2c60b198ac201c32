//! Markdown Exporter - writes a [`BookModel`] as linked Markdown files.
//!
//! The exporter owns every side effect of a conversion: creating the output
//! directory, materializing images, and writing the assembled documents.
//! Assembly itself is delegated to the pure functions in [`crate::markdown`].

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::Result;
use crate::markdown::{
    ChapterIndex, INDEX_FILE_NAME, Labels, LinkMode, assemble_multi_document,
    assemble_single_document, resolve_toc, rewrite_image_refs,
};
use crate::model::BookModel;

use super::Exporter;
use super::resources::materialize_images;

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One document; TOC links point at in-document anchors.
    SingleFile,
    /// An index document plus one file per chapter.
    #[default]
    MultiFile,
}

impl Layout {
    fn link_mode(self) -> LinkMode {
        match self {
            Layout::SingleFile => LinkMode::Anchor,
            Layout::MultiFile => LinkMode::File,
        }
    }
}

/// Configuration for Markdown export.
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    pub layout: Layout,
    /// Emit the table of contents section.
    pub include_toc: bool,
    /// Fixed strings of the generated documents.
    pub labels: Labels,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            include_toc: true,
            labels: Labels::default(),
        }
    }
}

impl MarkdownConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_toc(mut self, include_toc: bool) -> Self {
        self.include_toc = include_toc;
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }
}

/// What an export produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub chapters: usize,
    pub images: usize,
    /// Markdown files written, in write order.
    pub files_written: Vec<PathBuf>,
}

/// Exporter for Markdown output.
#[derive(Debug, Clone, Default)]
pub struct MarkdownExporter {
    config: MarkdownConfig,
}

impl MarkdownExporter {
    /// Create a new MarkdownExporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MarkdownExporter with the specified configuration.
    pub fn with_config(config: MarkdownConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarkdownConfig {
        &self.config
    }

    /// Directory that receives `images/` (and, in multi-file layout, everything).
    fn output_root<'a>(&self, output: &'a Path) -> &'a Path {
        match self.config.layout {
            Layout::MultiFile => output,
            Layout::SingleFile => output
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or(Path::new(".")),
        }
    }
}

impl Exporter for MarkdownExporter {
    /// `output` is the Markdown file in single-file layout and the output
    /// directory in multi-file layout.
    fn export(&self, book: &BookModel, output: &Path) -> Result<ExportSummary> {
        let config = &self.config;
        let root = self.output_root(output);
        fs::create_dir_all(root)?;

        let image_names = materialize_images(book, root)?;
        info!("Wrote {} images under {}", image_names.len(), root.display());

        let book = with_image_refs_rewritten(book, &image_names);
        let index = ChapterIndex::build(&book, &config.labels);
        let toc = resolve_toc(&book, &index, config.layout.link_mode());
        debug!("Chapter index has {} entries", index.len());

        let mut summary = ExportSummary {
            chapters: index.len(),
            images: image_names.len(),
            files_written: Vec::new(),
        };

        match config.layout {
            Layout::SingleFile => {
                let text = assemble_single_document(
                    &book,
                    &index,
                    &toc,
                    config.include_toc,
                    &config.labels,
                );
                write_file(output, &text)?;
                summary.files_written.push(output.to_path_buf());
            }
            Layout::MultiFile => {
                let doc = assemble_multi_document(
                    &book,
                    &index,
                    &toc,
                    config.include_toc,
                    &config.labels,
                );

                let index_path = output.join(INDEX_FILE_NAME);
                write_file(&index_path, &doc.index_file)?;
                summary.files_written.push(index_path);

                for chapter in &doc.chapter_files {
                    let path = output.join(&chapter.file_name);
                    write_file(&path, &chapter.text)?;
                    debug!("Wrote {}", path.display());
                    summary.files_written.push(path);
                }
            }
        }

        info!(
            "Exported {} chapters to {}",
            summary.chapters,
            output.display()
        );
        Ok(summary)
    }
}

/// Copy of `book` whose chapter bodies point at materialized images.
///
/// Image bytes are not carried over; assembly never reads them.
fn with_image_refs_rewritten(book: &BookModel, image_names: &BTreeMap<String, String>) -> BookModel {
    BookModel {
        metadata: book.metadata.clone(),
        toc: book.toc.clone(),
        spine: book.spine.clone(),
        content: book
            .content
            .iter()
            .map(|(id, body)| (id.clone(), rewrite_image_refs(body, image_names)))
            .collect(),
        images: BTreeMap::new(),
    }
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}
