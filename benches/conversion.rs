//! Benchmarks for the Markdown assembly pipeline.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use epubmd::markdown::{
    ChapterIndex, Labels, LinkMode, assemble_multi_document, assemble_single_document,
    resolve_toc,
};
use epubmd::transform::html_to_markdown;
use epubmd::{BookModel, Metadata, TocEntry};

const CHAPTERS: usize = 200;

/// A book with nested TOC sections, one untitled chapter in ten.
fn synthetic_book() -> BookModel {
    let mut book = BookModel::new();
    book.metadata = Metadata::new("Synthetic").with_creator("Bench");

    let body = "Lorem ipsum dolor sit amet, *consectetur* adipiscing elit.\n\n".repeat(40);
    for i in 0..CHAPTERS {
        book.add_chapter(format!("chapter{i:03}"), body.clone());
    }

    for part in 0..CHAPTERS / 10 {
        let first = part * 10;
        let mut entry = TocEntry::new(format!("Part {part}"), format!("Text/chapter{first:03}.xhtml"));
        for i in first + 1..first + 9 {
            entry = entry.with_child(TocEntry::new(
                format!("Section {i}: A Title"),
                format!("Text/chapter{i:03}.xhtml#s{i}"),
            ));
        }
        book.toc.push(entry);
    }

    book
}

// ============================================================================
// Assembly Benchmarks
// ============================================================================

fn bench_chapter_index(c: &mut Criterion) {
    let book = synthetic_book();
    let labels = Labels::default();
    c.bench_function("chapter_index", |b| {
        b.iter(|| ChapterIndex::build(black_box(&book), &labels));
    });
}

fn bench_single_document(c: &mut Criterion) {
    let book = synthetic_book();
    let labels = Labels::default();
    let index = ChapterIndex::build(&book, &labels);

    c.bench_function("assemble_single_document", |b| {
        b.iter(|| {
            let toc = resolve_toc(&book, &index, LinkMode::Anchor);
            assemble_single_document(black_box(&book), &index, &toc, true, &labels)
        });
    });
}

fn bench_multi_document(c: &mut Criterion) {
    let book = synthetic_book();
    let labels = Labels::default();
    let index = ChapterIndex::build(&book, &labels);

    c.bench_function("assemble_multi_document", |b| {
        b.iter(|| {
            let toc = resolve_toc(&book, &index, LinkMode::File);
            assemble_multi_document(black_box(&book), &index, &toc, true, &labels)
        });
    });
}

// ============================================================================
// Transform Benchmarks
// ============================================================================

fn bench_html_to_markdown(c: &mut Criterion) {
    let paragraph = "<p>Some <em>emphasis</em>, a <a href=\"ch2.xhtml\">link</a> and \
                     <strong>bold</strong> text with an <code>inline_code</code> span.</p>\n";
    let html = format!(
        "<html><head><title>T</title></head><body><h1>Title</h1>{}<ul><li>One</li><li>Two</li></ul></body></html>",
        paragraph.repeat(200)
    );

    c.bench_function("html_to_markdown", |b| {
        b.iter(|| html_to_markdown(black_box(&html)));
    });
}

criterion_group!(
    benches,
    bench_chapter_index,
    bench_single_document,
    bench_multi_document,
    bench_html_to_markdown,
);
criterion_main!(benches);
