//! epubmd - EPUB to Markdown converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use epubmd::markdown::{ChapterIndex, Labels};
use epubmd::{BookModel, Error, Exporter, Layout, MarkdownConfig, MarkdownExporter, read_epub};

#[derive(Parser)]
#[command(name = "epubmd")]
#[command(version, about = "Convert EPUB ebooks to linked Markdown", long_about = None)]
#[command(after_help = "EXAMPLES:
    epubmd book.epub                 Write book/README.md and one file per chapter
    epubmd book.epub --single-file   Write book.md with in-page links
    epubmd -i book.epub              Show book metadata")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (or file with --single-file) [default: derived from INPUT]
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Write the whole book as one Markdown file
    #[arg(long)]
    single_file: bool,

    /// Omit the table of contents
    #[arg(long)]
    no_toc: bool,

    /// Language of generated labels [default: from book metadata, else en]
    #[arg(long, value_enum)]
    lang: Option<Lang>,

    /// JSON file with custom labels (overrides --lang)
    #[arg(long, value_name = "FILE")]
    labels: Option<PathBuf>,

    /// Print the chapter index as JSON instead of writing files
    #[arg(long)]
    dump_index: bool,

    /// Show book metadata without converting
    #[arg(short, long)]
    info: bool,

    /// Log debug detail
    #[arg(short, long)]
    verbose: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Lang {
    En,
    Zh,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let book = read_epub(&cli.input)?;

    if cli.info {
        show_info(&cli.input, &book);
        return Ok(());
    }

    let labels = load_labels(cli, &book)?;

    if cli.dump_index {
        let index = ChapterIndex::build(&book, &labels);
        let json = serde_json::to_string_pretty(&index).map_err(std::io::Error::from)?;
        println!("{json}");
        return Ok(());
    }

    let layout = if cli.single_file {
        Layout::SingleFile
    } else {
        Layout::MultiFile
    };
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input, layout));

    let config = MarkdownConfig::new()
        .with_layout(layout)
        .with_toc(!cli.no_toc)
        .with_labels(labels);
    let summary = MarkdownExporter::with_config(config).export(&book, &output)?;

    if !cli.quiet {
        println!(
            "Converted {} -> {} ({} chapters, {} images)",
            cli.input.display(),
            output.display(),
            summary.chapters,
            summary.images
        );
    }

    Ok(())
}

fn load_labels(cli: &Cli, book: &BookModel) -> Result<Labels, Error> {
    if let Some(path) = &cli.labels {
        let text = std::fs::read_to_string(path)?;
        return serde_json::from_str(&text)
            .map_err(|e| Error::Labels(format!("{}: {e}", path.display())));
    }

    Ok(match cli.lang {
        Some(Lang::En) => Labels::english(),
        Some(Lang::Zh) => Labels::chinese(),
        None => book
            .metadata
            .language
            .as_deref()
            .and_then(Labels::for_language)
            .unwrap_or_default(),
    })
}

/// `dir/book.epub` -> `dir/book.md` or `dir/book/`.
fn default_output(input: &Path, layout: Layout) -> PathBuf {
    match layout {
        Layout::SingleFile => input.with_extension("md"),
        Layout::MultiFile => input.with_extension(""),
    }
}

fn show_info(path: &Path, book: &BookModel) {
    let meta = &book.metadata;
    println!("File: {}", path.display());
    let fields = [
        ("Title", &meta.title),
        ("Author", &meta.creator),
        ("Language", &meta.language),
        ("Publisher", &meta.publisher),
        ("Date", &meta.date),
        ("Identifier", &meta.identifier),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{label}: {value}");
        }
    }
    println!("Chapters: {}", book.chapter_count());
    println!("TOC entries: {}", book.toc_entries().count());
    println!("Images: {}", book.images.len());
}
