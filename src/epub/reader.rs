use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use log::{debug, warn};
use zip::ZipArchive;

use super::parser::{ManifestItem, OpfData, parse_container_xml, parse_nav, parse_ncx, parse_opf};
use crate::error::{Error, Result};
use crate::model::{BookModel, TocEntry};
use crate::transform::{DocumentContext, convert_document};
use crate::util::{basename, decode_text, dirname, extract_xml_encoding, resolve_path, strip_bom};

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Read an EPUB file from disk into a [`BookModel`].
///
/// Supports EPUB 2 and EPUB 3. Every XHTML document in the manifest is
/// converted to Markdown; every image is loaded as raw bytes.
///
/// # Example
///
/// ```no_run
/// use epubmd::read_epub;
///
/// let book = read_epub("path/to/book.epub")?;
/// println!("Title: {:?}", book.metadata.title);
/// # Ok::<(), epubmd::Error>(())
/// ```
pub fn read_epub<P: AsRef<Path>>(path: P) -> Result<BookModel> {
    let file = std::fs::File::open(path)?;
    read_epub_from_reader(file)
}

/// Read an EPUB from any [`Read`] + [`Seek`] source.
///
/// # Example
///
/// ```no_run
/// use std::io::Cursor;
/// use epubmd::epub::read_epub_from_reader;
///
/// let epub_data: Vec<u8> = std::fs::read("book.epub")?;
/// let book = read_epub_from_reader(Cursor::new(epub_data))?;
/// # Ok::<(), epubmd::Error>(())
/// ```
pub fn read_epub_from_reader<R: Read + Seek>(reader: R) -> Result<BookModel> {
    let mut archive = ZipArchive::new(reader)?;

    // 1. Locate and parse the package document
    let container = match read_archive_file_bytes(&mut archive, CONTAINER_PATH) {
        Err(Error::Zip(zip::result::ZipError::FileNotFound)) => {
            return Err(Error::InvalidEpub(format!("missing {CONTAINER_PATH}")));
        }
        other => other?,
    };
    let opf_path = parse_container_xml(&container)?;
    let opf_dir = dirname(&opf_path).to_string();

    let opf_content = read_archive_text(&mut archive, &opf_path)?;
    let OpfData {
        metadata,
        manifest,
        spine_ids,
        ncx_href,
        nav_href,
    } = parse_opf(&opf_content)?;

    let mut book = BookModel::new();
    book.metadata = metadata;

    // 2. Images, so content documents can point at their ids
    let mut image_ids: HashMap<String, String> = HashMap::new();
    for (id, item) in manifest.iter().filter(|(_, item)| item.is_image()) {
        let full_path = resolve_path(&opf_dir, &item.href);
        match read_archive_file_bytes(&mut archive, &full_path) {
            Ok(data) => {
                book.add_image(id, basename(&item.href), &item.media_type, data);
                image_ids.insert(package_path(&item.href), id.clone());
            }
            Err(e) => warn!("Skipping image {id} ({full_path}): {e}"),
        }
    }

    // 3. Content documents, converted to Markdown
    for (id, item) in manifest.iter().filter(|(_, item)| item.is_document()) {
        match read_content_document(&mut archive, &opf_dir, item, &image_ids) {
            Ok(markdown) => {
                book.content.insert(id.clone(), markdown);
            }
            Err(e) => warn!("Skipping content document {id} ({}): {e}", item.href),
        }
    }

    // 4. Spine
    for id in &spine_ids {
        if !book.content.contains_key(id) {
            debug!("Spine item {id} has no readable content");
        }
    }
    if !spine_ids.iter().any(|id| book.content.contains_key(id)) {
        return Err(Error::EmptyBook(format!(
            "none of the {} spine items could be read",
            spine_ids.len()
        )));
    }
    book.spine = spine_ids;

    // 5. Table of contents: NCX first, EPUB 3 nav as fallback
    book.toc = read_toc(&mut archive, &opf_dir, ncx_href.as_deref(), nav_href.as_deref());

    debug!(
        "Read {} content documents, {} images, {} TOC roots",
        book.content.len(),
        book.images.len(),
        book.toc.len()
    );

    Ok(book)
}

fn read_content_document<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf_dir: &str,
    item: &ManifestItem,
    image_ids: &HashMap<String, String>,
) -> Result<String> {
    let bytes = read_archive_file_bytes(archive, &resolve_path(opf_dir, &item.href))?;
    let hint = extract_xml_encoding(&bytes);
    let text = decode_text(strip_bom(&bytes), hint);

    let doc_path = package_path(&item.href);
    let ctx = DocumentContext {
        base_dir: dirname(&doc_path),
        image_ids: Some(image_ids),
    };
    Ok(convert_document(&text, &ctx))
}

fn read_toc<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf_dir: &str,
    ncx_href: Option<&str>,
    nav_href: Option<&str>,
) -> Vec<TocEntry> {
    if let Some(href) = ncx_href {
        let parsed = read_archive_text(archive, &resolve_path(opf_dir, href))
            .and_then(|content| parse_ncx(&content));
        match parsed {
            Ok(toc) if !toc.is_empty() => return toc,
            Ok(_) => debug!("NCX {href} has no entries"),
            Err(e) => warn!("Could not read NCX {href}: {e}"),
        }
    }

    if let Some(href) = nav_href {
        let parsed = read_archive_text(archive, &resolve_path(opf_dir, href))
            .and_then(|content| parse_nav(&content));
        match parsed {
            Ok(toc) => return toc,
            Err(e) => warn!("Could not read navigation document {href}: {e}"),
        }
    }

    Vec::new()
}

/// Normalized, percent-decoded path relative to the package directory.
fn package_path(href: &str) -> String {
    let decoded = percent_encoding::percent_decode_str(href).decode_utf8_lossy();
    resolve_path("", &decoded)
}

fn read_archive_text<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let bytes = read_archive_file_bytes(archive, path)?;
    let hint = extract_xml_encoding(&bytes);
    Ok(decode_text(strip_bom(&bytes), hint).into_owned())
}

fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    // Try direct lookup first
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    // Fallback: manifest hrefs are URL-encoded, archive names usually are not
    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| Error::InvalidEpub(format!("Invalid UTF-8 in path: {path}")))?;

    let mut file = archive.by_name(&decoded)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}
