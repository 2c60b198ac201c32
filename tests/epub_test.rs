//! Reading in-memory EPUB archives and converting them end to end.

use std::fs;
use std::io::{Cursor, Write};

use epubmd::epub::read_epub_from_reader;
use epubmd::{Error, Exporter, Layout, MarkdownConfig, MarkdownExporter, read_epub};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Test Book</dc:title>
    <dc:creator>Test Author</dc:creator>
    <dc:language>en</dc:language>
    <dc:identifier id="uid">urn:uuid:1234</dc:identifier>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="cover" href="Text/cover.xhtml" media-type="application/xhtml+xml"/>
    <item id="chapter1" href="Text/chapter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="chapter2" href="Text/chapter2.xhtml" media-type="application/xhtml+xml"/>
    <item id="fig" href="Images/figure.png" media-type="image/png"/>
    <item id="gone" href="Images/missing.png" media-type="image/png"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="cover"/>
    <itemref idref="chapter1"/>
    <itemref idref="chapter2"/>
  </spine>
</package>"#;

const NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <navMap>
    <navPoint id="np1" playOrder="1">
      <navLabel><text>The Beginning</text></navLabel>
      <content src="Text/chapter1.xhtml"/>
    </navPoint>
    <navPoint id="np2" playOrder="2">
      <navLabel><text>The End</text></navLabel>
      <content src="Text/chapter2.xhtml#top"/>
    </navPoint>
  </navMap>
</ncx>"#;

const COVER: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p>Cover</p></body></html>"#;

const CHAPTER1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter 1</title></head>
<body>
  <h1>The Beginning</h1>
  <p>It was a <em>dark</em> night.</p>
  <p><img src="../Images/figure.png" alt="A figure"/></p>
</body>
</html>"#;

const CHAPTER2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
  <h1 id="top">The End</h1>
  <ul><li>First</li><li>Second</li></ul>
</body>
</html>"#;

fn build_epub(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn test_epub() -> Vec<u8> {
    build_epub(&[
        ("mimetype", "application/epub+zip".as_bytes()),
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", OPF.as_bytes()),
        ("OEBPS/toc.ncx", NCX.as_bytes()),
        ("OEBPS/Text/cover.xhtml", COVER.as_bytes()),
        ("OEBPS/Text/chapter1.xhtml", CHAPTER1.as_bytes()),
        ("OEBPS/Text/chapter2.xhtml", CHAPTER2.as_bytes()),
        ("OEBPS/Images/figure.png", &b"\x89PNG\r\n"[..]),
    ])
}

#[test]
fn test_read_epub_structure() {
    let book = read_epub_from_reader(Cursor::new(test_epub())).expect("Failed to read EPUB");

    assert_eq!(book.metadata.title.as_deref(), Some("Test Book"));
    assert_eq!(book.metadata.creator.as_deref(), Some("Test Author"));
    assert_eq!(book.metadata.language.as_deref(), Some("en"));
    assert_eq!(book.metadata.publisher, None);

    assert_eq!(book.spine, vec!["cover", "chapter1", "chapter2"]);
    assert_eq!(book.toc.len(), 2);
    assert_eq!(book.toc[1].href, "Text/chapter2.xhtml#top");

    // Missing archive entries are skipped
    assert_eq!(book.images.len(), 1);
    assert_eq!(book.images["fig"].file_name, "figure.png");

    assert_eq!(
        book.content["chapter1"],
        "# The Beginning\n\nIt was a *dark* night.\n\n![A figure](fig)"
    );
    assert_eq!(book.content["chapter2"], "# The End\n\n- First\n- Second");
}

#[test]
fn test_read_epub_from_disk_and_convert() {
    let dir = TempDir::new().unwrap();
    let epub_path = dir.path().join("book.epub");
    fs::write(&epub_path, test_epub()).unwrap();

    let book = read_epub(&epub_path).unwrap();
    let out = dir.path().join("book");
    let summary = MarkdownExporter::new().export(&book, &out).unwrap();

    assert_eq!(summary.chapters, 3);
    assert_eq!(summary.images, 1);

    let readme = fs::read_to_string(out.join("README.md")).unwrap();
    assert!(readme.starts_with("# Test Book\n\nAuthor: Test Author\n\nLanguage: en\n"));
    assert!(readme.contains("- [The Beginning](02-The_Beginning.md)"));
    assert!(readme.contains("- [The End](03-The_End.md)"));

    let cover = fs::read_to_string(out.join("01-Chapter_1.md")).unwrap();
    assert!(cover.contains("[The Beginning →](02-The_Beginning.md)"));

    let chapter = fs::read_to_string(out.join("02-The_Beginning.md")).unwrap();
    assert!(chapter.contains("![A figure](images/figure.png)"));
    assert!(chapter.contains("[← Chapter 1](01-Chapter_1.md)"));
    assert!(chapter.contains("[The End →](03-The_End.md)"));
    assert!(out.join("images/figure.png").exists());
}

#[test]
fn test_convert_single_file() {
    let dir = TempDir::new().unwrap();
    let book = read_epub_from_reader(Cursor::new(test_epub())).unwrap();
    let out = dir.path().join("book.md");

    let config = MarkdownConfig::new().with_layout(Layout::SingleFile);
    MarkdownExporter::with_config(config).export(&book, &out).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("- [The End](#the-end)"));
    assert!(text.contains("<a id=\"the-end\"></a>\n\n# The End\n\n# The End"));
    assert!(text.contains("![A figure](images/figure.png)"));
    assert!(dir.path().join("images/figure.png").exists());
}

#[test]
fn test_epub3_nav_fallback() {
    let opf = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Nav Book</dc:title></metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="c1"/></spine>
</package>"#;
    let nav = r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body><nav epub:type="toc"><ol><li><a href="c1.xhtml">Only Chapter</a></li></ol></nav></body></html>"#;

    let data = build_epub(&[
        ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ("OEBPS/content.opf", opf.as_bytes()),
        ("OEBPS/nav.xhtml", nav.as_bytes()),
        ("OEBPS/c1.xhtml", "<html><body><p>Text</p></body></html>".as_bytes()),
    ]);

    let book = read_epub_from_reader(Cursor::new(data)).unwrap();
    assert_eq!(book.toc.len(), 1);
    assert_eq!(book.toc[0].title, "Only Chapter");
    assert_eq!(book.spine, vec!["c1"]);
}

#[test]
fn test_not_a_zip() {
    let result = read_epub_from_reader(Cursor::new(b"definitely not a zip".to_vec()));
    assert!(matches!(result, Err(Error::Zip(_))));
}
