//! Materialization of embedded images next to the Markdown output.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::markdown::{IMAGE_DIR, sanitize_file_name_component};
use crate::model::BookModel;

/// Write every image of `book` under `{root}/images/`.
///
/// Images are written in id order under their declared file name. A name
/// that is already taken, by an earlier image of this run or by a file left
/// on disk, becomes `{stem}_{imageId}{.ext}` instead, then
/// `{stem}_{imageId}_{k}{.ext}` for k = 2, 3, ... until a free name is found.
/// Returns image id -> final file name; the first write error aborts.
pub fn materialize_images(book: &BookModel, root: &Path) -> Result<BTreeMap<String, String>> {
    let mut written = BTreeMap::new();
    if book.images.is_empty() {
        return Ok(written);
    }

    let image_dir = root.join(IMAGE_DIR);
    fs::create_dir_all(&image_dir)?;

    let mut taken: HashSet<String> = HashSet::new();
    for (image_id, asset) in &book.images {
        let is_free = |name: &str| {
            !name.is_empty() && !taken.contains(name) && !image_dir.join(name).exists()
        };

        let mut file_name = asset.file_name.clone();
        let mut attempt = 1;
        while !is_free(&file_name) {
            file_name = disambiguate(&asset.file_name, image_id, attempt);
            attempt += 1;
        }
        if file_name != asset.file_name {
            debug!("Image name {:?} taken, using {file_name}", asset.file_name);
        }

        fs::write(image_dir.join(&file_name), &asset.data)?;
        taken.insert(file_name.clone());
        written.insert(image_id.clone(), file_name);
    }

    Ok(written)
}

/// `cover.jpg` + `img7` -> `cover_img7.jpg` on the first attempt,
/// `cover_img7_2.jpg` on the second.
fn disambiguate(file_name: &str, image_id: &str, attempt: usize) -> String {
    let mut id = sanitize_file_name_component(image_id);
    if attempt > 1 {
        id = format!("{id}_{attempt}");
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{id}.{ext}"),
        _ => format!("{file_name}_{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_images(images: &[(&str, &str, &[u8])]) -> BookModel {
        let mut book = BookModel::new();
        for (id, name, data) in images {
            book.add_image(*id, *name, "image/png", data.to_vec());
        }
        book
    }

    #[test]
    fn test_disambiguate() {
        assert_eq!(disambiguate("cover.jpg", "img7", 1), "cover_img7.jpg");
        assert_eq!(disambiguate("cover.jpg", "img7", 2), "cover_img7_2.jpg");
        assert_eq!(disambiguate("archive.tar.gz", "x", 1), "archive.tar_x.gz");
        assert_eq!(disambiguate("README", "x", 1), "README_x");
        assert_eq!(disambiguate(".hidden", "x", 1), ".hidden_x");
    }

    #[test]
    fn test_materialize_writes_declared_names() {
        let dir = tempfile::tempdir().unwrap();
        let book = book_with_images(&[("img1", "one.png", b"1"), ("img2", "two.png", b"2")]);

        let names = materialize_images(&book, dir.path()).unwrap();

        assert_eq!(names["img1"], "one.png");
        assert_eq!(names["img2"], "two.png");
        assert_eq!(fs::read(dir.path().join("images/one.png")).unwrap(), b"1");
        assert_eq!(fs::read(dir.path().join("images/two.png")).unwrap(), b"2");
    }

    #[test]
    fn test_materialize_collision_within_run() {
        let dir = tempfile::tempdir().unwrap();
        let book = book_with_images(&[("a", "pic.png", b"A"), ("b", "pic.png", b"B")]);

        let names = materialize_images(&book, dir.path()).unwrap();

        assert_eq!(names["a"], "pic.png");
        assert_eq!(names["b"], "pic_b.png");
        assert_eq!(fs::read(dir.path().join("images/pic.png")).unwrap(), b"A");
        assert_eq!(fs::read(dir.path().join("images/pic_b.png")).unwrap(), b"B");
    }

    #[test]
    fn test_materialize_collision_with_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/pic.png"), b"old").unwrap();
        let book = book_with_images(&[("a", "pic.png", b"new")]);

        let names = materialize_images(&book, dir.path()).unwrap();

        assert_eq!(names["a"], "pic_a.png");
        assert_eq!(fs::read(dir.path().join("images/pic.png")).unwrap(), b"old");
    }

    #[test]
    fn test_materialize_fallback_name_already_taken() {
        let dir = tempfile::tempdir().unwrap();
        let book = book_with_images(&[
            ("a", "pic.png", b"A"),
            ("b", "pic_c.png", b"B"),
            ("c", "pic.png", b"C"),
        ]);

        let names = materialize_images(&book, dir.path()).unwrap();

        assert_eq!(names["a"], "pic.png");
        assert_eq!(names["b"], "pic_c.png");
        assert_eq!(names["c"], "pic_c_2.png");
        assert_eq!(fs::read(dir.path().join("images/pic_c.png")).unwrap(), b"B");
        assert_eq!(fs::read(dir.path().join("images/pic_c_2.png")).unwrap(), b"C");
    }

    #[test]
    fn test_materialize_empty_name_gets_id() {
        let dir = tempfile::tempdir().unwrap();
        let book = book_with_images(&[("img1", "", b"1")]);

        let names = materialize_images(&book, dir.path()).unwrap();

        assert_eq!(names["img1"], "_img1");
        assert_eq!(fs::read(dir.path().join("images/_img1")).unwrap(), b"1");
    }

    #[test]
    fn test_no_images_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let names = materialize_images(&BookModel::new(), dir.path()).unwrap();
        assert!(names.is_empty());
        assert!(!dir.path().join("images").exists());
    }
}
