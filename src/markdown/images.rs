//! Rewriting of image link targets to materialized file paths.

use std::collections::BTreeMap;

use crate::util::basename;

/// Directory, relative to the output root, that holds materialized images.
pub const IMAGE_DIR: &str = "images";

/// Point image references in `text` at their materialized files.
///
/// For each image id (in map order) the literal link targets `({id})` and
/// `({basename of id})` become `(images/{final_name})`. Images are processed
/// independently; once a substring has been rewritten, later images cannot
/// match it again.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use epubmd::markdown::rewrite_image_refs;
///
/// let images = BTreeMap::from([("img001".to_string(), "pic_1.png".to_string())]);
/// assert_eq!(rewrite_image_refs("![x](img001)", &images), "![x](images/pic_1.png)");
/// ```
pub fn rewrite_image_refs(text: &str, images: &BTreeMap<String, String>) -> String {
    let mut result = text.to_string();

    for (image_id, final_name) in images {
        let target = format!("({IMAGE_DIR}/{final_name})");

        let raw = format!("({image_id})");
        if result.contains(&raw) {
            result = result.replace(&raw, &target);
        }

        let short = basename(image_id);
        if short != image_id && !short.is_empty() {
            let short = format!("({short})");
            if result.contains(&short) {
                result = result.replace(&short, &target);
            }
        }
    }

    result
}
