//! Pure identifier generation for output file names and heading anchors.
//!
//! Both functions are total: any input, including the empty string or text
//! made only of unsafe characters, yields a (possibly empty) identifier.

/// Maximum length, in characters, of a sanitized file name component.
pub const MAX_FILE_NAME_CHARS: usize = 50;

/// Characters that may not appear in a generated file name.
const UNSAFE_FILE_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', ' '];

/// Turn a chapter title into a file-system-safe file name component.
///
/// Each unsafe character (`/ \ : * ? " < > |` and space) becomes `_`, runs of
/// `_` collapse to one, leading and trailing `_` are stripped, and the result
/// is cut to [`MAX_FILE_NAME_CHARS`] characters. The cut may land mid-word.
///
/// # Examples
///
/// ```
/// use epubmd::markdown::sanitize_file_name_component;
///
/// assert_eq!(sanitize_file_name_component("Chapter 1: Intro"), "Chapter_1_Intro");
/// assert_eq!(sanitize_file_name_component("???"), "");
/// ```
pub fn sanitize_file_name_component(title: &str) -> String {
    let mut collapsed = String::with_capacity(title.len());
    for c in title.chars() {
        let c = if UNSAFE_FILE_NAME_CHARS.contains(&c) {
            '_'
        } else {
            c
        };
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }

    let truncated: String = collapsed
        .trim_matches('_')
        .chars()
        .take(MAX_FILE_NAME_CHARS)
        .collect();

    // A cut right after an underscore would leave it dangling.
    truncated.trim_end_matches('_').to_string()
}

/// Generate an in-document anchor id from heading text.
///
/// Lowercases, drops everything except letters, digits, `_`, `-` and
/// whitespace, turns whitespace runs into `-`, collapses `-` runs and strips
/// leading/trailing `-`. Letters include non-ASCII scripts, so CJK titles
/// keep their characters. Applying it twice gives the same result as once.
///
/// # Examples
///
/// ```
/// use epubmd::markdown::make_anchor_id;
///
/// assert_eq!(make_anchor_id("Chapter One"), "chapter-one");
/// assert_eq!(make_anchor_id("Hello, World!"), "hello-world");
/// assert_eq!(make_anchor_id("第一章 开始"), "第一章-开始");
/// ```
pub fn make_anchor_id(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut result = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            if !result.is_empty() && !result.ends_with('-') {
                result.push('-');
            }
        } else if c.is_alphanumeric() || c == '_' {
            result.push(c);
        }
    }

    result.trim_end_matches('-').to_string()
}
