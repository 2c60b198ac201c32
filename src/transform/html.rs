//! Streaming XHTML → Markdown conversion.
//!
//! Content documents are walked as `quick_xml` events; block elements are
//! separated by blank lines, list items and block quotes maintain a line
//! prefix, and running text is whitespace-collapsed and escaped. The reader
//! is lenient about end tags so sloppy HTML still produces text.

use std::borrow::Cow;
use std::collections::HashMap;

use log::warn;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::markdown::{calculate_fence_length, calculate_inline_code_ticks, escape_markdown};
use crate::util::{basename, local_name, resolve_entity, resolve_path, strip_fragment, unescape};

/// Where a content document lives, for resolving its image references.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentContext<'a> {
    /// Directory of the document, relative to the package root.
    pub base_dir: &'a str,
    /// Package-relative image href -> image id.
    pub image_ids: Option<&'a HashMap<String, String>>,
}

/// Convert an XHTML fragment or document to Markdown with no image mapping.
///
/// # Examples
///
/// ```
/// use epubmd::transform::html_to_markdown;
///
/// let md = html_to_markdown("<h1>Title</h1><p>Some <em>text</em>.</p>");
/// assert_eq!(md, "# Title\n\nSome *text*.");
/// ```
pub fn html_to_markdown(html: &str) -> String {
    convert_document(html, &DocumentContext::default())
}

/// Convert a content document to Markdown.
///
/// Images whose `src` resolves to a known package href are rewritten to that
/// image's id. Parse errors end the conversion early; the text produced so
/// far is kept.
pub fn convert_document(html: &str, ctx: &DocumentContext<'_>) -> String {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut converter = Converter::new(ctx);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => converter.open(&e, false),
            Ok(Event::Empty(e)) => converter.open(&e, true),
            Ok(Event::End(e)) => {
                let name = element_name(e.name().as_ref());
                converter.close(&name);
            }
            Ok(Event::Text(e)) => {
                let text = String::from_utf8_lossy(e.as_ref());
                converter.text(&text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref());
                converter.text(&text);
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(resolved) = resolve_entity(&entity) {
                    converter.text(&resolved);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Malformed markup at byte {}: {e}", reader.buffer_position());
                break;
            }
            _ => {}
        }
    }

    normalize_blank_lines(&converter.out)
}

/// Trim trailing whitespace on every line, collapse runs of blank lines into
/// one, and drop leading/trailing blank lines.
pub fn normalize_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(line);
    }

    out
}

/// Tracks list context for numbering.
#[derive(Debug, Clone)]
struct ListContext {
    ordered: bool,
    counter: usize,
}

/// An open `<a>`: `Some(href)` when it renders as a link.
type OpenLink = Option<String>;

struct Converter<'a> {
    ctx: &'a DocumentContext<'a>,
    out: String,
    /// Written at the start of every line (quote markers, list indentation).
    line_prefix: String,
    prefix_marks: Vec<usize>,
    list_stack: Vec<ListContext>,
    links: Vec<OpenLink>,
    /// True if the prefix for the current line has not been written yet.
    at_line_start: bool,
    /// True once real content (not just prefix or list marker) is on the line.
    line_has_content: bool,
    /// A list marker was just written; the item's first block continues on it.
    marker_pending: bool,
    /// A blank line is owed before the next block.
    pending_block: bool,
    pending_space: bool,
    suppress_space: bool,
    skip_depth: usize,
    pre: Option<String>,
    inline_code: Option<String>,
    first_cell: bool,
}

impl<'a> Converter<'a> {
    fn new(ctx: &'a DocumentContext<'a>) -> Self {
        Self {
            ctx,
            out: String::new(),
            line_prefix: String::new(),
            prefix_marks: Vec::new(),
            list_stack: Vec::new(),
            links: Vec::new(),
            at_line_start: true,
            line_has_content: false,
            marker_pending: false,
            pending_block: false,
            pending_space: false,
            suppress_space: false,
            skip_depth: 0,
            pre: None,
            inline_code: None,
            first_cell: true,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let name = element_name(e.name().as_ref());

        if self.skip_depth > 0 {
            if !empty && is_skipped(&name) {
                self.skip_depth += 1;
            }
            return;
        }

        match name.as_str() {
            n if is_skipped(n) => {
                if !empty {
                    self.skip_depth = 1;
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = usize::from(name.as_bytes()[1] - b'0');
                self.start_block();
                self.write_inline(&format!("{} ", "#".repeat(level)), true);
                if empty {
                    self.end_block();
                }
            }
            "p" | "div" | "section" | "article" | "header" | "footer" | "aside" | "nav"
            | "main" | "figure" | "figcaption" | "dl" | "dt" | "dd" | "table" | "address"
            | "body" => {
                self.start_block();
                if empty {
                    self.end_block();
                }
            }
            "ul" | "ol" if !empty => {
                self.start_block();
                let start = attribute(e, b"start")
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .unwrap_or(1);
                self.list_stack.push(ListContext {
                    ordered: name == "ol",
                    counter: start.saturating_sub(1),
                });
            }
            "li" if !empty => self.open_list_item(),
            "blockquote" if !empty => {
                self.start_block();
                self.push_prefix("> ");
            }
            "pre" if !empty => {
                self.start_block();
                self.pre = Some(String::new());
            }
            "tr" => {
                self.break_line();
                self.first_cell = true;
            }
            "td" | "th" => {
                if !self.first_cell {
                    self.write_inline(" | ", false);
                }
                self.first_cell = false;
            }
            "br" => self.hard_break(),
            "hr" => {
                self.start_block();
                self.write_inline("---", false);
                self.end_block();
            }
            "img" | "image" => self.image(e),
            "code" | "kbd" | "samp" | "tt" if !empty => {
                if self.pre.is_none() {
                    self.inline_code = Some(String::new());
                }
            }
            "em" | "i" | "cite" | "var" | "dfn" if !empty => self.write_inline("*", true),
            "strong" | "b" if !empty => self.write_inline("**", true),
            "a" if !empty => {
                let href = attribute(e, b"href").filter(|h| !h.is_empty());
                if href.is_some() {
                    self.write_inline("[", true);
                }
                self.links.push(href);
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        if self.skip_depth > 0 {
            if is_skipped(name) {
                self.skip_depth -= 1;
            }
            return;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "div" | "section" | "article"
            | "header" | "footer" | "aside" | "nav" | "main" | "figure" | "figcaption" | "dl"
            | "dt" | "dd" | "table" | "address" | "body" => self.end_block(),
            "ul" | "ol" => {
                self.list_stack.pop();
                self.end_block();
            }
            "li" => {
                self.pop_prefix();
                self.pending_block = false;
                self.marker_pending = false;
            }
            "blockquote" => {
                self.pop_prefix();
                self.end_block();
            }
            "pre" => self.close_pre(),
            "code" | "kbd" | "samp" | "tt" => {
                if let Some(code) = self.inline_code.take() {
                    let code = code.split_whitespace().collect::<Vec<_>>().join(" ");
                    let ticks = "`".repeat(calculate_inline_code_ticks(&code));
                    let spacer = if code.starts_with('`') || code.ends_with('`') {
                        " "
                    } else {
                        ""
                    };
                    self.write_inline(&format!("{ticks}{spacer}{code}{spacer}{ticks}"), false);
                }
            }
            "em" | "i" | "cite" | "var" | "dfn" => self.close_inline("*"),
            "strong" | "b" => self.close_inline("**"),
            "a" => {
                if let Some(Some(href)) = self.links.pop() {
                    self.close_inline(&format!("]({href})"));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, raw: &str) {
        if self.skip_depth > 0 {
            return;
        }
        if let Some(pre) = &mut self.pre {
            pre.push_str(raw);
            return;
        }
        if let Some(code) = &mut self.inline_code {
            code.push_str(raw);
            return;
        }

        // Strip soft hyphens used for hyphenation hints in ebooks
        let text = raw.replace('\u{00AD}', "");
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.is_empty() {
            if !text.is_empty() {
                self.pending_space = true;
            }
            return;
        }

        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        self.write_inline(&escape_markdown(&words.join(" ")), false);
        self.pending_space = text.ends_with(char::is_whitespace);
    }

    fn image(&mut self, e: &BytesStart<'_>) {
        let src = attribute(e, b"src")
            .or_else(|| attribute(e, b"href"))
            .unwrap_or_default();
        let alt = attribute(e, b"alt")
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| basename(strip_fragment(&src)).to_string());
        let target = self.image_target(&src);

        self.write_inline(&format!("![{}]({target})", alt.replace(['[', ']'], "")), false);
    }

    /// The image id for `src` when it names a known image, else `src` itself.
    fn image_target<'s>(&self, src: &'s str) -> Cow<'s, str> {
        let Some(image_ids) = self.ctx.image_ids else {
            return Cow::Borrowed(src);
        };
        let path = strip_fragment(src);
        let decoded = percent_encoding::percent_decode_str(path).decode_utf8_lossy();
        let resolved = resolve_path(self.ctx.base_dir, &decoded);

        match image_ids.get(&resolved) {
            Some(id) => Cow::Owned(id.clone()),
            None => Cow::Borrowed(src),
        }
    }

    fn open_list_item(&mut self) {
        self.break_line();
        self.pending_block = false;

        let marker = match self.list_stack.last_mut() {
            Some(list) => {
                list.counter += 1;
                if list.ordered {
                    format!("{}. ", list.counter)
                } else {
                    "- ".to_string()
                }
            }
            None => "- ".to_string(),
        };

        self.ensure_line_started();
        self.out.push_str(&marker);
        self.push_prefix(&" ".repeat(marker.chars().count()));
        self.marker_pending = true;
        self.line_has_content = false;
        self.pending_space = false;
    }

    fn close_pre(&mut self) {
        let Some(code) = self.pre.take() else {
            return;
        };
        let code = code.trim_matches('\n');
        let fence = "`".repeat(calculate_fence_length(code, '`'));

        self.start_block();
        self.ensure_line_started();
        self.out.push_str(&fence);
        for line in code.lines() {
            self.newline();
            self.ensure_line_started();
            self.out.push_str(line);
        }
        self.newline();
        self.ensure_line_started();
        self.out.push_str(&fence);
        self.line_has_content = true;
        self.end_block();
    }

    /// Write inline content, flushing a pending inter-word space first.
    ///
    /// `opening` markers swallow the whitespace that directly follows them.
    fn write_inline(&mut self, s: &str, opening: bool) {
        if self.pending_space && self.line_has_content && !self.suppress_space {
            self.ensure_line_started();
            self.out.push(' ');
        }
        self.ensure_line_started();
        self.out.push_str(s);
        self.line_has_content = true;
        self.marker_pending = false;
        self.pending_space = false;
        self.suppress_space = opening;
    }

    /// Write a closing marker; a space before it moves after it.
    fn close_inline(&mut self, s: &str) {
        let space = self.pending_space;
        self.ensure_line_started();
        self.out.push_str(s);
        self.line_has_content = true;
        self.suppress_space = false;
        self.pending_space = space;
    }

    fn start_block(&mut self) {
        if self.marker_pending {
            self.pending_block = false;
            return;
        }
        self.break_line();
        if self.pending_block && !self.out.is_empty() {
            self.out.push_str(self.line_prefix.trim_end());
            self.newline();
        }
        self.pending_block = false;
    }

    fn end_block(&mut self) {
        self.pending_block = true;
        self.pending_space = false;
        self.suppress_space = false;
    }

    fn hard_break(&mut self) {
        if self.line_has_content {
            self.out.push('\\');
        }
        self.newline();
        self.pending_space = false;
    }

    fn break_line(&mut self) {
        if !self.at_line_start {
            self.newline();
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
        self.line_has_content = false;
    }

    fn ensure_line_started(&mut self) {
        if self.at_line_start {
            self.out.push_str(&self.line_prefix);
            self.at_line_start = false;
        }
    }

    fn push_prefix(&mut self, prefix: &str) {
        self.prefix_marks.push(self.line_prefix.len());
        self.line_prefix.push_str(prefix);
    }

    fn pop_prefix(&mut self) {
        if let Some(len) = self.prefix_marks.pop() {
            self.line_prefix.truncate(len);
        }
    }
}

fn is_skipped(name: &str) -> bool {
    matches!(name, "head" | "script" | "style" | "title" | "noscript")
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(local_name(raw)).to_ascii_lowercase()
}

/// Read an attribute by local name, resolving entity references.
fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()).eq_ignore_ascii_case(name))
        .map(|attr| unescape(&String::from_utf8_lossy(&attr.value)))
}
