//! EPUB parsing utilities (container.xml, OPF, NCX, EPUB 3 nav)

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::model::{Metadata, TocEntry};
use crate::util::{local_name, resolve_entity, strip_bom, unescape};

/// Parsed OPF package data.
#[derive(Debug, Default)]
pub struct OpfData {
    pub metadata: Metadata,
    /// Manifest id -> item.
    pub manifest: BTreeMap<String, ManifestItem>,
    /// `idref`s of the spine, in reading order.
    pub spine_ids: Vec<String>,
    /// Href of the NCX named by `<spine toc="...">`.
    pub ncx_href: Option<String>,
    /// Href of the EPUB 3 navigation document (`properties="nav"`).
    pub nav_href: Option<String>,
}

/// A `<manifest>` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// Href relative to the OPF directory.
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    pub fn is_document(&self) -> bool {
        matches!(
            self.media_type.as_str(),
            "application/xhtml+xml" | "text/html" | "application/xml"
        ) || self.href.ends_with(".xhtml")
            || self.href.ends_with(".html")
            || self.href.ends_with(".htm")
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == property))
    }
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = String::from_utf8(strip_bom(bytes).to_vec())?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attr_value(&e, b"full-path") {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::InvalidEpub(
        "No rootfile found in container.xml".into(),
    ))
}

/// Parse the OPF package document.
///
/// Only the first occurrence of each Dublin Core field is kept; blank values
/// count as absent.
pub fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);

    let mut opf = OpfData::default();
    let mut toc_id: Option<String> = None;

    let mut in_metadata = false;
    let mut current_element: Option<Vec<u8>> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"metadata" => in_metadata = true,
                    b"title" | b"creator" | b"language" | b"identifier" | b"publisher"
                    | b"date"
                        if in_metadata =>
                    {
                        current_element = Some(local.to_vec());
                        buf_text.clear();
                    }
                    b"spine" => toc_id = attr_value(&e, b"toc"),
                    b"item" => add_manifest_item(&mut opf, &e),
                    b"itemref" => add_itemref(&mut opf, &e),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"item" => add_manifest_item(&mut opf, &e),
                    b"itemref" => add_itemref(&mut opf, &e),
                    b"spine" => toc_id = attr_value(&e, b"toc"),
                    _ => {}
                }
            }
            Event::Text(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if current_element.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push_str(&resolved);
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if local == b"metadata" {
                    in_metadata = false;
                }

                if let Some(elem) = current_element.take_if(|elem| elem.as_slice() == local) {
                    let value = buf_text.trim();
                    if !value.is_empty() {
                        let slot = match elem.as_slice() {
                            b"title" => &mut opf.metadata.title,
                            b"creator" => &mut opf.metadata.creator,
                            b"language" => &mut opf.metadata.language,
                            b"identifier" => &mut opf.metadata.identifier,
                            b"publisher" => &mut opf.metadata.publisher,
                            _ => &mut opf.metadata.date,
                        };
                        slot.get_or_insert_with(|| value.to_string());
                    }
                    buf_text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    opf.ncx_href = toc_id
        .and_then(|id| opf.manifest.get(&id))
        .map(|item| item.href.clone())
        .or_else(|| {
            opf.manifest
                .values()
                .find(|item| item.media_type == "application/x-dtbncx+xml")
                .map(|item| item.href.clone())
        });
    opf.nav_href = opf
        .manifest
        .values()
        .find(|item| item.has_property("nav"))
        .map(|item| item.href.clone());

    Ok(opf)
}

fn add_manifest_item(opf: &mut OpfData, e: &BytesStart<'_>) {
    let Some(id) = attr_value(e, b"id").filter(|id| !id.is_empty()) else {
        return;
    };
    opf.manifest.insert(
        id,
        ManifestItem {
            href: attr_value(e, b"href").unwrap_or_default(),
            media_type: attr_value(e, b"media-type").unwrap_or_default(),
            properties: attr_value(e, b"properties"),
        },
    );
}

fn add_itemref(opf: &mut OpfData, e: &BytesStart<'_>) {
    if let Some(idref) = attr_value(e, b"idref") {
        opf.spine_ids.push(idref);
    }
}

/// Parse an NCX table of contents into a leveled forest.
pub fn parse_ncx(content: &str) -> Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(content);

    struct NavPointState {
        children: Vec<TocEntry>,
        text: String,
        src: Option<String>,
    }

    let mut stack: Vec<NavPointState> = vec![NavPointState {
        children: Vec::new(),
        text: String::new(),
        src: None,
    }];
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"navPoint" => stack.push(NavPointState {
                    children: Vec::new(),
                    text: String::new(),
                    src: None,
                }),
                b"text" => in_text = true,
                b"content" => {
                    if let Some(state) = stack.last_mut() {
                        state.src = attr_value(&e, b"src");
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if local_name(e.name().as_ref()) == b"content"
                    && let Some(state) = stack.last_mut()
                {
                    state.src = attr_value(&e, b"src");
                }
            }
            Event::Text(e) => {
                if in_text && let Some(state) = stack.last_mut() {
                    state.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        state.text.push_str(&resolved);
                    }
                }
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"text" => in_text = false,
                b"navPoint" if stack.len() > 1 => {
                    if let Some(state) = stack.pop()
                        && let Some(src) = state.src
                    {
                        let mut entry = TocEntry::new(collapse_whitespace(&state.text), src);
                        entry.children = state.children;

                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(entry);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let mut roots = stack.swap_remove(0).children;
    for entry in &mut roots {
        entry.set_level(0);
    }
    Ok(roots)
}

/// Parse the `toc` navigation of an EPUB 3 navigation document.
///
/// Entries come from the nested `ol > li > a` lists inside
/// `<nav epub:type="toc">`; the nesting depth becomes the entry level. List
/// items whose label is a `<span>` rather than a link keep an empty href.
pub fn parse_nav(content: &str) -> Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(content);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    struct ItemState {
        children: Vec<TocEntry>,
        text: String,
        href: Option<String>,
    }

    let mut stack: Vec<ItemState> = vec![ItemState {
        children: Vec::new(),
        text: String::new(),
        href: None,
    }];
    // Depth of nested <nav> elements once inside the toc nav.
    let mut nav_depth = 0usize;
    let mut label_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if nav_depth == 0 {
                    if local == b"nav" && is_toc_nav(&e) {
                        nav_depth = 1;
                    }
                    continue;
                }
                match local {
                    b"nav" => nav_depth += 1,
                    b"li" => stack.push(ItemState {
                        children: Vec::new(),
                        text: String::new(),
                        href: None,
                    }),
                    b"a" | b"span" if stack.len() > 1 => {
                        if label_depth == 0
                            && local == b"a"
                            && let Some(state) = stack.last_mut()
                        {
                            state.href = attr_value(&e, b"href");
                        }
                        label_depth += 1;
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if label_depth > 0 && let Some(state) = stack.last_mut() {
                    state.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if label_depth > 0 && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        state.text.push_str(&resolved);
                    }
                }
            }
            Event::End(e) => {
                if nav_depth == 0 {
                    continue;
                }
                match local_name(e.name().as_ref()) {
                    b"nav" => {
                        nav_depth -= 1;
                        if nav_depth == 0 {
                            break;
                        }
                    }
                    b"a" | b"span" => label_depth = label_depth.saturating_sub(1),
                    b"li" if stack.len() > 1 => {
                        label_depth = 0;
                        if let Some(state) = stack.pop() {
                            let title = collapse_whitespace(&state.text);
                            if !title.is_empty() || state.href.is_some() {
                                let mut entry =
                                    TocEntry::new(title, state.href.unwrap_or_default());
                                entry.children = state.children;
                                if let Some(parent) = stack.last_mut() {
                                    parent.children.push(entry);
                                }
                            } else if let Some(parent) = stack.last_mut() {
                                parent.children.extend(state.children);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut roots = stack.swap_remove(0).children;
    for entry in &mut roots {
        entry.set_level(0);
    }
    Ok(roots)
}

fn is_toc_nav(e: &BytesStart<'_>) -> bool {
    e.attributes().flatten().any(|attr| {
        local_name(attr.key.as_ref()) == b"type"
            && attr_text(&attr).split_ascii_whitespace().any(|t| t == "toc")
    })
}

/// Read an attribute by local name, resolving entity references.
fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == name)
        .map(|attr| attr_text(&attr))
}

fn attr_text(attr: &Attribute<'_>) -> String {
    unescape(&String::from_utf8_lossy(&attr.value))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
