//! Table-of-contents forest.

/// A table of contents entry (hierarchical).
///
/// `level` is the nesting depth (roots are level 0); a child's level is
/// always its parent's level plus one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    /// Container-internal href, possibly with a `#fragment`.
    pub href: String,
    pub level: usize,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    /// Create a root-level entry.
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            level: 0,
            children: Vec::new(),
        }
    }

    /// Append a child, re-levelling its whole subtree below this entry.
    pub fn with_child(mut self, mut child: TocEntry) -> Self {
        child.set_level(self.level + 1);
        self.children.push(child);
        self
    }

    /// Set this entry's level and renumber its descendants to match.
    pub fn set_level(&mut self, level: usize) {
        self.level = level;
        for child in &mut self.children {
            child.set_level(level + 1);
        }
    }
}

/// Pre-order, depth-first iterator over a TOC forest.
///
/// Yields parents before their children, siblings in document order.
pub struct TocIter<'a> {
    stack: Vec<std::slice::Iter<'a, TocEntry>>,
}

impl<'a> TocIter<'a> {
    pub fn new(entries: &'a [TocEntry]) -> Self {
        Self {
            stack: vec![entries.iter()],
        }
    }
}

impl<'a> Iterator for TocIter<'a> {
    type Item = &'a TocEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(entry) => {
                    if !entry.children.is_empty() {
                        self.stack.push(entry.children.iter());
                    }
                    return Some(entry);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
