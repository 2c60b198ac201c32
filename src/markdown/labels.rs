//! Localizable text used in generated Markdown.

/// The fixed strings the assembler writes around book content.
///
/// `chapter_title` is a format string in which `{n}` is replaced by the
/// 1-based chapter number; it names chapters the table of contents does not.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct Labels {
    pub chapter_title: String,
    pub contents: String,
    pub author: String,
    pub publisher: String,
    pub date: String,
    pub language: String,
    pub previous: String,
    pub next: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self::english()
    }
}

impl Labels {
    pub fn english() -> Self {
        Self {
            chapter_title: "Chapter {n}".into(),
            contents: "Contents".into(),
            author: "Author".into(),
            publisher: "Publisher".into(),
            date: "Date".into(),
            language: "Language".into(),
            previous: "Previous".into(),
            next: "Next".into(),
        }
    }

    pub fn chinese() -> Self {
        Self {
            chapter_title: "第{n}章".into(),
            contents: "目录".into(),
            author: "作者".into(),
            publisher: "出版社".into(),
            date: "日期".into(),
            language: "语言".into(),
            previous: "上一章".into(),
            next: "下一章".into(),
        }
    }

    /// Look up a preset by language tag (`en`, `zh`, `zh-CN`, ...).
    pub fn for_language(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next().unwrap_or(tag);
        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Self::english()),
            "zh" => Some(Self::chinese()),
            _ => None,
        }
    }

    /// Title for the `n`th chapter when no TOC entry names it.
    pub fn fallback_title(&self, n: usize) -> String {
        self.chapter_title.replace("{n}", &n.to_string())
    }
}
