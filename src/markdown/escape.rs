//! Pure markdown escaping utilities.
//!
//! Used by the XHTML transform for running text and by the assembler for
//! link labels built from chapter titles.

/// Escape text so it renders literally in Markdown.
///
/// Always escaped: `\`, `*`, `` ` ``, `[`, `]`, `<`, `>`, `|`.
/// `_` is escaped only at word boundaries (intraword underscores never start
/// emphasis). At the start of a line, `#`, `+`, `-` and an ordered-list
/// marker (`1.`) are escaped so text cannot turn into a block construct.
///
/// # Examples
///
/// ```
/// use epubmd::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
/// assert_eq!(escape_markdown("snake_case"), "snake_case");
/// assert_eq!(escape_markdown("1. not a list"), "1\\. not a list");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    let mut line_start = true;

    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();

        let escape = match c {
            '\\' | '*' | '`' | '[' | ']' | '<' | '>' | '|' => true,
            '_' => {
                let inside_word = prev.is_some_and(char::is_alphanumeric)
                    && next.is_some_and(char::is_alphanumeric);
                !inside_word
            }
            '#' | '+' | '-' => line_start && (next.is_none() || next == Some(' ') || c == '#'),
            '.' | ')' => {
                // "12. " at the start of a line would open an ordered list.
                let digits_before = chars[..i]
                    .iter()
                    .rev()
                    .take_while(|d| d.is_ascii_digit())
                    .count();
                digits_before > 0
                    && digits_before == line_prefix_len(&chars[..i])
                    && (next.is_none() || next == Some(' '))
            }
            _ => false,
        };

        if escape {
            result.push('\\');
        }
        result.push(c);

        if c == '\n' {
            line_start = true;
        } else if !(line_start && c == ' ') {
            line_start = false;
        }
    }

    result
}

/// Number of characters since the last newline.
fn line_prefix_len(chars: &[char]) -> usize {
    chars.iter().rev().take_while(|&&c| c != '\n').count()
}

/// Escape the brackets that would end a Markdown link label early.
///
/// ```
/// use epubmd::markdown::escape_link_text;
///
/// assert_eq!(escape_link_text("Part [1]"), "Part \\[1\\]");
/// ```
pub fn escape_link_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Smallest run of `fence_char` (at least 3) that does not occur in `content`.
pub fn calculate_fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

/// Smallest run of backticks (at least 1) that does not occur in `content`.
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

fn longest_run(content: &str, target: char) -> usize {
    content
        .split(|c| c != target)
        .map(|run| run.chars().count())
        .max()
        .unwrap_or(0)
}
