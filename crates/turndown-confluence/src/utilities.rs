//! Utility functions and constants for HTML processing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas",
    "center", "dd", "details", "dir", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "html", "isindex", "li", "main", "menu",
    "nav", "noframes", "noscript", "ol", "output", "p", "pre", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s\u{a0}]+").expect("WHITESPACE_RUN: hardcoded regex is valid")
});

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Collapse every whitespace run (non-breaking spaces included) to a single
/// ASCII space and trim both ends.
pub fn normalize_inline_text(content: &str) -> String {
    WHITESPACE_RUN.replace_all(content, " ").trim().to_string()
}

/// Collapse whitespace runs to one space without trimming. Used for text
/// nodes, where a leading or trailing space separates inline siblings.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").into_owned()
}

/// The link heuristic: non-empty, no whitespace, and an absolute http(s) URL
/// or a site-relative path.
pub fn looks_like_url(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with('/')
}

/// Escape the characters that would otherwise turn prose into markup.
///
/// Underscores are left alone inside words (`snake_case`), where CommonMark
/// never treats them as emphasis.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\\' | '*' | '`' | '[' | ']' => {
                result.push('\\');
                result.push(c);
            }
            '_' => {
                let prev = i.checked_sub(1).and_then(|p| chars.get(p));
                let next = chars.get(i + 1);
                let intraword = prev.is_some_and(|p| p.is_alphanumeric())
                    && next.is_some_and(|n| n.is_alphanumeric());
                if !intraword {
                    result.push('\\');
                }
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Longest run of consecutive `ch` in `text`
pub fn longest_run(text: &str, ch: char) -> usize {
    text.chars()
        .fold((0, 0), |(max, current), c| {
            if c == ch {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0
}

/// Remove trailing whitespace from every line outside fenced code and collapse
/// three or more consecutive newlines to two, then trim the document. Leading
/// spaces on the first line survive so an indented code block stays one.
pub fn post_process(output: &str) -> String {
    let mut processed = String::with_capacity(output.len());
    let mut fence: Option<String> = None;
    let mut blank_run = 0;

    for line in output.trim_matches('\n').split('\n') {
        let trimmed_start = line.trim_start();
        let marker = fence_marker(trimmed_start);

        if let Some(open) = &fence {
            processed.push_str(line);
            processed.push('\n');
            if marker.is_some_and(|m| m.starts_with(open.as_str()) && trimmed_start.trim_end() == m) {
                fence = None;
            }
            continue;
        }

        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        processed.push_str(line);
        processed.push('\n');

        if let Some(m) = marker {
            fence = Some(m.to_string());
        }
    }

    processed.trim_start_matches('\n').trim_end().to_string()
}

/// The backtick or tilde run opening a fenced code block, if `line` starts one
fn fence_marker(line: &str) -> Option<&str> {
    let first = line.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let len = line.chars().take_while(|&c| c == first).count();
    // A backtick fence's info string never holds a backtick; such a line is
    // inline code
    if len < 3 || (first == '`' && line[len..].contains('`')) {
        return None;
    }
    Some(&line[..len])
}
