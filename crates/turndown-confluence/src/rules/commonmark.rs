//! CommonMark (plus GFM tables and strikethrough) fallback rules.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Filter, Rule};
use crate::node::{Node, NodeRef};
use crate::options::{CodeBlockStyle, HeadingStyle};
use crate::utilities::{is_block, longest_run, normalize_inline_text};

/// `data-syntaxhighlighter-params="brush: java; gutter: false"` on Confluence code panels
static BRUSH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|;)\s*brush:\s*([\w+#.-]+)").expect("BRUSH: hardcoded regex is valid")
});

/// Create all CommonMark rules, keyed and in evaluation order
pub fn commonmark_rules() -> Vec<(&'static str, Rule)> {
    vec![
        ("ignored", ignored_rule()),
        ("paragraph", paragraph_rule()),
        ("heading", heading_rule()),
        ("blockquote", blockquote_rule()),
        ("list", list_rule()),
        ("listItem", list_item_rule()),
        ("codeBlock", code_block_rule()),
        ("horizontalRule", horizontal_rule()),
        ("emphasis", emphasis_rule()),
        ("strong", strong_rule()),
        ("strikethrough", strikethrough_rule()),
        ("inlineCode", inline_code_rule()),
        ("tableCaption", table_caption_rule()),
        ("tableCell", table_cell_rule()),
        ("tableRow", table_row_rule()),
        ("tableSection", table_section_rule()),
        ("table", table_rule()),
        ("container", container_rule()),
    ]
}

fn block(content: &str) -> String {
    format!("\n\n{content}\n\n")
}

fn ignored_rule() -> Rule {
    Rule::for_tags(
        &["script", "style", "noscript", "template", "head"],
        |_, _, _| String::new(),
    )
}

fn paragraph_rule() -> Rule {
    Rule::for_tag("p", |_, content, _| {
        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }
        block(content)
    })
}

fn heading_rule() -> Rule {
    Rule::for_tags(&["h1", "h2", "h3", "h4", "h5", "h6"], |node, content, options| {
        let level: usize = node.tag_name()[1..].parse().unwrap_or(1);

        // A heading is a single line
        let content = normalize_inline_text(content);
        if content.is_empty() {
            return String::new();
        }

        match options.heading_style {
            HeadingStyle::Setext if level <= 2 => {
                let underline = if level == 1 { "=" } else { "-" };
                block(&format!(
                    "{}\n{}",
                    content,
                    underline.repeat(content.chars().count())
                ))
            }
            _ => block(&format!("{} {}", "#".repeat(level), content)),
        }
    })
}

fn blockquote_rule() -> Rule {
    Rule::for_tag("blockquote", |_, content, _| {
        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }
        let quoted: Vec<String> = content
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect();
        block(&quoted.join("\n"))
    })
}

fn list_rule() -> Rule {
    Rule::for_tags(&["ul", "ol"], |node, content, _| {
        let content = content.trim_matches('\n');
        if content.trim().is_empty() {
            return String::new();
        }

        // Nested lists sit directly under their item's first line
        if node.parent_tag() == Some("li") {
            format!("\n{content}\n")
        } else {
            block(content)
        }
    })
}

fn list_item_rule() -> Rule {
    Rule::for_tag("li", |node, content, options| {
        let prefix = match node.parent() {
            Some(parent) if parent.tag_name() == "ol" => {
                let start: usize = parent
                    .attr("start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                format!("{}. ", start.saturating_add(node.sibling_index()))
            }
            _ => format!("{} ", options.bullet_list_marker),
        };

        let indent = " ".repeat(prefix.len());
        let content = content
            .trim()
            .replace("\n\n\n", "\n\n")
            .replace('\n', &format!("\n{indent}"));

        format!("{prefix}{content}\n")
    })
}

fn code_block_rule() -> Rule {
    Rule::for_tag("pre", |node, _, options| {
        let code_node = node.element_children().find(|c| c.tag_name() == "code");
        let code = code_text(code_node.unwrap_or(node.node));
        let code = code.trim_matches('\n');
        if code.trim().is_empty() {
            return String::new();
        }

        match options.code_block_style {
            CodeBlockStyle::Fenced => {
                let language = code_node
                    .and_then(class_language)
                    .or_else(|| class_language(node.node))
                    .or_else(|| brush_language(node))
                    .unwrap_or_default();

                let fence_char = options.fence.chars().next().unwrap_or('`');
                let fence_len = options
                    .fence
                    .chars()
                    .count()
                    .max(longest_run(code, fence_char) + 1);
                let fence: String = std::iter::repeat(fence_char).take(fence_len).collect();

                block(&format!("{fence}{language}\n{code}\n{fence}"))
            }
            CodeBlockStyle::Indented => {
                let indented: Vec<String> = code
                    .lines()
                    .map(|line| format!("    {line}"))
                    .collect();
                block(&indented.join("\n"))
            }
        }
    })
}

/// Raw text of a code element, honoring `<br>` as a newline
fn code_text(node: &Node) -> String {
    let mut out = String::new();
    push_code_text(node, &mut out);
    out
}

fn push_code_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) if el.name == "br" => out.push('\n'),
        Node::Element(el) => {
            for child in &el.children {
                push_code_text(child, out);
            }
        }
    }
}

fn class_language(node: &Node) -> Option<String> {
    node.classes()
        .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

fn brush_language(node: &NodeRef) -> Option<String> {
    let params = node.attr("data-syntaxhighlighter-params")?;
    BRUSH
        .captures(params)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

fn horizontal_rule() -> Rule {
    Rule::for_tag("hr", |_, _, options| block(&options.hr))
}

/// Wrap inline content in `delimiter`, moving edge whitespace outside so
/// `<em> x </em>` becomes ` _x_ ` rather than the invalid `_ x _`.
fn wrap_inline(content: &str, delimiter: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let leading = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trailing = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{leading}{delimiter}{trimmed}{delimiter}{trailing}")
}

fn emphasis_rule() -> Rule {
    Rule::for_tags(&["em", "i"], |_, content, options| {
        wrap_inline(content, &options.em_delimiter.to_string())
    })
}

fn strong_rule() -> Rule {
    Rule::for_tags(&["strong", "b"], |_, content, options| {
        wrap_inline(content, &options.strong_delimiter)
    })
}

fn strikethrough_rule() -> Rule {
    Rule::for_tags(&["del", "s", "strike"], |_, content, _| wrap_inline(content, "~~"))
}

fn inline_code_rule() -> Rule {
    Rule::generic(
        Filter::predicate(|tag, node| tag == "code" && node.parent_tag() != Some("pre")),
        |node, _, _| {
            let code = code_text(node.node).replace('\n', " ");
            if code.trim().is_empty() {
                return String::new();
            }

            let backticks = "`".repeat(longest_run(&code, '`') + 1);
            let needs_space = code.starts_with('`') || code.ends_with('`');
            if needs_space {
                format!("{backticks} {code} {backticks}")
            } else {
                format!("{backticks}{code}{backticks}")
            }
        },
    )
}

// Emitted by the table rule above the rows instead
fn table_caption_rule() -> Rule {
    Rule::for_tag("caption", |_, _, _| String::new())
}

fn table_cell_rule() -> Rule {
    Rule::for_tags(&["th", "td"], |node, content, options| {
        let cell = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(&options.table_cell_separator)
            .replace('|', "\\|");

        let prefix = if node.is_first_element() { "|" } else { "" };
        format!("{prefix} {cell} |")
    })
}

fn table_row_rule() -> Rule {
    Rule::for_tag("tr", |_, content, _| {
        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }
        format!("\n{content}")
    })
}

fn table_section_rule() -> Rule {
    Rule::for_tags(&["thead", "tbody", "tfoot"], |_, content, _| content.to_string())
}

/// Rows are emitted in source order; the first one always serves as the
/// header, whether it came from `<thead>`, an all-`<th>` row, or plain data.
fn table_rule() -> Rule {
    Rule::for_tag("table", |node, content, _| {
        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some((header, body)) = lines.split_first() else {
            return String::new();
        };

        let columns = header_row(node.node).map(cell_count).unwrap_or(1).max(1);

        let mut out = String::new();
        if let Some(caption) = node
            .element_children()
            .find(|c| c.tag_name() == "caption")
            .map(|c| normalize_inline_text(&c.text_content()))
            .filter(|c| !c.is_empty())
        {
            out.push_str(&caption);
            out.push_str("\n\n");
        }

        out.push_str(header);
        out.push_str("\n|");
        out.push_str(&" --- |".repeat(columns));
        for line in body {
            out.push('\n');
            out.push_str(line);
        }
        block(&out)
    })
}

/// The `<tr>` that renders as the header: the first one with a cell, looking
/// through row groups but not into cells. Rows without cells render nothing.
fn header_row(table: &Node) -> Option<&Node> {
    table
        .element_children()
        .flat_map(|child| match child.tag_name() {
            "tr" => std::slice::from_ref(child),
            "thead" | "tbody" | "tfoot" => child.children(),
            _ => &[][..],
        })
        .filter(|n| n.tag_name() == "tr")
        .find(|row| cell_count(row) > 0)
}

fn cell_count(row: &Node) -> usize {
    row.element_children()
        .filter(|c| matches!(c.tag_name(), "th" | "td"))
        .count()
}

fn container_rule() -> Rule {
    Rule::generic(
        Filter::predicate(|tag, _| is_block(tag)),
        |_, content, _| {
            let content = content.trim_matches('\n');
            if content.trim().is_empty() {
                return String::new();
            }
            block(content)
        },
    )
}
