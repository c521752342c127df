//! TurndownService - the main entry point for HTML to Markdown conversion.

use crate::html::parse_html;
use crate::node::{Node, NodeRef};
use crate::options::{EscapeMode, Options};
use crate::preprocess::preprocess;
use crate::rules::Rules;
use crate::utilities::{collapse_whitespace, escape_markdown, is_block, post_process};
use crate::Result;

/// The service converting Confluence HTML to Markdown.
///
/// Options and rules are fixed at construction; a single service can be
/// shared across threads and used for any number of conversions.
pub struct TurndownService {
    options: Options,
    rules: Rules,
}

impl TurndownService {
    /// Create a new TurndownService with default options and rules
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Create a TurndownService with custom options
    pub fn with_options(options: Options) -> Self {
        Self::with_rules(options, Rules::new())
    }

    /// Create a TurndownService with custom options and a custom rule table
    pub fn with_rules(options: Options, rules: Rules) -> Self {
        Self { options, rules }
    }

    /// Convert HTML to Markdown.
    ///
    /// Blank input yields an empty string without parsing.
    pub fn turndown(&self, html: &str) -> Result<String> {
        if html.trim().is_empty() {
            return Ok(String::new());
        }

        let mut root = parse_html(html);
        preprocess(&mut root);
        let markdown = self.turndown_node(&root);

        tracing::debug!(
            html_len = html.len(),
            markdown_len = markdown.len(),
            "converted confluence html"
        );
        Ok(markdown)
    }

    /// Convert the children of an already parsed (and, if wanted,
    /// preprocessed) tree. The root element itself is not rendered.
    pub fn turndown_node(&self, root: &Node) -> String {
        post_process(&self.process_children(root))
    }

    /// Get the current options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get the rule table
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Escape markdown special characters in a string
    pub fn escape(&self, text: &str) -> String {
        match self.options.escape_mode {
            EscapeMode::Basic => escape_markdown(text),
            EscapeMode::Disabled => text.to_string(),
        }
    }

    /// Process children of an element
    fn process_children(&self, parent: &Node) -> String {
        let mut result = String::new();

        for (index, child) in parent.children().iter().enumerate() {
            match child {
                Node::Text(text) => {
                    result.push_str(&self.process_text(parent, index, text));
                }
                Node::Element(_) => {
                    let node = NodeRef::with_parent(child, parent);
                    result.push_str(&self.process_element(&node));
                }
            }
        }

        result
    }

    /// Collapse whitespace in a text node and drop whatever borders a block
    /// boundary, so indentation in the HTML source never leaks into the
    /// Markdown.
    fn process_text(&self, parent: &Node, index: usize, text: &str) -> String {
        let siblings = parent.children();
        let at_block_edge = |neighbor: Option<&Node>, edge: bool| match neighbor {
            Some(n) => n.is_element() && (is_block(n.tag_name()) || n.tag_name() == "br"),
            None => edge,
        };

        let parent_is_block = is_block(parent.tag_name());
        let prev = index.checked_sub(1).and_then(|i| siblings.get(i));
        let next = siblings.get(index + 1);

        let mut collapsed = collapse_whitespace(text);
        if at_block_edge(next, parent_is_block) {
            collapsed.truncate(collapsed.trim_end().len());
        }
        if at_block_edge(prev, parent_is_block) {
            collapsed = collapsed.trim_start().to_string();
        }
        if collapsed.is_empty() {
            return collapsed;
        }

        self.escape(&collapsed)
    }

    /// Process a single element: children first, then the first rule that
    /// claims it. Unclaimed elements contribute their converted content.
    fn process_element(&self, node: &NodeRef) -> String {
        let content = self.process_children(node.node);
        self.rules
            .apply(node, &content, &self.options)
            .unwrap_or(content)
    }
}

impl Default for TurndownService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CodeBlockStyle, HeadingStyle};
    use pretty_assertions::assert_eq;

    fn md(html: &str) -> String {
        TurndownService::new().turndown(html).unwrap()
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(md(""), "");
        assert_eq!(md(" \n\t "), "");
    }

    #[test]
    fn test_simple_paragraph() {
        assert_eq!(md("<p>Hello World</p>"), "Hello World");
    }

    #[test]
    fn test_paragraphs_are_separated_by_blank_line() {
        assert_eq!(md("<p>One</p>\n  <p>Two</p>"), "One\n\nTwo");
    }

    #[test]
    fn test_heading_atx() {
        assert_eq!(md("<h2>Overview</h2><p>Body</p>"), "## Overview\n\nBody");
    }

    #[test]
    fn test_heading_setext() {
        let options = Options {
            heading_style: HeadingStyle::Setext,
            ..Default::default()
        };
        let service = TurndownService::with_options(options);
        assert_eq!(service.turndown("<h1>Title</h1>").unwrap(), "Title\n=====");
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            md("<p><strong>Bold</strong> <em>Italic</em> <del>Old</del> and <code>inline()</code></p>"),
            "**Bold** _Italic_ ~~Old~~ and `inline()`"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(md("<p>a *star* and [box]</p>"), "a \\*star\\* and \\[box\\]");

        let options = Options {
            escape_mode: EscapeMode::Disabled,
            ..Default::default()
        };
        let service = TurndownService::with_options(options);
        assert_eq!(service.turndown("<p>a *star*</p>").unwrap(), "a *star*");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(md("<p>A<br>B<br/>  C</p>"), "A\nB\nC");
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!(md("<ul>\n<li>One</li>\n<li>Two</li>\n</ul>"), "- One\n- Two");
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(
            md("<ol start=\"2\"><li>One</li><li>Two</li></ol>"),
            "2. One\n3. Two"
        );
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            md("<ul><li>Parent\n  <ul><li>Child</li><li>Sibling</li></ul></li><li>Next</li></ul>"),
            "- Parent\n  - Child\n  - Sibling\n- Next"
        );
    }

    #[test]
    fn test_custom_bullet_marker() {
        let options = Options {
            bullet_list_marker: '*',
            ..Default::default()
        };
        let service = TurndownService::with_options(options);
        assert_eq!(service.turndown("<ul><li>x</li></ul>").unwrap(), "* x");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(md("<blockquote><p>Quote</p></blockquote>"), "> Quote");
    }

    #[test]
    fn test_fenced_code_block() {
        assert_eq!(
            md("<pre><code class=\"language-sh\">echo hi\n</code></pre>"),
            "```sh\necho hi\n```"
        );
    }

    #[test]
    fn test_indented_code_block() {
        let options = Options {
            code_block_style: CodeBlockStyle::Indented,
            ..Default::default()
        };
        let service = TurndownService::with_options(options);
        assert_eq!(
            service.turndown("<pre><code>function() {}</code></pre>").unwrap(),
            "    function() {}"
        );
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(md("<p>a</p><hr><p>b</p>"), "a\n\n* * *\n\nb");
    }

    #[test]
    fn test_table() {
        let out = md("<table><thead><tr><th>Name</th><th>Value</th></tr></thead>\
                      <tbody><tr><td>A</td><td>1</td></tr></tbody></table>");
        assert_eq!(out, "| Name | Value |\n| --- | --- |\n| A | 1 |");
    }

    #[test]
    fn test_table_without_header_uses_first_row() {
        let out = md("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>");
        assert_eq!(out, "| a | b |\n| --- | --- |\n| c | d |");
    }

    #[test]
    fn test_unknown_elements_fall_back_to_text() {
        assert_eq!(
            md("<p>plain <x-widget data-a=\"1\">widget <u>text</u></x-widget></p>"),
            "plain widget text"
        );
    }

    #[test]
    fn test_scripts_are_dropped() {
        assert_eq!(md("<p>a</p><script>alert(1)</script><style>p{}</style>"), "a");
    }
}
