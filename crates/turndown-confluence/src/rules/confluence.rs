//! Confluence-specific rules. These take precedence over the CommonMark set.

use super::{Filter, Rule};
use crate::node::NodeRef;
use crate::sanitize::clean_url;
use crate::utilities::{looks_like_url, normalize_inline_text};

/// Lozenge showing a page or task status, e.g. `LIVE`
pub const STATUS_MACRO_CLASS: &str = "status-macro";
/// Inline Jira issue reference
pub const JIRA_MACRO_CLASS: &str = "confluence-jim-macro";
/// Mention of a Confluence user; the href points at an internal profile
pub const USER_LINK_CLASS: &str = "confluence-userlink";
/// Carries the issue key on the Jira macro or one of its descendants
pub const JIRA_KEY_ATTR: &str = "data-jira-key";

/// Create all Confluence rules, keyed and in evaluation order
pub fn confluence_rules() -> Vec<(&'static str, Rule)> {
    vec![
        ("lineBreak", line_break_rule()),
        ("image", image_rule()),
        ("time", time_rule()),
        ("statusMacro", status_macro_rule()),
        ("jiraMacro", jira_macro_rule()),
        ("userLink", user_link_rule()),
        ("link", link_rule()),
    ]
}

fn line_break_rule() -> Rule {
    Rule::platform(Filter::tag("br"), |_, _, _| Some("\n".to_string()))
}

// Images are noise in plain-text context.
fn image_rule() -> Rule {
    Rule::platform(Filter::tag("img"), |_, _, _| Some(String::new()))
}

fn time_rule() -> Rule {
    Rule::platform(Filter::tag("time"), |node, content, _| {
        match node.attr("datetime").map(str::trim) {
            Some(datetime) if !datetime.is_empty() => Some(datetime.to_string()),
            _ => Some(normalize_inline_text(content)),
        }
    })
}

fn status_macro_rule() -> Rule {
    Rule::platform(
        Filter::tag_class("span", STATUS_MACRO_CLASS),
        |_, content, _| {
            let status = normalize_inline_text(content);
            if status.is_empty() {
                Some(String::new())
            } else {
                Some(format!("[{status}]"))
            }
        },
    )
}

fn jira_macro_rule() -> Rule {
    Rule::platform(
        Filter::tag_class("span", JIRA_MACRO_CLASS),
        |node, content, _| Some(jira_key(node).unwrap_or_else(|| normalize_inline_text(content))),
    )
}

fn jira_key(node: &NodeRef) -> Option<String> {
    let own = node.attr(JIRA_KEY_ATTR).map(str::trim).filter(|k| !k.is_empty());
    let key = own.or_else(|| {
        node.node
            .find_descendant(|n| n.has_attr(JIRA_KEY_ATTR))
            .and_then(|n| n.attr(JIRA_KEY_ATTR))
            .map(str::trim)
            .filter(|k| !k.is_empty())
    })?;
    Some(key.to_string())
}

fn user_link_rule() -> Rule {
    Rule::platform(
        Filter::tag_class("a", USER_LINK_CLASS),
        |_, content, _| Some(normalize_inline_text(content)),
    )
}

fn link_rule() -> Rule {
    Rule::platform(Filter::tag("a"), |node, content, _| {
        let text = normalize_inline_text(content);
        let href = node.attr("href").map(str::trim).unwrap_or("");
        if href.is_empty() || href == "#" {
            return Some(text);
        }

        // Compare against the raw text; `content` has already been escaped
        let visible = normalize_inline_text(&node.text_content());
        if visible.is_empty() {
            return Some(String::new());
        }

        let href = clean_url(href);
        if visible == href || clean_url(&visible) == href || looks_like_url(&visible) {
            return Some(href);
        }

        let title = node
            .attr("title")
            .map(normalize_inline_text)
            .filter(|t| !t.is_empty());
        Some(match title {
            Some(title) => format!("[{}]({} \"{}\")", text, href, title.replace('"', "\\\"")),
            None => format!("[{text}]({href})"),
        })
    })
}
