//! HTML parsing support.
//!
//! Parses an HTML string with scraper/html5ever and converts the result into
//! the owned [`Node`] tree the rest of the crate works on. Parsing follows the
//! HTML5 error-recovery rules, so malformed markup never fails here.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Node;

/// Deepest element nesting kept as structure, the synthetic root included.
/// Anything below it is flattened into a single text node, which keeps every
/// later tree walk within a fixed depth.
pub const MAX_DEPTH: usize = 256;

/// Parse an HTML fragment into a Node tree.
///
/// The returned root is the synthetic `<html>` element html5ever creates for
/// fragments; the input's top-level nodes are its children.
///
/// # Example
///
/// ```rust
/// use turndown_confluence::parse_html;
///
/// let root = parse_html("<p>Hello <em>World</em></p>");
/// assert_eq!(root.tag_name(), "html");
/// assert_eq!(root.text_content(), "Hello World");
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);
    if !document.errors.is_empty() {
        tracing::trace!(
            errors = document.errors.len(),
            "html5ever recovered from parse errors"
        );
    }
    scraper_to_node(document.root_element())
}

fn element_node(element: ElementRef) -> Node {
    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    Node::element_with_attrs(element.value().name(), attrs)
}

/// Convert a scraper ElementRef to our Node structure.
///
/// `open` holds the elements under construction, `pending` the child
/// iterators at the same depths.
fn scraper_to_node(root: ElementRef) -> Node {
    let mut open = vec![element_node(root)];
    let mut pending = vec![root.children()];
    let mut flattened = 0usize;

    while let Some(children) = pending.last_mut() {
        let Some(child) = children.next() else {
            pending.pop();
            if open.len() > 1 {
                if let Some(done) = open.pop() {
                    if let Some(parent) = open.last_mut() {
                        parent.add_child(done);
                    }
                }
            }
            continue;
        };

        let depth = open.len();
        let Some(parent) = open.last_mut() else {
            break;
        };
        match child.value() {
            ScraperNode::Text(text) => parent.add_child(Node::text(&text.text)),
            ScraperNode::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                if depth >= MAX_DEPTH {
                    let text: String = element.text().collect();
                    parent.add_child(Node::text(&text));
                    flattened += 1;
                } else {
                    open.push(element_node(element));
                    pending.push(element.children());
                }
            }
            // Comments, doctypes and processing instructions carry no content
            _ => {}
        }
    }

    if flattened > 0 {
        tracing::debug!(flattened, max_depth = MAX_DEPTH, "flattened deeply nested markup");
    }
    open.pop().unwrap_or_else(|| Node::element(root.value().name()))
}
