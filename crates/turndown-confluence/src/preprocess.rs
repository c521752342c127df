//! Confluence-specific cleanup applied to the tree before conversion.
//!
//! Each pass walks the whole tree before the next one starts: noise removal,
//! then wrapper flattening, then empty-paragraph pruning, then link cleanup.
//! Text nodes left side by side by the structural passes are merged last.
//! A noise block nested in a layout wrapper is therefore gone before the
//! wrapper is unwrapped, and a wrapper nested in a noise block disappears with
//! it.

use crate::node::Node;
use crate::sanitize::clean_url;

/// A simple `tag.class.class` selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    tag: Option<&'static str>,
    classes: &'static [&'static str],
}

impl Selector {
    /// Match any element carrying every class in `classes`
    pub const fn classes(classes: &'static [&'static str]) -> Self {
        Self { tag: None, classes }
    }

    /// Match elements by tag name alone
    pub const fn tag(tag: &'static str) -> Self {
        Self {
            tag: Some(tag),
            classes: &[],
        }
    }

    /// Match `tag` elements carrying every class in `classes`
    pub const fn tag_classes(tag: &'static str, classes: &'static [&'static str]) -> Self {
        Self {
            tag: Some(tag),
            classes,
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        if self.tag.is_some_and(|tag| tag != node.tag_name()) {
            return false;
        }
        self.classes.iter().all(|class| node.has_class(class))
    }
}

/// Auto-generated blocks with a lot of text and little information
pub const NOISE_SELECTORS: &[Selector] = &[
    Selector::classes(&["toc-macro"]),
    Selector::classes(&["recently-updated"]),
    Selector::classes(&["plugin-contributors"]),
    Selector::tag("colgroup"),
    Selector::tag("col"),
];

/// Layout and panel wrappers replaced by their children
pub const WRAPPER_SELECTORS: &[Selector] = &[
    Selector::tag_classes("div", &["contentLayout2"]),
    Selector::tag_classes("div", &["columnLayout"]),
    Selector::tag_classes("div", &["cell"]),
    Selector::tag_classes("div", &["innerCell"]),
    Selector::tag_classes("div", &["table-wrap"]),
    Selector::tag_classes("div", &["code", "panel"]),
    Selector::tag_classes("div", &["codeContent", "panelContent"]),
];

/// Run every pass over `root`, mutating it in place.
pub fn preprocess(root: &mut Node) {
    let removed = remove_matching(root, NOISE_SELECTORS);
    let unwrapped = unwrap_matching(root, WRAPPER_SELECTORS);
    let pruned = prune_empty_paragraphs(root);
    let links = clean_link_targets(root);
    merge_adjacent_text(root);

    tracing::debug!(removed, unwrapped, pruned, links, "preprocessed confluence markup");
}

/// Delete every subtree whose root matches one of `selectors`
pub fn remove_matching(node: &mut Node, selectors: &[Selector]) -> usize {
    let Some(el) = node.as_element_mut() else {
        return 0;
    };

    let before = el.children.len();
    el.children
        .retain(|child| !selectors.iter().any(|s| s.matches(child)));
    let mut removed = before - el.children.len();

    for child in &mut el.children {
        removed += remove_matching(child, selectors);
    }
    removed
}

/// Replace every element matching one of `selectors` with its children
pub fn unwrap_matching(node: &mut Node, selectors: &[Selector]) -> usize {
    let Some(el) = node.as_element_mut() else {
        return 0;
    };

    let mut unwrapped = 0;
    let mut i = 0;
    while i < el.children.len() {
        if selectors.iter().any(|s| s.matches(&el.children[i])) {
            let lifted = match el.children.remove(i) {
                Node::Element(wrapper) => wrapper.children,
                Node::Text(_) => Vec::new(),
            };
            el.children.splice(i..i, lifted);
            unwrapped += 1;
            // Stay at `i`: the first lifted child may itself be a wrapper
        } else {
            unwrapped += unwrap_matching(&mut el.children[i], selectors);
            i += 1;
        }
    }
    unwrapped
}

/// Remove `<p>` elements with no element children whose text is blank once
/// non-breaking spaces are dropped
pub fn prune_empty_paragraphs(node: &mut Node) -> usize {
    let Some(el) = node.as_element_mut() else {
        return 0;
    };

    let before = el.children.len();
    el.children.retain(|child| !is_empty_paragraph(child));
    let mut pruned = before - el.children.len();

    for child in &mut el.children {
        pruned += prune_empty_paragraphs(child);
    }
    pruned
}

fn is_empty_paragraph(node: &Node) -> bool {
    node.tag_name() == "p"
        && node.element_children().next().is_none()
        && node.text_content().replace('\u{a0}', "").trim().is_empty()
}

/// Rewrite every non-blank anchor `href` through [`clean_url`]. Returns the
/// number of hrefs that changed.
pub fn clean_link_targets(node: &mut Node) -> usize {
    let mut changed = 0;

    if node.tag_name() == "a" {
        let cleaned = node
            .attr("href")
            .filter(|href| !href.trim().is_empty())
            .map(|href| (clean_url(href), href.to_string()));
        if let Some((cleaned, original)) = cleaned {
            if cleaned != original {
                changed += 1;
            }
            node.set_attr("href", &cleaned);
        }
    }

    if let Some(el) = node.as_element_mut() {
        for child in &mut el.children {
            changed += clean_link_targets(child);
        }
    }
    changed
}

/// Join runs of sibling text nodes into one node
pub fn merge_adjacent_text(node: &mut Node) -> usize {
    let Some(el) = node.as_element_mut() else {
        return 0;
    };

    let mut merged = 0;
    let mut children: Vec<Node> = Vec::with_capacity(el.children.len());
    for child in el.children.drain(..) {
        if let (Some(Node::Text(prev)), Node::Text(text)) = (children.last_mut(), &child) {
            prev.push_str(text);
            merged += 1;
            continue;
        }
        children.push(child);
    }
    el.children = children;

    for child in &mut el.children {
        merged += merge_adjacent_text(child);
    }
    merged
}
