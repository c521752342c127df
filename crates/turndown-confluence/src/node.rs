//! Owned DOM tree used by the preprocessor and the conversion engine.
//!
//! The tree is built once per conversion from the html5ever parse (see
//! [`crate::html`]), mutated in place by [`crate::preprocess`], and then walked
//! read-only by the service. Owning the nodes keeps the two phases apart and
//! makes removal and unwrapping a matter of splicing `Vec`s.

use indexmap::IndexMap;

/// A DOM node: either an element or a run of character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with a lower-case tag name, ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Node::Element(Element {
            name: tag_name.to_lowercase(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        })
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        Node::Element(Element {
            name: tag_name.to_lowercase(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            children: Vec::new(),
        })
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Node::Text(content.to_string())
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Tag name for elements, empty for text
    pub fn tag_name(&self) -> &str {
        match self {
            Node::Element(el) => &el.name,
            Node::Text(_) => "",
        }
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_element()?.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Whitespace-separated entries of the `class` attribute, in source order
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Get all child nodes
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
        }
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children().iter().filter(|n| n.is_element())
    }

    /// Add a child node. Ignored on text nodes.
    pub fn add_child(&mut self, child: Node) {
        if let Node::Element(el) = self {
            el.children.push(child);
        }
    }

    /// Set an attribute, keeping its original position when it already exists
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Node::Element(el) = self {
            el.attrs.insert(name.to_lowercase(), value.to_string());
        }
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Depth-first search for the first descendant (excluding self) matching `pred`
    pub fn find_descendant<F>(&self, pred: F) -> Option<&Node>
    where
        F: Fn(&Node) -> bool + Copy,
    {
        for child in self.children() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }
}

/// A reference to a node with parent context.
/// This allows navigation up one level without storing parent pointers.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    /// The node itself
    pub node: &'a Node,
    parent: Option<&'a Node>,
}

impl<'a> NodeRef<'a> {
    /// Create a new NodeRef without parent context
    pub fn new(node: &'a Node) -> Self {
        Self { node, parent: None }
    }

    /// Create a new NodeRef with its parent element
    pub fn with_parent(node: &'a Node, parent: &'a Node) -> Self {
        Self {
            node,
            parent: Some(parent),
        }
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.parent
    }

    /// Get the parent tag name if known
    pub fn parent_tag(&self) -> Option<&'a str> {
        self.parent.map(|p| p.tag_name())
    }

    /// Position of this node among its parent's element children with the
    /// same tag name, starting at 0.
    pub fn sibling_index(&self) -> usize {
        let Some(parent) = self.parent else {
            return 0;
        };
        let tag = self.node.tag_name();
        parent
            .element_children()
            .filter(|c| c.tag_name() == tag)
            .position(|c| std::ptr::eq(c, self.node))
            .unwrap_or(0)
    }

    /// Whether this is the first element child of its parent
    pub fn is_first_element(&self) -> bool {
        match self.parent {
            Some(parent) => parent
                .element_children()
                .next()
                .is_some_and(|c| std::ptr::eq(c, self.node)),
            None => true,
        }
    }

    pub fn tag_name(&self) -> &'a str {
        self.node.tag_name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node.has_attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.node.has_class(class)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.element_children()
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }
}
