//! Rule and Filter types for HTML conversion.

use crate::node::NodeRef;
use crate::options::Options;

/// Type alias for replacement functions.
///
/// Receives the element, its already-converted children and the options.
/// Returning `None` declines the element so the next matching rule gets it.
pub type ReplacementFn =
    Box<dyn Fn(&NodeRef, &str, &Options) -> Option<String> + Send + Sync>;

/// Which pass a rule belongs to. Every platform rule is tried before any
/// generic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Confluence-specific markup (macros, user links, tracking-free links)
    Platform,
    /// CommonMark/GFM fallback for the element's semantic role
    Generic,
}

/// A filter determines which elements a rule applies to
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match a tag name carrying a CSS class
    TagClass(String, String),
    /// Match using a predicate function
    Predicate(Box<dyn Fn(&str, &NodeRef) -> bool + Send + Sync>),
}

impl Filter {
    /// Create a filter for a single tag
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_lowercase())
    }

    /// Create a filter for multiple tags
    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    /// Create a filter for `tag.class`
    pub fn tag_class(tag: &str, class: &str) -> Self {
        Filter::TagClass(tag.to_lowercase(), class.to_string())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &NodeRef) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches a node
    pub fn matches(&self, node: &NodeRef) -> bool {
        let tag = node.tag_name();
        match self {
            Filter::TagName(t) => tag == t.as_str(),
            Filter::TagNames(tags) => tags.iter().any(|t| t.as_str() == tag),
            Filter::TagClass(t, class) => tag == t.as_str() && node.has_class(class),
            Filter::Predicate(f) => f(tag, node),
        }
    }
}

/// A rule defines how to convert a matched HTML element to Markdown
pub struct Rule {
    pub tier: Tier,
    /// Filter to determine which elements this rule applies to
    pub filter: Filter,
    /// Replacement function that generates Markdown
    pub replacement: ReplacementFn,
}

impl Rule {
    /// Create a platform rule that may decline by returning `None`
    pub fn platform<F>(filter: Filter, replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &Options) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            tier: Tier::Platform,
            filter,
            replacement: Box::new(replacement),
        }
    }

    /// Create a generic rule; generic rules always produce output
    pub fn generic<F>(filter: Filter, replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &Options) -> String + Send + Sync + 'static,
    {
        Self {
            tier: Tier::Generic,
            filter,
            replacement: Box::new(move |node, content, options| {
                Some(replacement(node, content, options))
            }),
        }
    }

    /// Create a generic rule that matches a single tag
    pub fn for_tag<F>(tag: &str, replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &Options) -> String + Send + Sync + 'static,
    {
        Self::generic(Filter::tag(tag), replacement)
    }

    /// Create a generic rule that matches multiple tags
    pub fn for_tags<F>(tags: &[&str], replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &Options) -> String + Send + Sync + 'static,
    {
        Self::generic(Filter::tags(tags), replacement)
    }

    /// Apply this rule's replacement
    pub fn replace(&self, node: &NodeRef, content: &str, options: &Options) -> Option<String> {
        (self.replacement)(node, content, options)
    }
}
