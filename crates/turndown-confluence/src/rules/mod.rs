//! Rule system for HTML to Markdown conversion.

mod commonmark;
mod confluence;
mod rule;

pub use commonmark::commonmark_rules;
pub use confluence::confluence_rules;
pub use rule::{Filter, ReplacementFn, Rule, Tier};

use indexmap::IndexMap;

use crate::node::NodeRef;
use crate::options::Options;

/// Ordered, named collection of conversion rules.
///
/// Lookup makes a single pass over the platform rules followed by the generic
/// ones, each in registration order. A `Rules` value is assembled up front and
/// handed to the service, which never mutates it.
pub struct Rules {
    rules: IndexMap<String, Rule>,
}

impl Rules {
    /// The Confluence rules followed by the CommonMark fallbacks
    pub fn new() -> Self {
        Self::empty()
            .with_rules(confluence_rules())
            .with_rules(commonmark_rules())
    }

    /// A table with no rules at all; every element falls through to its content
    pub fn empty() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    /// Register a rule under `key`. Re-using a key replaces that rule in place.
    pub fn with_rule(mut self, key: &str, rule: Rule) -> Self {
        self.rules.insert(key.to_string(), rule);
        self
    }

    fn with_rules(self, rules: Vec<(&'static str, Rule)>) -> Self {
        rules
            .into_iter()
            .fold(self, |acc, (key, rule)| acc.with_rule(key, rule))
    }

    /// Registered keys in evaluation order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.ordered().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn ordered(&self) -> impl Iterator<Item = (&str, &Rule)> {
        let platform = self.rules.iter().filter(|(_, r)| r.tier == Tier::Platform);
        let generic = self.rules.iter().filter(|(_, r)| r.tier == Tier::Generic);
        platform.chain(generic).map(|(k, r)| (k.as_str(), r))
    }

    /// Resolve and apply the rule for an element. Returns `None` when no rule
    /// claims it.
    pub fn apply(&self, node: &NodeRef, content: &str, options: &Options) -> Option<String> {
        for (key, rule) in self.ordered() {
            if !rule.filter.matches(node) {
                continue;
            }
            if let Some(output) = rule.replace(node, content, options) {
                tracing::trace!(rule = key, tag = node.tag_name(), "rule applied");
                return Some(output);
            }
            tracing::trace!(rule = key, tag = node.tag_name(), "rule declined");
        }
        None
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
