//! Navigation tree discovery
//!
//! This module handles:
//! - The `NavNode` tree describing the documentation's page hierarchy
//! - Discovering that tree from the seed page's sidebar
//! - Marking the nodes selected by a table-of-contents filter

mod discover;
mod selection;

pub use discover::{
    default_nav_strategies, parse_navigation, Discoverer, Discovery, NavStrategy,
    SelectorNavStrategy, BUILTIN_NAV_SELECTORS,
};
pub use selection::{apply_toc_filter, title_matches};

/// One entry of the documentation's navigation tree
///
/// The tree is owned by a synthetic root (see [`NavNode::root`]) whose
/// children are the top-level entries. `depth` counts from 0 for those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNode {
    /// Title shown in the sidebar
    pub title: String,

    /// Absolute, normalized page URL (unique within the tree)
    pub url: String,

    /// Nesting depth, 0 for top-level entries
    pub depth: usize,

    /// Child entries in sidebar order
    pub children: Vec<NavNode>,

    /// Whether this page's content goes into the document
    pub selected: bool,

    root: bool,
}

impl NavNode {
    /// Creates a selected leaf node
    pub fn new(title: impl Into<String>, url: impl Into<String>, depth: usize) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            depth,
            children: Vec::new(),
            selected: true,
            root: false,
        }
    }

    /// Creates the synthetic root that owns the top-level entries
    pub fn root(children: Vec<NavNode>) -> Self {
        Self {
            title: String::new(),
            url: String::new(),
            depth: 0,
            children,
            selected: false,
            root: true,
        }
    }

    /// Builder-style helper for constructing trees by hand
    pub fn with_children(mut self, children: Vec<NavNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Pre-order traversal of every real node (the synthetic root is skipped)
    pub fn iter(&self) -> PreOrder<'_> {
        let mut stack = Vec::new();
        if self.root {
            stack.extend(self.children.iter().rev());
        } else {
            stack.push(self);
        }
        PreOrder { stack }
    }

    /// Number of real nodes in the tree
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Selected nodes in document order
    pub fn selected_nodes(&self) -> Vec<&NavNode> {
        self.iter().filter(|node| node.selected).collect()
    }

    /// Returns true if any node below this one is selected
    pub fn has_selected_descendant(&self) -> bool {
        self.children
            .iter()
            .flat_map(|child| child.iter())
            .any(|node| node.selected)
    }

    /// Finds a node by its URL
    pub fn find(&self, url: &str) -> Option<&NavNode> {
        self.iter().find(|node| node.url == url)
    }
}

/// Pre-order iterator over a [`NavNode`] tree, driven by an explicit stack
#[derive(Debug)]
pub struct PreOrder<'a> {
    stack: Vec<&'a NavNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a NavNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
