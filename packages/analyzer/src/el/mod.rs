//! Generic element (EL) tree.
//!
//! The tree is stored as an arena: every element lives in `ElTree::nodes`
//! and is addressed by a [`NodeId`]. Children are an ordered list of text
//! runs and node handles, so the only mutation the analyzer needs,
//! "replace the character range `[start, end)` of one element's content by
//! a new node", is a local vector edit ([`ElTree::replace_span`]).
//!
//! All text offsets in this crate count Unicode scalar values (`char`s),
//! never bytes.

pub mod control;
pub mod inline;
pub mod xml;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{AnalyzerError, Result};

/// Handle to an element stored in an [`ElTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of an element's ordered content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// A run of literal text.
    Text(String),
    /// A sub-element owned by this element.
    Node(NodeId),
}

impl Child {
    /// Literal text of this child if it is a text run.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Node(_) => None,
        }
    }

    /// Node handle of this child if it is an element.
    #[must_use]
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Text(_) => None,
            Self::Node(id) => Some(*id),
        }
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NodeId> for Child {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

/// A single element: tag, attributes, ordered content and an optional
/// half-open character range into the original source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attr: BTreeMap<String, String>,
    pub children: Vec<Child>,
    pub range: Option<(usize, usize)>,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attr: BTreeMap::new(),
            children: Vec::new(),
            range: None,
        }
    }

    /// Whether at least one direct child is a text run.
    #[must_use]
    pub fn has_text_child(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Child::Text(_)))
    }
}

/// Arena holding a whole law document.
#[derive(Debug, Clone)]
pub struct ElTree {
    nodes: Vec<Element>,
    root: NodeId,
}

impl ElTree {
    /// Create a tree consisting of a single root element.
    #[must_use]
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            nodes: vec![Element::new(root_tag)],
            root: NodeId(0),
        }
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of elements ever created in this arena (attached or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty. Never true: a tree always has a root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached element. Attach it with [`ElTree::append`] or a splice.
    pub fn create(&mut self, tag: impl Into<String>) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Create a detached element with attributes and children in one call.
    pub fn create_with<K, V>(
        &mut self,
        tag: impl Into<String>,
        attr: impl IntoIterator<Item = (K, V)>,
        children: impl IntoIterator<Item = Child>,
    ) -> NodeId
    where
        K: Into<String>,
        V: Into<String>,
    {
        let id = self.create(tag);
        let element = &mut self.nodes[id.0];
        element.attr = attr
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        element.children = children.into_iter().collect();
        id
    }

    /// Append a child to the end of `parent`'s content.
    pub fn append(&mut self, parent: NodeId, child: impl Into<Child>) {
        self.nodes[parent.0].children.push(child.into());
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attr.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        self.nodes[id.0].attr.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[Child] {
        &self.nodes[id.0].children
    }

    /// Element children only, in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].children.iter().filter_map(Child::as_node)
    }

    /// Full text content of an element (all descendant text runs).
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in &self.nodes[id.0].children {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Node(sub) => self.collect_text(*sub, out),
            }
        }
    }

    /// Length of [`ElTree::text`] in characters.
    #[must_use]
    pub fn text_len(&self, id: NodeId) -> usize {
        self.nodes[id.0]
            .children
            .iter()
            .map(|c| self.child_len(c))
            .sum()
    }

    fn child_len(&self, child: &Child) -> usize {
        match child {
            Child::Text(text) => char_len(text),
            Child::Node(sub) => self.text_len(*sub),
        }
    }

    /// Text runs that are direct children of `id`, each with its character
    /// offset inside the element's full text.
    #[must_use]
    pub fn plain_segments(&self, id: NodeId) -> Vec<(usize, &str)> {
        let mut offset = 0;
        let mut segments = Vec::new();
        for child in &self.nodes[id.0].children {
            let len = self.child_len(child);
            if let Child::Text(text) = child {
                segments.push((offset, text.as_str()));
            }
            offset += len;
        }
        segments
    }

    /// Whether the range `[start, end)` of the element's text consists only
    /// of direct text runs, i.e. touches no sub-element.
    #[must_use]
    pub fn is_plain_range(&self, id: NodeId, start: usize, end: usize) -> bool {
        if start > end || end > self.text_len(id) {
            return false;
        }
        let mut offset = 0;
        for child in &self.nodes[id.0].children {
            let len = self.child_len(child);
            let (cs, ce) = (offset, offset + len);
            offset = ce;
            if matches!(child, Child::Node(_)) && cs < end && start < ce {
                return false;
            }
        }
        true
    }

    /// Replace the characters `[start, end)` of `id`'s content with `node`.
    ///
    /// Text runs are split at the boundaries; sub-elements lying entirely
    /// inside the range are dropped, and a sub-element crossing a boundary
    /// makes the splice fail without touching the tree. If `node` has no
    /// source range but `id` has one, the node inherits the corresponding
    /// sub-range.
    pub fn replace_span(&mut self, id: NodeId, start: usize, end: usize, node: NodeId) -> Result<()> {
        let length = self.text_len(id);
        let invalid = || AnalyzerError::InvalidSplice {
            tag: self.nodes[id.0].tag.clone(),
            start,
            end,
            length,
        };
        if start > end || end > length {
            return Err(invalid());
        }

        let mut out: Vec<Child> = Vec::with_capacity(self.nodes[id.0].children.len() + 2);
        let mut inserted = false;
        let mut offset = 0;
        for child in &self.nodes[id.0].children {
            let len = self.child_len(child);
            let (cs, ce) = (offset, offset + len);
            offset = ce;
            match child {
                Child::Text(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    if ce <= start {
                        out.push(child.clone());
                    } else if cs >= end {
                        if !inserted {
                            out.push(Child::Node(node));
                            inserted = true;
                        }
                        out.push(child.clone());
                    } else {
                        let before = char_slice(text, 0, start.saturating_sub(cs));
                        let after = char_slice(text, end.saturating_sub(cs).min(len), len);
                        if !before.is_empty() {
                            out.push(Child::Text(before.to_string()));
                        }
                        if !inserted {
                            out.push(Child::Node(node));
                            inserted = true;
                        }
                        if !after.is_empty() {
                            out.push(Child::Text(after.to_string()));
                        }
                    }
                }
                Child::Node(_) => {
                    if ce <= start && (cs < start || len == 0) {
                        out.push(child.clone());
                    } else if cs >= end {
                        if !inserted {
                            out.push(Child::Node(node));
                            inserted = true;
                        }
                        out.push(child.clone());
                    } else if start <= cs && ce <= end {
                        // swallowed by the new node
                    } else {
                        return Err(invalid());
                    }
                }
            }
        }
        if !inserted {
            out.push(Child::Node(node));
        }

        if self.nodes[node.0].range.is_none() {
            if let Some((source_start, _)) = self.nodes[id.0].range {
                self.nodes[node.0].range = Some((source_start + start, source_start + end));
            }
        }
        self.nodes[id.0].children = out;
        Ok(())
    }

    /// Pre-order iterator over `id` and all of its descendant elements.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }
}

/// Pre-order traversal of an element subtree.
pub struct Descendants<'a> {
    tree: &'a ElTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let tree = self.tree;
        let children = tree.children(id);
        self.stack
            .extend(children.iter().rev().filter_map(Child::as_node));
        Some(id)
    }
}

/// Number of characters in `text`.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Substring of `text` between character offsets `start` and `end`.
///
/// Offsets past the end are clamped.
#[must_use]
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map_or(text.len(), |(i, _)| i)
    };
    let start = byte_at(start);
    let end = byte_at(end).max(start);
    &text[start..end]
}

/// Character offset of the first occurrence of `needle` in `text` at or
/// after character offset `from`.
#[must_use]
pub fn char_find(text: &str, needle: &str, from: usize) -> Option<usize> {
    let from_byte = text
        .char_indices()
        .nth(from)
        .map_or(text.len(), |(i, _)| i);
    text[from_byte..]
        .find(needle)
        .map(|b| from + char_len(&text[from_byte..from_byte + b]))
}
