//! Declarations and their scopes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::el::control::DECLARATION;
use crate::el::{Child, ElTree, NodeId};
use crate::span::SpanTextPos;

/// Half-open region of span positions.
///
/// Text indices are only meaningful at the boundary spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRange {
    pub start_span_index: usize,
    pub start_text_index: usize,
    pub end_span_index: usize,
    pub end_text_index: usize,
}

impl ScopeRange {
    #[must_use]
    pub fn new(
        start_span_index: usize,
        start_text_index: usize,
        end_span_index: usize,
        end_text_index: usize,
    ) -> Self {
        debug_assert!(start_span_index <= end_span_index, "scope range must not be reversed");
        Self {
            start_span_index,
            start_text_index,
            end_span_index,
            end_text_index,
        }
    }

    /// From `(span_index, text_index)` to the end of a document of
    /// `span_count` spans.
    #[must_use]
    pub fn rest_of_document(span_index: usize, text_index: usize, span_count: usize) -> Self {
        Self::new(span_index, text_index, span_count.max(span_index), 0)
    }

    /// Whether the span at `span_index` lies in this range.
    #[must_use]
    pub fn contains_span(&self, span_index: usize) -> bool {
        self.start_span_index <= span_index && span_index < self.end_span_index
    }
}

/// Kind of defined term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclarationType {
    /// A law name or a term introduced by `「…」という。`.
    LawName,
    /// A term introduced by a list-form definition.
    Keyword,
}

impl DeclarationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LawName => "LawName",
            Self::Keyword => "Keyword",
        }
    }
}

impl fmt::Display for DeclarationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized defined term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// Position in the owning registry.
    pub declaration_index: usize,
    #[serde(rename = "type")]
    pub declaration_type: DeclarationType,
    pub name: String,
    pub value: Option<String>,
    pub scope: Vec<ScopeRange>,
    pub name_pos: SpanTextPos,
    /// The `____Declaration` node holding the name text.
    pub el: NodeId,
}

impl Declaration {
    /// Create the declaration together with its detached `____Declaration`
    /// node. The index is assigned by [`Declarations::add`].
    pub fn new(
        tree: &mut ElTree,
        declaration_type: DeclarationType,
        name: impl Into<String>,
        value: Option<String>,
        scope: Vec<ScopeRange>,
        name_pos: SpanTextPos,
    ) -> Self {
        let name = name.into();
        let el = tree.create_with(
            DECLARATION,
            [("type", declaration_type.as_str())],
            [Child::Text(name.clone())],
        );
        let declaration = Self {
            declaration_index: 0,
            declaration_type,
            name,
            value,
            scope,
            name_pos,
            el,
        };
        declaration.write_attrs(tree);
        declaration
    }

    /// Whether the scope covers the span at `span_index`.
    #[must_use]
    pub fn is_in_scope(&self, span_index: usize) -> bool {
        self.scope.iter().any(|r| r.contains_span(span_index))
    }

    fn write_attrs(&self, tree: &mut ElTree) {
        tree.set_attr(self.el, "type", self.declaration_type.as_str());
        tree.set_attr(self.el, "name", self.name.clone());
        if let Some(value) = &self.value {
            tree.set_attr(self.el, "value", value.clone());
        }
        tree.set_attr(self.el, "scope", to_json(&self.scope, "[]"));
        tree.set_attr(self.el, "name_pos", to_json(&self.name_pos, "{}"));
        tree.set_attr(self.el, "declaration_index", self.declaration_index.to_string());
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| fallback.to_string())
}

/// Append-only registry of declarations.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    declarations: Vec<Declaration>,
}

impl Declarations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration, assigning it the next index and recording that
    /// index on its tree node.
    pub fn add(&mut self, tree: &mut ElTree, mut declaration: Declaration) -> usize {
        let index = self.declarations.len();
        declaration.declaration_index = index;
        tree.set_attr(declaration.el, "declaration_index", index.to_string());
        tracing::debug!(
            index,
            name = %declaration.name,
            kind = %declaration.declaration_type,
            "Found declaration"
        );
        self.declarations.push(declaration);
        index
    }

    /// Declarations whose scope covers `span_index`, in insertion order.
    pub fn iterate(&self, span_index: usize) -> impl Iterator<Item = &Declaration> + '_ {
        self.declarations
            .iter()
            .filter(move |d| d.is_in_scope(span_index))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Declaration> {
        self.declarations.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.declarations.iter()
    }
}

impl<'a> IntoIterator for &'a Declarations {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
