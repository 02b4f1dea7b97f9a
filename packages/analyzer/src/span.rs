//! Spans and positions inside them.

use serde::Serialize;

use crate::container::ContainerId;
use crate::el::{ElTree, NodeId};

/// Context captured when a span is extracted.
///
/// Each recursive step of the extractor clones its environment before
/// pushing onto it, so siblings never observe each other's entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    /// `LawType` attribute of the law root, if any.
    pub law_type: Option<String>,
    /// Enclosing containers, outermost first.
    pub container_stack: Vec<ContainerId>,
    /// Enclosing non-span elements, outermost first.
    pub parents: Vec<NodeId>,
}

impl Env {
    #[must_use]
    pub fn new(law_type: Option<String>) -> Self {
        Self {
            law_type,
            container_stack: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Innermost enclosing container.
    #[must_use]
    pub fn container(&self) -> Option<ContainerId> {
        self.container_stack.last().copied()
    }

    /// Immediate parent element of the span.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parents.last().copied()
    }
}

/// One unit of mixed content.
#[derive(Debug, Clone)]
pub struct Span {
    /// Position in the span sequence.
    pub index: usize,
    /// The element whose content this span represents.
    pub el: NodeId,
    pub env: Env,
    /// Text at extraction time.
    ///
    /// Splices keep the text of an element intact, so this stays equal to
    /// the element's text; only its child structure changes.
    pub text: String,
}

impl Span {
    #[must_use]
    pub fn new(index: usize, el: NodeId, env: Env, tree: &ElTree) -> Self {
        Self {
            index,
            el,
            env,
            text: tree.text(el),
        }
    }

    /// Recompute the text from the tree.
    #[must_use]
    pub fn current_text(&self, tree: &ElTree) -> String {
        tree.text(self.el)
    }
}

/// Address of a run of characters: span index plus character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpanTextPos {
    pub span_index: usize,
    pub text_index: usize,
    pub length: usize,
}

impl SpanTextPos {
    #[must_use]
    pub fn new(span_index: usize, text_index: usize, length: usize) -> Self {
        Self {
            span_index,
            text_index,
            length,
        }
    }

    /// The span this position points into.
    #[must_use]
    pub fn span<'a>(&self, spans: &'a [Span]) -> Option<&'a Span> {
        spans.get(self.span_index)
    }

    /// Environment of the span this position points into.
    #[must_use]
    pub fn env<'a>(&self, spans: &'a [Span]) -> Option<&'a Env> {
        self.span(spans).map(|s| &s.env)
    }

    /// Source-text range of the addressed characters, when the span element
    /// carries one.
    #[must_use]
    pub fn source_range(&self, spans: &[Span], tree: &ElTree) -> Option<(usize, usize)> {
        let span = self.span(spans)?;
        let (start, _) = tree.get(span.el).range?;
        Some((start + self.text_index, start + self.text_index + self.length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_caches_text() {
        let mut tree = ElTree::new("Sentence");
        let root = tree.root();
        tree.append(root, "甲乙");
        let span = Span::new(0, root, Env::new(None), &tree);
        assert_eq!(span.text, "甲乙");
        assert_eq!(span.current_text(&tree), "甲乙");
    }

    #[test]
    fn test_pos_source_range() {
        let mut tree = ElTree::new("Sentence");
        let root = tree.root();
        tree.append(root, "甲乙丙");
        tree.get_mut(root).range = Some((10, 13));
        let spans = vec![Span::new(0, root, Env::new(None), &tree)];
        let pos = SpanTextPos::new(0, 1, 2);
        assert_eq!(pos.source_range(&spans, &tree), Some((11, 13)));
        assert!(pos.env(&spans).is_some());
        assert!(SpanTextPos::new(4, 0, 1).span(&spans).is_none());
    }
}
