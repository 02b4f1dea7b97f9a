//! Variable-reference resolution.
//!
//! Every literal occurrence of a declared term inside the term's scope is
//! rewritten into a `____VarRef` node pointing back at the declaration.

use serde::Serialize;

use crate::declaration::{Declaration, Declarations};
use crate::el::control::{NodeKind, ParenthesesType, VAR_REF};
use crate::el::{char_find, char_len, Child, ElTree, NodeId};
use crate::span::{Span, SpanTextPos};

/// A resolved occurrence of a declared term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarRef {
    pub ref_name: String,
    /// Index of the declaration in its registry.
    pub declaration_index: usize,
    pub ref_pos: SpanTextPos,
    /// The `____VarRef` node.
    pub el: NodeId,
}

/// Resolve references for all spans.
///
/// For each span, declarations in scope are tried in registry order, and
/// each one's matches are spliced before the next declaration is scanned.
pub fn detect_variable_references(
    tree: &mut ElTree,
    spans: &[Span],
    declarations: &Declarations,
) -> Vec<VarRef> {
    let mut var_refs = Vec::new();
    for span in spans {
        if is_defining_position(tree, span) {
            continue;
        }
        for declaration in declarations.iterate(span.index) {
            resolve_in_span(tree, span, declaration, &mut var_refs);
        }
    }
    tracing::debug!(count = var_refs.len(), "Resolved variable references");
    var_refs
}

/// Spans directly inside `「…」` are the literal names being defined.
fn is_defining_position(tree: &ElTree, span: &Span) -> bool {
    span.env.parent().is_some_and(|parent| {
        NodeKind::of(tree, parent) == NodeKind::PContent(Some(ParenthesesType::Square))
    })
}

fn resolve_in_span(tree: &mut ElTree, span: &Span, declaration: &Declaration, out: &mut Vec<VarRef>) {
    let name_len = char_len(&declaration.name);
    if name_len == 0 {
        return;
    }

    let mut cursor = text_start(declaration, span.index);
    while let Some(index) = find_plain(tree, span.el, &declaration.name, cursor) {
        let node = tree.create_with(
            VAR_REF,
            [("ref_declaration_index", declaration.declaration_index.to_string())],
            [Child::Text(declaration.name.clone())],
        );
        if let Err(e) = tree.replace_span(span.el, index, index + name_len, node) {
            tracing::warn!(error = %e, name = %declaration.name, "Rejected splice");
            break;
        }
        tracing::trace!(
            span = span.index,
            index,
            declaration = declaration.declaration_index,
            "Resolved reference"
        );
        out.push(VarRef {
            ref_name: declaration.name.clone(),
            declaration_index: declaration.declaration_index,
            ref_pos: SpanTextPos::new(span.index, index, name_len),
            el: node,
        });
        cursor = index + name_len;
    }
}

/// First offset inside the span where the declaration is in effect.
fn text_start(declaration: &Declaration, span_index: usize) -> usize {
    declaration
        .scope
        .iter()
        .filter(|r| r.contains_span(span_index))
        .map(|r| {
            if r.start_span_index == span_index {
                r.start_text_index
            } else {
                0
            }
        })
        .min()
        .unwrap_or(0)
}

/// Offset of the first occurrence of `needle` at or after `from` that lies
/// entirely inside one plain text run of `el`.
fn find_plain(tree: &ElTree, el: NodeId, needle: &str, from: usize) -> Option<usize> {
    tree.plain_segments(el).into_iter().find_map(|(offset, text)| {
        let local_from = from.saturating_sub(offset);
        if local_from > char_len(text) {
            return None;
        }
        char_find(text, needle, local_from).map(|i| offset + i)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::declaration::{DeclarationType, ScopeRange};
    use crate::detect::test_support::{law_with_articles, prepare};
    use crate::detect::{detect_declarations, DetectContext};
    use crate::el::control::DECLARATION;
    use crate::lawnum_table::LAWNUM_TABLE;
    use pretty_assertions::assert_eq;

    fn run(xml: &str) -> (ElTree, Vec<Span>, Declarations, Vec<VarRef>) {
        let (mut tree, extracted, config) = prepare(xml);
        let ctx = DetectContext {
            spans: &extracted.spans,
            containers: &extracted.container_tree,
            config: &config,
            table: &LAWNUM_TABLE,
        };
        let declarations = detect_declarations(&mut tree, &ctx);
        let var_refs = detect_variable_references(&mut tree, &extracted.spans, &declarations);
        (tree, extracted.spans, declarations, var_refs)
    }

    #[test]
    fn test_reference_after_definition() {
        let xml = law_with_articles(&["電子計算機（以下「計算機」という。）を用いる。", "この計算機は"]);
        let (tree, _, declarations, var_refs) = run(&xml);

        assert_eq!(declarations.len(), 1);
        assert_eq!(var_refs.len(), 1);
        assert_eq!(var_refs[0].ref_pos, SpanTextPos::new(9, 2, 3));
        assert_eq!(tree.attr(var_refs[0].el, "ref_declaration_index"), Some("0"));
        assert_eq!(tree.text(var_refs[0].el), "計算機");
    }

    #[test]
    fn test_defining_occurrence_is_not_a_reference() {
        let xml = law_with_articles(&["計算機（以下「計算機」という。）"]);
        let (_, _, declarations, var_refs) = run(&xml);
        assert_eq!(declarations.len(), 1);
        // The leading 計算機 precedes the scope; the bracketed one defines it.
        assert!(var_refs.is_empty());
    }

    #[test]
    fn test_text_start_in_first_span() {
        let xml = law_with_articles(&["電子計算機（以下「計算機」という。計算機は別とする。）"]);
        // という。計算機は別とする。 is one span; the scope starts at offset 4.
        let (_, _, _, var_refs) = run(&xml);
        assert_eq!(var_refs.len(), 1);
        assert_eq!(var_refs[0].ref_pos.text_index, 4);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let xml = law_with_articles(&["甲（以下「甲甲」という。）", "甲甲甲の甲甲"]);
        let (_, spans, _, var_refs) = run(&xml);
        let last = spans.len() - 1;
        let positions: Vec<_> = var_refs
            .iter()
            .filter(|r| r.ref_pos.span_index == last)
            .map(|r| r.ref_pos.text_index)
            .collect();
        assert_eq!(positions, vec![0, 4]);
    }

    #[test]
    fn test_earlier_declaration_spliced_first() {
        let xml = law_with_articles(&[
            "電子情報処理組織（以下「組織」という。）",
            "情報処理の体制（以下「情報処理組織」という。）",
            "情報処理組織を使用する。",
        ]);
        let (tree, spans, declarations, var_refs) = run(&xml);
        let names: Vec<_> = declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["組織", "情報処理組織"]);

        // 組織 (declared first) is spliced out of the last span first, so
        // 情報処理組織 no longer occurs as plain text there.
        let last = spans.len() - 1;
        let in_last: Vec<_> = var_refs
            .iter()
            .filter(|r| r.ref_pos.span_index == last)
            .map(|r| (r.ref_name.as_str(), r.ref_pos.text_index))
            .collect();
        assert_eq!(in_last, vec![("組織", 4)]);
        assert_eq!(tree.text(spans[last].el), "情報処理組織を使用する。");
    }

    #[test]
    fn test_out_of_scope_span_is_untouched() {
        let mut tree = ElTree::new("Law");
        let root = tree.root();
        let first = tree.create_with("__Text", Vec::<(String, String)>::new(), [Child::from("甲乙")]);
        let second = tree.create_with("__Text", Vec::<(String, String)>::new(), [Child::from("甲乙")]);
        tree.append(root, first);
        tree.append(root, second);
        let mut extracted = crate::extract::extract_spans(&mut tree, &AnalysisConfig::default());
        let spans = std::mem::take(&mut extracted.spans);

        let mut declarations = Declarations::new();
        let d = Declaration::new(
            &mut tree,
            DeclarationType::LawName,
            "乙",
            None,
            vec![ScopeRange::new(1, 0, 2, 0)],
            SpanTextPos::new(0, 1, 1),
        );
        declarations.add(&mut tree, d);
        let var_refs = detect_variable_references(&mut tree, &spans, &declarations);

        assert_eq!(var_refs.len(), 1);
        assert_eq!(var_refs[0].ref_pos, SpanTextPos::new(1, 1, 1));
        assert!(tree.children(first).iter().all(|c| c.as_text().is_some()));
        assert!(tree
            .descendants(second)
            .all(|id| tree.tag(id) != DECLARATION));
    }
}
