//! Declaration detection.
//!
//! Three pattern families run at every span index:
//!
//! 1. [`lawname`]: `法律名（平成…号）` and `法律名（平成…号。以下「略称」という。）`;
//! 2. [`inline`]: `（以下「用語」という。）`;
//! 3. [`list`]: `以下それぞれ「甲」及び「乙」という。` and definition-item lists.
//!
//! The first two are exclusive per position (law names win); the list
//! detector runs independently and may add several declarations. Every
//! match rewrites the matched characters into `____Declaration` (and
//! `____DeclarationVal` / `____LawNum`) nodes in place.
//!
//! A detector only rewrites characters that are still plain text, so
//! running detection again over an annotated tree finds nothing new.

pub mod inline;
pub mod lawname;
pub mod list;
pub mod scope;

use crate::config::AnalysisConfig;
use crate::container::ContainerTree;
use crate::declaration::Declarations;
use crate::el::control::ParenthesesType;
use crate::el::{ElTree, NodeId};
use crate::lawnum_table::LawNumTable;
use crate::span::Span;

/// Text that closes an inline definition.
pub(crate) const TEIU: &str = "という。";

/// Read-only inputs shared by all detectors.
#[derive(Debug, Clone, Copy)]
pub struct DetectContext<'a> {
    pub spans: &'a [Span],
    pub containers: &'a ContainerTree,
    pub config: &'a AnalysisConfig,
    pub table: &'a LawNumTable,
}

/// Run all detectors over the span sequence.
pub fn detect_declarations(tree: &mut ElTree, ctx: &DetectContext<'_>) -> Declarations {
    let mut declarations = Declarations::new();

    for span_index in 0..ctx.spans.len() {
        let found = lawname::detect_lawname(tree, ctx, span_index)
            .or_else(|| inline::detect_name_inline(tree, ctx, span_index));
        if let Some(declaration) = found {
            declarations.add(tree, declaration);
        }

        for declaration in list::detect_name_list(tree, ctx, span_index) {
            declarations.add(tree, declaration);
        }
    }

    tracing::debug!(count = declarations.len(), "Detected declarations");
    declarations
}

/// Whether the span element is the given bracket part (`__PStart` /
/// `__PEnd`) of the given bracket family.
pub(crate) fn is_bracket(tree: &ElTree, span: &Span, tag: &str, ptype: ParenthesesType) -> bool {
    tree.tag(span.el) == tag && tree.attr(span.el, "type") == Some(ptype.as_str())
}

/// Whether every `(element, start, end)` range is still plain text.
pub(crate) fn all_plain(tree: &ElTree, ranges: &[(NodeId, usize, usize)]) -> bool {
    let plain = ranges
        .iter()
        .all(|&(el, start, end)| start < end && tree.is_plain_range(el, start, end));
    if !plain {
        tracing::debug!("Match overlaps annotated text, skipping");
    }
    plain
}

/// Splice `node` over `[start, end)` of `el`, logging a rejected splice.
pub(crate) fn splice(tree: &mut ElTree, el: NodeId, start: usize, end: usize, node: NodeId) -> bool {
    match tree.replace_span(el, start, end, node) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected splice");
            false
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{law_with_articles, prepare};
    use super::*;
    use crate::declaration::DeclarationType;
    use crate::lawnum_table::LAWNUM_TABLE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_declarations_indexed_in_document_order() {
        let xml = law_with_articles(&[
            "行政手続法（平成五年法律第八十八号）を適用する。",
            "電子計算機（以下「計算機」という。）を用いる。",
        ]);
        let (mut tree, extracted, config) = prepare(&xml);
        let ctx = DetectContext {
            spans: &extracted.spans,
            containers: &extracted.container_tree,
            config: &config,
            table: &LAWNUM_TABLE,
        };
        let declarations = detect_declarations(&mut tree, &ctx);

        let found: Vec<_> = declarations
            .iter()
            .map(|d| (d.declaration_index, d.name.as_str(), d.declaration_type))
            .collect();
        assert_eq!(
            found,
            vec![
                (0, "行政手続法", DeclarationType::LawName),
                (1, "計算機", DeclarationType::LawName),
            ]
        );
    }

    #[test]
    fn test_detection_is_idempotent() {
        let xml = law_with_articles(&["電子計算機（以下「計算機」という。）を用いる。"]);
        let (mut tree, extracted, config) = prepare(&xml);
        let ctx = DetectContext {
            spans: &extracted.spans,
            containers: &extracted.container_tree,
            config: &config,
            table: &LAWNUM_TABLE,
        };
        assert_eq!(detect_declarations(&mut tree, &ctx).len(), 1);
        let node_count = tree.len();

        let again = crate::extract::extract_spans(&mut tree, &config);
        let ctx = DetectContext {
            spans: &again.spans,
            containers: &again.container_tree,
            config: &config,
            table: &LAWNUM_TABLE,
        };
        assert_eq!(detect_declarations(&mut tree, &ctx).len(), 0);
        assert_eq!(tree.len(), node_count);
    }
}
