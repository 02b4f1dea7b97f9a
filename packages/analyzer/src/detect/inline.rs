//! Terms defined inline: `電子計算機（以下「計算機」という。）`.

use super::scope::{parse_scope_marker, resolve_scope};
use super::{all_plain, is_bracket, splice, DetectContext, TEIU};
use crate::declaration::{Declaration, DeclarationType, ScopeRange};
use crate::el::control::{ParenthesesType, P_END, P_START};
use crate::el::{char_len, ElTree};
use crate::range::TextPos;
use crate::span::SpanTextPos;

/// Detect `[before]「[name]」という。` starting at `span_index`.
///
/// An optional `以下` and `…において` clause at the end of `before` set the
/// scope; without a clause the term is in effect from right after
/// `という。` to the end of the document.
pub fn detect_name_inline(tree: &mut ElTree, ctx: &DetectContext<'_>, span_index: usize) -> Option<Declaration> {
    let spans = ctx.spans;
    if spans.len() < span_index + 5 {
        return None;
    }
    let [before_span, start_span, name_span, end_span, after_span] = &spans[span_index..span_index + 5] else {
        return None;
    };

    if !(is_bracket(tree, start_span, P_START, ParenthesesType::Square)
        && is_bracket(tree, end_span, P_END, ParenthesesType::Square)
        && after_span.text.starts_with(TEIU))
    {
        return None;
    }

    let name_len = char_len(&name_span.text);
    if !all_plain(tree, &[(name_span.el, 0, name_len)]) {
        return None;
    }

    let marker = parse_scope_marker(&before_span.text);
    let cut = TextPos::new(after_span.index, char_len(TEIU));
    let scope = match &marker.qualifier {
        Some(qualifier) => resolve_scope(ctx, before_span, qualifier, marker.following, cut),
        None => vec![ScopeRange::rest_of_document(cut.index, cut.offset, spans.len())],
    };

    let declaration = Declaration::new(
        tree,
        DeclarationType::LawName,
        name_span.text.clone(),
        None,
        scope,
        SpanTextPos::new(name_span.index, 0, name_len),
    );
    splice(tree, name_span.el, 0, name_len, declaration.el);
    Some(declaration)
}
