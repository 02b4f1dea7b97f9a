//! List-form definitions.
//!
//! Two shapes:
//!
//! - a bracket enumeration sharing one `という。`:
//!   `（以下それぞれ「甲」、「乙」及び「丙」という。）`;
//! - a definition-item list, where each item's first column is the term:
//!   `この法律において、次の各号に掲げる用語の意義は、当該各号に定めるところによる。`

use std::sync::LazyLock;

use regex::Regex;

use super::scope::{parse_list_scope_marker, resolve_scope};
use super::{all_plain, is_bracket, splice, DetectContext, TEIU};
use crate::declaration::{Declaration, DeclarationType, ScopeRange};
use crate::el::control::{ParenthesesType, P_END, P_START};
use crate::el::{char_len, ElTree};
use crate::range::TextPos;
use crate::span::{Span, SpanTextPos};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:、|及び|並びに|又は)+$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DEFINITION_ITEMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(.+?)において、?)?次の各号に掲げる用語の意義は、.*?当該各号に定めるところによる。")
        .expect("valid regex")
});

/// Detect list-form definitions starting at `span_index`.
pub fn detect_name_list(tree: &mut ElTree, ctx: &DetectContext<'_>, span_index: usize) -> Vec<Declaration> {
    let mut found = detect_bracket_list(tree, ctx, span_index);
    found.extend(detect_definition_items(tree, ctx, span_index));
    found
}

fn detect_bracket_list(tree: &mut ElTree, ctx: &DetectContext<'_>, span_index: usize) -> Vec<Declaration> {
    let spans = ctx.spans;
    let Some(before_span) = spans.get(span_index) else {
        return Vec::new();
    };
    let Some(marker) = parse_list_scope_marker(&before_span.text) else {
        return Vec::new();
    };

    let mut names: Vec<&Span> = Vec::new();
    let mut next = span_index + 1;
    let after_span = loop {
        let (Some(start), Some(name), Some(end)) = (spans.get(next), spans.get(next + 1), spans.get(next + 2))
        else {
            return Vec::new();
        };
        if !(is_bracket(tree, start, P_START, ParenthesesType::Square)
            && is_bracket(tree, end, P_END, ParenthesesType::Square))
        {
            return Vec::new();
        }
        names.push(name);
        next += 3;

        let Some(following) = spans.get(next) else {
            return Vec::new();
        };
        if following.text.starts_with(TEIU) {
            break following;
        }
        if !LIST_SEPARATOR.is_match(&following.text) {
            return Vec::new();
        }
        next += 1;
    };

    if names.len() < 2 {
        return Vec::new();
    }
    let ranges: Vec<_> = names
        .iter()
        .map(|s| (s.el, 0, char_len(&s.text)))
        .collect();
    if !all_plain(tree, &ranges) {
        return Vec::new();
    }

    let cut = TextPos::new(after_span.index, char_len(TEIU));
    let scope = match &marker.qualifier {
        Some(qualifier) => resolve_scope(ctx, before_span, qualifier, marker.following, cut),
        None => vec![ScopeRange::rest_of_document(cut.index, cut.offset, spans.len())],
    };

    names
        .into_iter()
        .map(|name_span| {
            let len = char_len(&name_span.text);
            let declaration = Declaration::new(
                tree,
                DeclarationType::Keyword,
                name_span.text.clone(),
                None,
                scope.clone(),
                SpanTextPos::new(name_span.index, 0, len),
            );
            splice(tree, name_span.el, 0, len, declaration.el);
            declaration
        })
        .collect()
}

fn detect_definition_items(tree: &mut ElTree, ctx: &DetectContext<'_>, span_index: usize) -> Vec<Declaration> {
    let spans = ctx.spans;
    let Some(span) = spans.get(span_index) else {
        return Vec::new();
    };
    let Some(caps) = DEFINITION_ITEMS.captures(&span.text) else {
        return Vec::new();
    };
    let qualifier = caps.get(1).map(|m| m.as_str().to_string());
    let Some(container) = span.env.container() else {
        return Vec::new();
    };

    let terms: Vec<&Span> = ctx
        .containers
        .get(container)
        .children
        .iter()
        .map(|c| ctx.containers.get(*c))
        .filter(|c| c.tag == "Item" && c.range.0 < c.range.1)
        .filter_map(|item| spans.get(item.range.0))
        .filter(|term| {
            term.env.parents.iter().any(|p| tree.tag(*p) == "Column")
                && !term.text.is_empty()
                && tree.is_plain_range(term.el, 0, char_len(&term.text))
        })
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let cut = TextPos::new(span.index, 0);
    let scope = match &qualifier {
        Some(qualifier) => resolve_scope(ctx, span, qualifier, false, cut),
        None => vec![ScopeRange::rest_of_document(cut.index, cut.offset, spans.len())],
    };

    terms
        .into_iter()
        .map(|term| {
            let len = char_len(&term.text);
            let declaration = Declaration::new(
                tree,
                DeclarationType::Keyword,
                term.text.clone(),
                None,
                scope.clone(),
                SpanTextPos::new(term.index, 0, len),
            );
            splice(tree, term.el, 0, len, declaration.el);
            declaration
        })
        .collect()
}
