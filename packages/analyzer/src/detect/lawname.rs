//! Law names followed by their law number.
//!
//! ```text
//! 行政手続法（平成五年法律第八十八号）
//! 行政機関の保有する情報の公開に関する法律（平成十一年法律第四十二号。以下「情報公開法」という。）
//! ```
//!
//! Where the name begins is not marked in the text; its length comes from
//! the [`LawNumTable`](crate::lawnum_table::LawNumTable).

use std::sync::LazyLock;

use regex::Regex;

use super::scope::{parse_scope_marker_strict, resolve_scope};
use super::{all_plain, is_bracket, splice, DetectContext, TEIU};
use crate::config::LAW_NUM_PATTERN;
use crate::declaration::{Declaration, DeclarationType, ScopeRange};
use crate::el::control::{new_law_num, ParenthesesType, DECLARATION_VAL, P_END, P_START};
use crate::el::{char_len, char_slice, Child, ElTree};
use crate::range::TextPos;
use crate::span::SpanTextPos;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LAW_NUM_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{LAW_NUM_PATTERN}")).expect("valid regex"));

/// Detect a law name at `span_index`.
pub fn detect_lawname(tree: &mut ElTree, ctx: &DetectContext<'_>, span_index: usize) -> Option<Declaration> {
    let spans = ctx.spans;
    if spans.len() <= span_index + 3 {
        return None;
    }
    let (lawname_span, start_span, lawnum_span) =
        (&spans[span_index], &spans[span_index + 1], &spans[span_index + 2]);

    if !is_bracket(tree, start_span, P_START, ParenthesesType::Round) {
        return None;
    }

    let law_num = LAW_NUM_PREFIX.find(&lawnum_span.text)?.as_str();
    let law_num_len = char_len(law_num);
    let lawname_length = ctx.table.get_law_name_length(law_num)?;
    let lawname_text_len = char_len(&lawname_span.text);
    if lawname_length == 0 || lawname_length > lawname_text_len {
        return None;
    }
    let lawname_index = lawname_text_len - lawname_length;
    let law_name = char_slice(&lawname_span.text, lawname_index, lawname_text_len).to_string();
    let lawnum_text_len = char_len(&lawnum_span.text);

    if lawnum_text_len <= law_num_len && lawnum_span.index + 1 < spans.len() {
        let after_span = &spans[lawnum_span.index + 1];
        if !is_bracket(tree, after_span, P_END, ParenthesesType::Round) {
            return None;
        }
        if !all_plain(
            tree,
            &[
                (lawname_span.el, lawname_index, lawname_text_len),
                (lawnum_span.el, 0, law_num_len),
            ],
        ) {
            return None;
        }

        let scope = vec![ScopeRange::rest_of_document(after_span.index + 1, 0, spans.len())];
        let declaration = Declaration::new(
            tree,
            DeclarationType::LawName,
            law_name,
            Some(law_num.to_string()),
            scope,
            SpanTextPos::new(lawname_span.index, lawname_index, lawname_length),
        );
        let lawnum_el = new_law_num(tree, law_num);
        splice(tree, lawname_span.el, lawname_index, lawname_text_len, declaration.el);
        splice(tree, lawnum_span.el, 0, law_num_len, lawnum_el);
        return Some(declaration);
    }

    let rest = char_slice(&lawnum_span.text, law_num_len, lawnum_text_len);
    let scope_text = rest.strip_prefix('。')?;
    if lawnum_span.index + 5 >= spans.len() {
        return None;
    }
    let (name_start_span, name_span, name_end_span, name_after_span) = (
        &spans[lawnum_span.index + 1],
        &spans[lawnum_span.index + 2],
        &spans[lawnum_span.index + 3],
        &spans[lawnum_span.index + 4],
    );

    let marker = parse_scope_marker_strict(scope_text)?;
    if !(is_bracket(tree, name_start_span, P_START, ParenthesesType::Square)
        && is_bracket(tree, name_end_span, P_END, ParenthesesType::Square)
        && name_after_span.text.starts_with(TEIU))
    {
        return None;
    }

    let name_len = char_len(&name_span.text);
    if !all_plain(
        tree,
        &[
            (lawname_span.el, lawname_index, lawname_text_len),
            (name_span.el, 0, name_len),
            (lawnum_span.el, 0, law_num_len),
        ],
    ) {
        return None;
    }

    let scope = match &marker.qualifier {
        Some(qualifier) => resolve_scope(
            ctx,
            lawnum_span,
            qualifier,
            marker.following,
            TextPos::new(name_after_span.index, 0),
        ),
        None => vec![ScopeRange::rest_of_document(name_after_span.index, 0, spans.len())],
    };

    let declaration = Declaration::new(
        tree,
        DeclarationType::LawName,
        name_span.text.clone(),
        Some(law_num.to_string()),
        scope,
        SpanTextPos::new(name_span.index, 0, name_len),
    );
    let value_el = tree.create_with(
        DECLARATION_VAL,
        Vec::<(String, String)>::new(),
        [Child::Text(law_name)],
    );
    let lawnum_el = new_law_num(tree, law_num);
    splice(tree, lawname_span.el, lawname_index, lawname_text_len, value_el);
    splice(tree, name_span.el, 0, name_len, declaration.el);
    splice(tree, lawnum_span.el, 0, law_num_len, lawnum_el);
    Some(declaration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::test_support::{law_with_articles, prepare};
    use crate::el::control::NodeKind;
    use crate::lawnum_table::{LawNumTable, LAWNUM_TABLE};
    use pretty_assertions::assert_eq;

    fn detect_at(xml: &str, table: &LawNumTable, span_index: usize) -> (ElTree, Option<Declaration>, usize) {
        let (mut tree, extracted, config) = prepare(xml);
        let ctx = DetectContext {
            spans: &extracted.spans,
            containers: &extracted.container_tree,
            config: &config,
            table,
        };
        let found = detect_lawname(&mut tree, &ctx, span_index);
        (tree, found, extracted.spans.len())
    }

    #[test]
    fn test_closed_law_number() {
        let mut table = LawNumTable::new();
        table.insert_law("平成二十六年政令第三百九十四号", "行政不服審査法施行令");
        let xml = law_with_articles(&[
            "行政不服審査法施行令（平成二十六年政令第三百九十四号）の規定による。",
            "施行令を適用する。",
        ]);
        let (tree, found, span_count) = detect_at(&xml, &table, 0);
        let declaration = found.unwrap();

        assert_eq!(declaration.name, "行政不服審査法施行令");
        assert_eq!(declaration.value.as_deref(), Some("平成二十六年政令第三百九十四号"));
        assert_eq!(declaration.scope, vec![ScopeRange::new(4, 0, span_count, 0)]);
        assert_eq!(declaration.name_pos, SpanTextPos::new(0, 0, 10));
        assert_eq!(NodeKind::of(&tree, declaration.el), NodeKind::Declaration);
    }

    #[test]
    fn test_name_length_from_table_trims_leading_text() {
        let xml = law_with_articles(&["この法律は、行政手続法（平成五年法律第八十八号）による。"]);
        let (tree, found, _) = detect_at(&xml, &LAWNUM_TABLE, 0);
        let declaration = found.unwrap();
        assert_eq!(declaration.name, "行政手続法");
        assert_eq!(declaration.name_pos.text_index, 6);

        let law_nums: Vec<_> = tree
            .descendants(tree.root())
            .filter(|id| NodeKind::of(&tree, *id) == NodeKind::LawNum)
            .map(|id| tree.text(id))
            .collect();
        assert_eq!(law_nums, vec!["平成五年法律第八十八号"]);
    }

    #[test]
    fn test_table_miss_is_no_match() {
        let xml = law_with_articles(&["未知法（令和九十九年法律第一号）による。"]);
        let (_, found, _) = detect_at(&xml, &LAWNUM_TABLE, 0);
        assert!(found.is_none());
    }

    #[test]
    fn test_aliased_law_name() {
        let xml = law_with_articles(&[
            "行政機関の保有する情報の公開に関する法律（平成十一年法律第四十二号。以下「情報公開法」という。）",
            "情報公開法の規定による。",
        ]);
        let (tree, found, span_count) = detect_at(&xml, &LAWNUM_TABLE, 0);
        let declaration = found.unwrap();

        assert_eq!(declaration.name, "情報公開法");
        assert_eq!(declaration.value.as_deref(), Some("平成十一年法律第四十二号"));
        // 0 name, 1 （, 2 number, 3 「, 4 alias, 5 」, 6 という。
        assert_eq!(declaration.name_pos, SpanTextPos::new(4, 0, 5));
        assert_eq!(declaration.scope, vec![ScopeRange::new(6, 0, span_count, 0)]);

        let value = tree
            .descendants(tree.root())
            .find(|id| NodeKind::of(&tree, *id) == NodeKind::DeclarationVal)
            .unwrap();
        assert_eq!(tree.text(value), "行政機関の保有する情報の公開に関する法律");
    }

    #[test]
    fn test_aliased_law_name_with_scope_qualifier() {
        let xml = law_with_articles(&[
            "会社法（平成十七年法律第八十六号。以下この条において「法」という。）の規定",
            "法の規定",
        ]);
        let (_, found, _) = detect_at(&xml, &LAWNUM_TABLE, 0);
        let declaration = found.unwrap();
        assert_eq!(declaration.name, "法");
        // Clipped to this article, from the span after the alias.
        assert_eq!(declaration.scope, vec![ScopeRange::new(6, 0, 9, 0)]);
    }

    #[test]
    fn test_requires_round_bracket() {
        let xml = law_with_articles(&["行政手続法「平成五年法律第八十八号」による。"]);
        let (_, found, _) = detect_at(&xml, &LAWNUM_TABLE, 0);
        assert!(found.is_none());
    }
}
