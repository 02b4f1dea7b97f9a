//! Scope clauses (`以下この章において`, ...) and their resolution to
//! container ranges.

use std::sync::LazyLock;

use regex::Regex;

use super::DetectContext;
use crate::config::{QualifierTarget, ARTICLES_CONTAINER_TAGS};
use crate::container::{Container, ContainerId, ContainerType};
use crate::declaration::ScopeRange;
use crate::numeral::num_to_attr;
use crate::range::{container_ranges, ContainerRef, TextPos};
use crate::span::Span;

/// Trailing scope clause of the text before a defined term.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SCOPE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(以下)?(?:([^。]+?)において)?(?:単に)?$").expect("valid regex")
});

/// Same clause, required to make up the whole text.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SCOPE_MARKER_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(以下)?(?:([^。]+?)において)?(?:単に)?$").expect("valid regex")
});

/// Scope clause preceding a bracket enumeration.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LIST_SCOPE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(以下)?(?:([^。]+?)において)?(?:単に)?それぞれ$").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static QUALIFIER_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"、|及び|並びに").expect("valid regex"));

/// `第三条` or `第三条から第五条まで`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^第([〇一二三四五六七八九十百千]+(?:の[〇一二三四五六七八九十百千]+)*)条(?:から第([〇一二三四五六七八九十百千]+(?:の[〇一二三四五六七八九十百千]+)*)条まで)?$",
    )
    .expect("valid regex")
});

/// Parsed scope clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMarker {
    /// `以下` was present: the scope starts at the definition.
    pub following: bool,
    /// Text before `において`, naming the region.
    pub qualifier: Option<String>,
}

impl ScopeMarker {
    fn from_captures(caps: &regex::Captures<'_>) -> Self {
        Self {
            following: caps.get(1).is_some(),
            qualifier: caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .filter(|q| !q.is_empty()),
        }
    }
}

/// Parse the scope clause at the end of `text`. Always succeeds; text
/// without a clause gives an empty marker.
///
/// # Examples
/// ```
/// use lawtext_analyzer::detect::scope::parse_scope_marker;
///
/// let marker = parse_scope_marker("以下この章において");
/// assert!(marker.following);
/// assert_eq!(marker.qualifier.as_deref(), Some("この章"));
/// ```
#[must_use]
pub fn parse_scope_marker(text: &str) -> ScopeMarker {
    SCOPE_MARKER
        .captures(text)
        .map(|caps| ScopeMarker::from_captures(&caps))
        .unwrap_or(ScopeMarker {
            following: false,
            qualifier: None,
        })
}

/// Parse a text consisting of nothing but a scope clause.
#[must_use]
pub fn parse_scope_marker_strict(text: &str) -> Option<ScopeMarker> {
    SCOPE_MARKER_STRICT
        .captures(text)
        .map(|caps| ScopeMarker::from_captures(&caps))
}

/// Parse a scope clause ending in `それぞれ`, as used before an enumeration.
#[must_use]
pub fn parse_list_scope_marker(text: &str) -> Option<ScopeMarker> {
    LIST_SCOPE_MARKER
        .captures(text)
        .map(|caps| ScopeMarker::from_captures(&caps))
}

/// Resolve a qualifier such as `この章` or `この条及び次条` to scope ranges.
///
/// `span` is the span carrying the clause; its innermost container is the
/// origin for relative qualifiers. When `following` is set, everything
/// before `cut` is clipped. If no part of the qualifier resolves, the
/// scope is the rest of the document from `cut`.
#[must_use]
pub fn resolve_scope(
    ctx: &DetectContext<'_>,
    span: &Span,
    qualifier: &str,
    following: bool,
    cut: TextPos,
) -> Vec<ScopeRange> {
    let origin = span.env.container().or_else(|| ctx.containers.root());
    let refs: Vec<ContainerRef> = match origin {
        Some(origin) => QUALIFIER_SEPARATOR
            .split(qualifier)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| resolve_part(ctx, origin, part))
            .collect(),
        None => Vec::new(),
    };

    if refs.is_empty() {
        tracing::debug!(qualifier, "Unresolved scope qualifier, using rest of document");
        return vec![ScopeRange::rest_of_document(cut.index, cut.offset, ctx.spans.len())];
    }

    container_ranges(ctx.containers, &refs, following.then_some(cut))
        .into_iter()
        .map(|r| ScopeRange::new(r.start.index, r.start.offset, r.end.index, r.end.offset))
        .collect()
}

fn resolve_part(ctx: &DetectContext<'_>, origin: ContainerId, part: &str) -> Option<ContainerRef> {
    let containers = ctx.containers;
    let is_article = |c: &Container| c.tag == "Article";

    if let Some(rule) = ctx.config.rule_for(part) {
        return match &rule.target {
            QualifierTarget::Law => containers.root().map(ContainerRef::One),
            QualifierTarget::Container(tag) => {
                let has_tag = |c: &Container| c.tag == *tag;
                let found = if ARTICLES_CONTAINER_TAGS.contains(&tag.as_str()) {
                    containers.this_or_closest(origin, has_tag)
                } else {
                    containers.this_or_closest_sub(origin, has_tag)
                };
                found.map(ContainerRef::One)
            }
        };
    }

    match part {
        "前条" => {
            let article = containers.this_or_closest(origin, is_article)?;
            containers.prev_sub(article, is_article).map(ContainerRef::One)
        }
        "次条" => {
            let article = containers.this_or_closest(origin, is_article)?;
            containers.next_sub(article, is_article).map(ContainerRef::One)
        }
        _ => {
            let caps = ARTICLE_QUALIFIER.captures(part)?;
            let toplevel = containers.this_or_closest(origin, |c| {
                matches!(c.container_type, ContainerType::Toplevel | ContainerType::Root)
            })?;
            let from = find_article(ctx, toplevel, caps.get(1)?.as_str())?;
            match caps.get(2) {
                Some(to) => {
                    let to = find_article(ctx, toplevel, to.as_str())?;
                    Some(ContainerRef::Through(from, to))
                }
                None => Some(ContainerRef::One(from)),
            }
        }
    }
}

fn find_article(ctx: &DetectContext<'_>, within: ContainerId, kanji: &str) -> Option<ContainerId> {
    let num = num_to_attr(kanji)?;
    ctx.containers
        .find(within, |c| c.tag == "Article" && c.num.as_deref() == Some(num.as_str()))
}
