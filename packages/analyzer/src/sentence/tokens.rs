//! Law-number and pointer tokens in sentence text.
//!
//! Plain text inside `__Text` nodes is scanned in two passes per sentence:
//! law numbers (`平成五年法律第八十八号`) first, then pointer ranges such as
//! `第三条第二項`, `前条`, `この章` or `第五条から第七条まで`, joined by
//! `、`, `及び`, `並びに`, `又は` or `若しくは`.
//!
//! A pointer range is rewritten into
//!
//! ```text
//! ____PointerRanges
//! └── ____PointerRange ("、" ...)
//!     └── ____Pointer ("から" ____Pointer "まで")
//!         └── ____PF relPos targetType name num
//! ```
//!
//! Only plain text is scanned, so law numbers already claimed by law-name
//! detection and declared terms are never matched again.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::env::{SentenceEnv, SentenceEnvs};
use crate::config::LAW_NUM_PATTERN;
use crate::el::control::{new_law_num, LAW_NUM, POINTER, POINTER_FRAGMENT, POINTER_RANGE, POINTER_RANGES, TEXT};
use crate::el::{char_len, Child, ElTree, NodeId};
use crate::numeral::num_to_attr;

const KANJI_NUM: &str = "[〇一二三四五六七八九十百千]+";
const UNIT: &str = "[編章節款目条項号]";
const RANGE_SEPARATOR: &str = "(?:、|及び|並びに|又は|若しくは)";

/// Kanji that may directly follow a relative pointer such as `前条` or
/// `同項` (`前条各号`, `同項後段`, `前条中`, `前項本文`, `前条及び…`).
const POINTER_CONTINUATIONS: &[char] = &['各', '前', '後', '中', '本', '及', '並', '又', '若', '第', '以', '等'];

fn fragment_pattern() -> String {
    format!(
        "第{KANJI_NUM}{UNIT}(?:の{KANJI_NUM})*\
         |別表(?:第{KANJI_NUM})?\
         |附則\
         |同法\
         |[前次同]{UNIT}\
         |この(?:法律|政令|省令|規則|附則|編|章|節|款|目|条|項|号)\
         |本(?:条|項|号)"
    )
}

fn pointer_pattern() -> String {
    format!("(?:{})+", fragment_pattern())
}

fn range_pattern() -> String {
    let pointer = pointer_pattern();
    format!("{pointer}(?:から{pointer}まで)?")
}

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LAW_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(LAW_NUM_PATTERN).expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static POINTER_RANGES_RE: LazyLock<Regex> = LazyLock::new(|| {
    let range = range_pattern();
    Regex::new(&format!("{range}(?:{RANGE_SEPARATOR}{range})*")).expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static POINTER_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&range_pattern()).expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FRAGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&fragment_pattern()).expect("valid regex"));

/// Where a pointer fragment points, relative to the text containing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelPos {
    /// `この条`, `本項`.
    Here,
    /// `前条`.
    Prev,
    /// `次条`.
    Next,
    /// `同条`, `同法`.
    Same,
    /// `第三条`, `附則`, `別表第一`.
    Named,
}

impl RelPos {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Here => "HERE",
            Self::Prev => "PREV",
            Self::Next => "NEXT",
            Self::Same => "SAME",
            Self::Named => "NAMED",
        }
    }
}

impl fmt::Display for RelPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element kind a pointer fragment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetType {
    Law,
    Part,
    Chapter,
    Section,
    Subsection,
    Division,
    Article,
    Paragraph,
    Item,
    SupplProvision,
    AppdxTable,
}

impl TargetType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Law => "Law",
            Self::Part => "Part",
            Self::Chapter => "Chapter",
            Self::Section => "Section",
            Self::Subsection => "Subsection",
            Self::Division => "Division",
            Self::Article => "Article",
            Self::Paragraph => "Paragraph",
            Self::Item => "Item",
            Self::SupplProvision => "SupplProvision",
            Self::AppdxTable => "AppdxTable",
        }
    }

    fn from_unit(c: char) -> Option<Self> {
        match c {
            '編' => Some(Self::Part),
            '章' => Some(Self::Chapter),
            '節' => Some(Self::Section),
            '款' => Some(Self::Subsection),
            '目' => Some(Self::Division),
            '条' => Some(Self::Article),
            '項' => Some(Self::Paragraph),
            '号' => Some(Self::Item),
            _ => None,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a pointer, e.g. `第三条` in `第三条第二項`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerFragment {
    pub rel_pos: RelPos,
    pub target_type: TargetType,
    /// Literal text of the fragment.
    pub name: String,
    /// Normalized number (`3_2`) for named fragments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num: Option<String>,
}

impl PointerFragment {
    /// Classify the literal text of a fragment.
    ///
    /// # Examples
    /// ```
    /// use lawtext_analyzer::sentence::tokens::{PointerFragment, RelPos, TargetType};
    ///
    /// let f = PointerFragment::parse("第三条の二").unwrap();
    /// assert_eq!((f.rel_pos, f.target_type, f.num.as_deref()), (RelPos::Named, TargetType::Article, Some("3_2")));
    ///
    /// let f = PointerFragment::parse("前項").unwrap();
    /// assert_eq!((f.rel_pos, f.target_type), (RelPos::Prev, TargetType::Paragraph));
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (rel_pos, target_type, num) = if let Some(rest) = name.strip_prefix("この") {
            let target = match rest {
                "法律" | "政令" | "省令" | "規則" => TargetType::Law,
                "附則" => TargetType::SupplProvision,
                unit => single_unit(unit)?,
            };
            (RelPos::Here, target, None)
        } else if let Some(rest) = name.strip_prefix('本') {
            (RelPos::Here, single_unit(rest)?, None)
        } else if name == "同法" {
            (RelPos::Same, TargetType::Law, None)
        } else if name == "附則" {
            (RelPos::Named, TargetType::SupplProvision, None)
        } else if let Some(rest) = name.strip_prefix("別表") {
            let num = match rest.strip_prefix('第') {
                Some(n) => Some(num_to_attr(n)?),
                None => None,
            };
            (RelPos::Named, TargetType::AppdxTable, num)
        } else if let Some(rest) = name.strip_prefix('第') {
            let unit = rest.chars().find_map(TargetType::from_unit)?;
            (RelPos::Named, unit, Some(num_to_attr(rest)?))
        } else {
            let mut chars = name.chars();
            let rel_pos = match chars.next()? {
                '前' => RelPos::Prev,
                '次' => RelPos::Next,
                '同' => RelPos::Same,
                _ => return None,
            };
            (rel_pos, single_unit(chars.as_str())?, None)
        };
        Some(Self {
            rel_pos,
            target_type,
            name: name.to_string(),
            num,
        })
    }
}

fn single_unit(text: &str) -> Option<TargetType> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => TargetType::from_unit(c),
        _ => None,
    }
}

/// `from` alone, or `fromからtoまで`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerRangeToken {
    pub from: Vec<PointerFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<PointerFragment>>,
}

/// A law-number citation in a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LawNumToken {
    pub sentence_index: usize,
    /// Character range within the sentence text.
    pub range: (usize, usize),
    pub text: String,
    #[serde(skip)]
    pub el: NodeId,
}

/// A run of pointer ranges in a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerRangesToken {
    pub sentence_index: usize,
    pub range: (usize, usize),
    pub text: String,
    pub ranges: Vec<PointerRangeToken>,
    #[serde(skip)]
    pub el: NodeId,
}

/// Tokens found across all sentences, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tokens {
    pub law_nums: Vec<LawNumToken>,
    pub pointer_ranges: Vec<PointerRangesToken>,
}

/// Match law numbers and pointer ranges in every sentence.
pub fn detect_tokens(tree: &mut ElTree, envs: &SentenceEnvs) -> Tokens {
    let mut tokens = Tokens::default();
    for env in &envs.sentence_envs {
        let text_nodes: Vec<NodeId> = tree
            .descendants(env.el)
            .filter(|id| tree.tag(*id) == TEXT)
            .collect();

        for &text_el in &text_nodes {
            while let Some((start, end, law_num)) = find_plain(tree, text_el, &LAW_NUM_RE) {
                let node = new_law_num(tree, law_num.as_str());
                if !splice(tree, text_el, start, end, node) {
                    break;
                }
            }
        }

        let mut created = Vec::new();
        for &text_el in &text_nodes {
            while let Some((start, end, matched)) = find_plain_pointer_ranges(tree, text_el) {
                let (node, ranges) = build_pointer_ranges(tree, &matched);
                if !splice(tree, text_el, start, end, node) {
                    break;
                }
                created.push((node, matched, ranges));
            }
        }

        collect_law_nums(tree, env, &mut tokens.law_nums);
        for (el, text, ranges) in created {
            if let Some(range) = env.text_range_of_el(tree, el) {
                tokens.pointer_ranges.push(PointerRangesToken {
                    sentence_index: env.index,
                    range,
                    text,
                    ranges,
                    el,
                });
            }
        }
    }
    tracing::debug!(
        law_nums = tokens.law_nums.len(),
        pointer_ranges = tokens.pointer_ranges.len(),
        "Matched sentence tokens"
    );
    tokens
}

fn collect_law_nums(tree: &ElTree, env: &SentenceEnv, out: &mut Vec<LawNumToken>) {
    for el in tree.descendants(env.el).filter(|id| tree.tag(*id) == LAW_NUM) {
        if let Some(range) = env.text_range_of_el(tree, el) {
            out.push(LawNumToken {
                sentence_index: env.index,
                range,
                text: tree.text(el),
                el,
            });
        }
    }
}

/// First match of `re` inside a single plain text run of `el`, as character
/// offsets into the element's text.
fn find_plain(tree: &ElTree, el: NodeId, re: &Regex) -> Option<(usize, usize, String)> {
    tree.plain_segments(el).into_iter().find_map(|(offset, text)| {
        re.find(text).map(|m| {
            let start = offset + char_len(&text[..m.start()]);
            (start, start + char_len(m.as_str()), m.as_str().to_string())
        })
    })
}

/// Like [`find_plain`] for pointer ranges, rejecting matches that end in
/// the middle of a word (`この目的`, `同法人`). A rejected match is cut
/// back to the pointers before its last fragment.
fn find_plain_pointer_ranges(tree: &ElTree, el: NodeId) -> Option<(usize, usize, String)> {
    tree.plain_segments(el).into_iter().find_map(|(offset, text)| {
        let mut from = 0;
        while let Some(m) = POINTER_RANGES_RE.find_at(text, from) {
            if let Some(end) = word_bounded_end(text, m.start(), m.end()) {
                let matched = &text[m.start()..end];
                let start = offset + char_len(&text[..m.start()]);
                return Some((start, start + char_len(matched), matched.to_string()));
            }
            from = m.end();
        }
        None
    })
}

/// End of the longest prefix of `text[start..end]` that is still a pointer
/// range and is not glued to the following word.
fn word_bounded_end(text: &str, start: usize, mut end: usize) -> Option<usize> {
    loop {
        let matched = &text[start..end];
        let last = FRAGMENT_RE.find_iter(matched).last()?;
        let glued = last.end() == matched.len()
            && is_bare_relative(last.as_str())
            && text[end..]
                .chars()
                .next()
                .is_some_and(|c| is_kanji(c) && !POINTER_CONTINUATIONS.contains(&c));
        if !glued {
            return Some(end);
        }
        let m = POINTER_RANGES_RE.find(&text[start..start + last.start()])?;
        if m.start() != 0 {
            return None;
        }
        end = start + m.end();
    }
}

/// `この章`, `前条`, `同項`, `本号` or `同法`: two or three characters that
/// also occur inside ordinary words.
fn is_bare_relative(fragment: &str) -> bool {
    if fragment == "同法" {
        return true;
    }
    let rest = fragment
        .strip_prefix("この")
        .or_else(|| fragment.strip_prefix(['前', '次', '同', '本']));
    rest.and_then(single_unit).is_some()
}

fn is_kanji(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '々')
}

fn splice(tree: &mut ElTree, el: NodeId, start: usize, end: usize, node: NodeId) -> bool {
    match tree.replace_span(el, start, end, node) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected splice");
            false
        }
    }
}

fn build_pointer_ranges(tree: &mut ElTree, text: &str) -> (NodeId, Vec<PointerRangeToken>) {
    let mut children = Vec::new();
    let mut ranges = Vec::new();
    let mut last = 0;
    for m in POINTER_RANGE_RE.find_iter(text) {
        if m.start() > last {
            children.push(Child::Text(text[last..m.start()].to_string()));
        }
        let (node, range) = build_pointer_range(tree, m.as_str());
        children.push(Child::Node(node));
        ranges.push(range);
        last = m.end();
    }
    if last < text.len() {
        children.push(Child::Text(text[last..].to_string()));
    }
    let node = tree.create_with(POINTER_RANGES, Vec::<(String, String)>::new(), children);
    (node, ranges)
}

fn build_pointer_range(tree: &mut ElTree, text: &str) -> (NodeId, PointerRangeToken) {
    let through = text
        .split_once("から")
        .and_then(|(from, rest)| rest.strip_suffix("まで").map(|to| (from, to)));

    let (children, token) = match through {
        Some((from, to)) => {
            let (from_el, from_fragments) = build_pointer(tree, from);
            let (to_el, to_fragments) = build_pointer(tree, to);
            (
                vec![
                    Child::Node(from_el),
                    Child::from("から"),
                    Child::Node(to_el),
                    Child::from("まで"),
                ],
                PointerRangeToken {
                    from: from_fragments,
                    to: Some(to_fragments),
                },
            )
        }
        None => {
            let (el, fragments) = build_pointer(tree, text);
            (
                vec![Child::Node(el)],
                PointerRangeToken {
                    from: fragments,
                    to: None,
                },
            )
        }
    };
    let node = tree.create_with(POINTER_RANGE, Vec::<(String, String)>::new(), children);
    (node, token)
}

fn build_pointer(tree: &mut ElTree, text: &str) -> (NodeId, Vec<PointerFragment>) {
    let mut children = Vec::new();
    let mut fragments = Vec::new();
    for m in FRAGMENT_RE.find_iter(text) {
        match PointerFragment::parse(m.as_str()) {
            Some(fragment) => {
                let mut attr = vec![
                    ("relPos", fragment.rel_pos.as_str().to_string()),
                    ("targetType", fragment.target_type.as_str().to_string()),
                    ("name", fragment.name.clone()),
                ];
                if let Some(num) = &fragment.num {
                    attr.push(("num", num.clone()));
                }
                let pf = tree.create_with(POINTER_FRAGMENT, attr, [Child::from(m.as_str())]);
                children.push(Child::Node(pf));
                fragments.push(fragment);
            }
            None => children.push(Child::from(m.as_str())),
        }
    }
    let node = tree.create_with(POINTER, Vec::<(String, String)>::new(), children);
    (node, fragments)
}
