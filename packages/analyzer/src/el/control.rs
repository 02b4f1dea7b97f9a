//! Typed view over control elements.
//!
//! The tree stores every element generically (tag + attributes). Analysis
//! code dispatches on [`NodeKind`], which is derived from the tag string and
//! never owns anything: it is a projection of the stored element.

use std::fmt;

use super::{Child, ElTree, NodeId};

pub const TEXT: &str = "__Text";
pub const PARENTHESES: &str = "__Parentheses";
pub const P_START: &str = "__PStart";
pub const P_CONTENT: &str = "__PContent";
pub const P_END: &str = "__PEnd";
pub const MISMATCH_START: &str = "__MismatchStartParenthesis";
pub const MISMATCH_END: &str = "__MismatchEndParenthesis";
pub const DECLARATION: &str = "____Declaration";
pub const DECLARATION_VAL: &str = "____DeclarationVal";
pub const VAR_REF: &str = "____VarRef";
pub const LAW_NUM: &str = "____LawNum";
pub const POINTER_RANGES: &str = "____PointerRanges";
pub const POINTER_RANGE: &str = "____PointerRange";
pub const POINTER: &str = "____Pointer";
pub const POINTER_FRAGMENT: &str = "____PF";

/// Bracket family of a parenthesized run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParenthesesType {
    /// `（）` and `()`.
    Round,
    /// `「」`.
    Square,
    /// `｛｝` and `{}`.
    Curly,
    /// `［］` and `[]`.
    SquareB,
}

impl ParenthesesType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Square => "square",
            Self::Curly => "curly",
            Self::SquareB => "squareb",
        }
    }

    /// Parse the `type` attribute value.
    #[must_use]
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "round" => Some(Self::Round),
            "square" => Some(Self::Square),
            "curly" => Some(Self::Curly),
            "squareb" => Some(Self::SquareB),
            _ => None,
        }
    }

    /// Classify an opening bracket character.
    #[must_use]
    pub fn from_open(c: char) -> Option<Self> {
        match c {
            '（' | '(' => Some(Self::Round),
            '「' => Some(Self::Square),
            '｛' | '{' => Some(Self::Curly),
            '［' | '[' => Some(Self::SquareB),
            _ => None,
        }
    }

    /// Classify a closing bracket character.
    #[must_use]
    pub fn from_close(c: char) -> Option<Self> {
        match c {
            '）' | ')' => Some(Self::Round),
            '」' => Some(Self::Square),
            '｝' | '}' => Some(Self::Curly),
            '］' | ']' => Some(Self::SquareB),
            _ => None,
        }
    }
}

impl fmt::Display for ParenthesesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of element kinds the analyzer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Text,
    Parentheses(Option<ParenthesesType>),
    PStart(Option<ParenthesesType>),
    PContent(Option<ParenthesesType>),
    PEnd(Option<ParenthesesType>),
    MismatchStart,
    MismatchEnd,
    Declaration,
    DeclarationVal,
    VarRef,
    LawNum,
    PointerRanges,
    PointerRange,
    Pointer,
    PointerFragment,
    /// Any standard law element (`Law`, `Article`, `Sentence`, `Ruby`, ...).
    Std(&'a str),
}

impl<'a> NodeKind<'a> {
    /// Project an element onto its kind.
    #[must_use]
    pub fn of(tree: &'a ElTree, id: NodeId) -> Self {
        let paren = || tree.attr(id, "type").and_then(ParenthesesType::from_attr);
        match tree.tag(id) {
            TEXT => Self::Text,
            PARENTHESES => Self::Parentheses(paren()),
            P_START => Self::PStart(paren()),
            P_CONTENT => Self::PContent(paren()),
            P_END => Self::PEnd(paren()),
            MISMATCH_START => Self::MismatchStart,
            MISMATCH_END => Self::MismatchEnd,
            DECLARATION => Self::Declaration,
            DECLARATION_VAL => Self::DeclarationVal,
            VAR_REF => Self::VarRef,
            LAW_NUM => Self::LawNum,
            POINTER_RANGES => Self::PointerRanges,
            POINTER_RANGE => Self::PointerRange,
            POINTER => Self::Pointer,
            POINTER_FRAGMENT => Self::PointerFragment,
            other => Self::Std(other),
        }
    }

    /// Whether the element was produced by the analyzer or the inline parser
    /// rather than coming from the source document.
    #[must_use]
    pub fn is_control(&self) -> bool {
        !matches!(self, Self::Std(_))
    }

    /// Annotation nodes produced by detection. They live inside spans and
    /// are never spans themselves.
    #[must_use]
    pub fn is_annotation(&self) -> bool {
        matches!(
            self,
            Self::Declaration
                | Self::DeclarationVal
                | Self::VarRef
                | Self::LawNum
                | Self::PointerRanges
                | Self::PointerRange
                | Self::Pointer
                | Self::PointerFragment
        )
    }
}

/// Create a detached `__Text` node.
pub fn new_text(tree: &mut ElTree, text: impl Into<String>) -> NodeId {
    tree.create_with(TEXT, Vec::<(String, String)>::new(), [Child::Text(text.into())])
}

/// Create a detached `__Parentheses` node with its start, content and end parts.
pub fn new_parentheses(
    tree: &mut ElTree,
    ptype: ParenthesesType,
    depth: usize,
    start: impl Into<String>,
    content: Vec<Child>,
    end: impl Into<String>,
) -> NodeId {
    let type_attr = || [("type", ptype.as_str())];
    let start = tree.create_with(P_START, type_attr(), [Child::Text(start.into())]);
    let content = tree.create_with(P_CONTENT, type_attr(), content);
    let end = tree.create_with(P_END, type_attr(), [Child::Text(end.into())]);
    tree.create_with(
        PARENTHESES,
        [("type", ptype.as_str().to_string()), ("depth", depth.to_string())],
        [Child::Node(start), Child::Node(content), Child::Node(end)],
    )
}

/// Create a detached `____LawNum` node holding a law-number literal.
pub fn new_law_num(tree: &mut ElTree, law_num: impl Into<String>) -> NodeId {
    tree.create_with(LAW_NUM, Vec::<(String, String)>::new(), [Child::Text(law_num.into())])
}
