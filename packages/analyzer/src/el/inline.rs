//! Inline bracket structure.
//!
//! Mixed text content is rewritten into `__Text` runs and nested
//! `__Parentheses` nodes so that later passes can reason about bracket
//! boundaries (`（`, `「`, ...) as separate spans. Sub-elements already
//! present in the content (`Ruby`, `Sup`, ...) are kept as-is and may sit
//! inside a bracketed run.

use super::control::{new_parentheses, new_text, ParenthesesType, MISMATCH_END, MISMATCH_START};
use super::{Child, ElTree};

struct Frame {
    ptype: Option<ParenthesesType>,
    open: char,
    items: Vec<Child>,
    buf: String,
}

impl Frame {
    fn new(ptype: Option<ParenthesesType>, open: char) -> Self {
        Self {
            ptype,
            open,
            items: Vec::new(),
            buf: String::new(),
        }
    }

    fn flush(&mut self, tree: &mut ElTree) {
        if !self.buf.is_empty() {
            let text = std::mem::take(&mut self.buf);
            self.items.push(Child::Node(new_text(tree, text)));
        }
    }
}

/// Rewrite mixed content into text runs and bracket nodes.
///
/// Unbalanced brackets do not fail: an unmatched closer becomes a
/// `__MismatchEndParenthesis` node and an unclosed opener becomes a
/// `__MismatchStartParenthesis` node followed by the content it opened.
pub fn parse_inline(tree: &mut ElTree, content: Vec<Child>) -> Vec<Child> {
    let mut stack = vec![Frame::new(None, '\0')];

    for child in content {
        match child {
            Child::Text(text) => {
                for c in text.chars() {
                    if let Some(ptype) = ParenthesesType::from_open(c) {
                        if let Some(top) = stack.last_mut() {
                            top.flush(tree);
                        }
                        stack.push(Frame::new(Some(ptype), c));
                    } else if let Some(ptype) = ParenthesesType::from_close(c) {
                        let closes_top =
                            stack.len() > 1 && stack.last().and_then(|f| f.ptype) == Some(ptype);
                        if closes_top {
                            let depth = stack.len() - 1;
                            if let Some(mut frame) = stack.pop() {
                                frame.flush(tree);
                                let node = new_parentheses(
                                    tree,
                                    ptype,
                                    depth,
                                    frame.open.to_string(),
                                    frame.items,
                                    c.to_string(),
                                );
                                if let Some(top) = stack.last_mut() {
                                    top.items.push(Child::Node(node));
                                }
                            }
                        } else if let Some(top) = stack.last_mut() {
                            tracing::debug!(closer = %c, "Unmatched closing bracket");
                            top.flush(tree);
                            let node = tree.create_with(
                                MISMATCH_END,
                                [("type", ptype.as_str())],
                                [Child::Text(c.to_string())],
                            );
                            top.items.push(Child::Node(node));
                        }
                    } else if let Some(top) = stack.last_mut() {
                        top.buf.push(c);
                    }
                }
            }
            Child::Node(id) => {
                if let Some(top) = stack.last_mut() {
                    top.flush(tree);
                    top.items.push(Child::Node(id));
                }
            }
        }
    }

    while stack.len() > 1 {
        let Some(mut frame) = stack.pop() else { break };
        frame.flush(tree);
        tracing::debug!(opener = %frame.open, "Unclosed opening bracket");
        let type_attr = frame.ptype.map_or("", |p| p.as_str());
        let node = tree.create_with(
            MISMATCH_START,
            [("type", type_attr)],
            [Child::Text(frame.open.to_string())],
        );
        if let Some(top) = stack.last_mut() {
            top.items.push(Child::Node(node));
            top.items.extend(frame.items);
        }
    }

    match stack.pop() {
        Some(mut root) => {
            root.flush(tree);
            root.items
        }
        None => Vec::new(),
    }
}
