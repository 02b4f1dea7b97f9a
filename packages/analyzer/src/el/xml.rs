//! Conversion between official law XML and the EL tree.

use roxmltree::{Document, Node};

use super::inline::parse_inline;
use super::{Child, ElTree, NodeId};
use crate::error::{AnalyzerError, Result};

/// Elements whose mixed text is kept verbatim instead of being split into
/// bracket structure.
const VERBATIM_TAGS: &[&str] = &["LawNum", "QuoteStruct"];

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lawtext_analyzer::el::xml::get_tag_name;
///
/// let doc = Document::parse(r#"<Law><LawNum>平成五年法律第八十八号</LawNum></Law>"#).unwrap();
/// let law_num = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(law_num), "LawNum");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Parse law XML text into an EL tree.
///
/// # Errors
/// Returns `XmlParse` if the text is not well-formed XML.
///
/// # Examples
/// ```
/// use lawtext_analyzer::el::xml::parse_xml;
///
/// let tree = parse_xml("<Law><Sentence>この法律は、公布の日から施行する。</Sentence></Law>").unwrap();
/// assert_eq!(tree.tag(tree.root()), "Law");
/// assert_eq!(tree.text(tree.root()), "この法律は、公布の日から施行する。");
/// ```
pub fn parse_xml(xml: &str) -> Result<ElTree> {
    let doc = Document::parse(xml)?;
    from_document(&doc)
}

/// Convert an already parsed XML document.
///
/// Whitespace-only text between elements is dropped. The outermost element
/// with non-blank text gets its content rewritten by
/// [`parse_inline`](super::inline::parse_inline); elements nested inside it
/// keep their raw content.
pub fn from_document(doc: &Document<'_>) -> Result<ElTree> {
    let root = doc.root_element();
    if !root.is_element() {
        return Err(AnalyzerError::MissingRoot);
    }
    let mut tree = ElTree::new(get_tag_name(root));
    let root_id = tree.root();
    fill_element(&mut tree, root_id, root, true);
    Ok(tree)
}

fn convert_element(tree: &mut ElTree, node: Node<'_, '_>, inline: bool) -> NodeId {
    let id = tree.create(get_tag_name(node));
    fill_element(tree, id, node, inline);
    id
}

fn fill_element(tree: &mut ElTree, id: NodeId, node: Node<'_, '_>, inline: bool) {
    for attr in node.attributes() {
        tree.set_attr(id, attr.name(), attr.value());
    }

    let tag = get_tag_name(node);
    let is_mixed = node
        .children()
        .any(|c| c.is_text() && c.text().is_some_and(|t| !t.trim().is_empty()));
    let parse_here = inline && is_mixed && !VERBATIM_TAGS.contains(&tag);
    let child_inline = inline && !is_mixed;

    let mut content: Vec<Child> = Vec::new();
    for child in node.children() {
        if child.is_element() {
            let sub = convert_element(tree, child, child_inline);
            content.push(Child::Node(sub));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            if is_mixed && !text.is_empty() {
                content.push(Child::Text(text.to_string()));
            }
        }
    }

    let content = if parse_here {
        parse_inline(tree, content)
    } else {
        content
    };
    tree.get_mut(id).children = content;
}

/// Serialize an element subtree back to XML text.
///
/// # Examples
/// ```
/// use lawtext_analyzer::el::ElTree;
/// use lawtext_analyzer::el::xml::to_xml;
///
/// let mut tree = ElTree::new("Sentence");
/// let root = tree.root();
/// tree.set_attr(root, "Num", "1");
/// tree.append(root, "A&B");
/// assert_eq!(to_xml(&tree, root), r#"<Sentence Num="1">A&amp;B</Sentence>"#);
/// ```
#[must_use]
pub fn to_xml(tree: &ElTree, id: NodeId) -> String {
    let mut out = String::new();
    write_element(tree, id, &mut out);
    out
}

fn write_element(tree: &ElTree, id: NodeId, out: &mut String) {
    let element = tree.get(id);
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attr {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            Child::Text(text) => escape_into(text, false, out),
            Child::Node(sub) => write_element(tree, *sub, out),
        }
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn escape_into(text: &str, in_attr: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
