//! Span extraction.
//!
//! A single pre-order walk over the law flattens every mixed-content
//! element into a [`Span`] and records, for every container element, the
//! half-open range of span indices it covers.

use crate::config::{AnalysisConfig, SPAN_TAGS};
use crate::container::{ContainerId, ContainerTree};
use crate::el::control::NodeKind;
use crate::el::{Child, ElTree, NodeId};
use crate::span::{Env, Span};

/// Output of [`extract_spans`].
#[derive(Debug, Clone, Default)]
pub struct ExtractedSpans {
    pub spans: Vec<Span>,
    /// Container elements with their span ranges, in closing order.
    pub containers: Vec<(NodeId, (usize, usize))>,
    pub container_tree: ContainerTree,
}

/// Extract spans and container ranges from the tree rooted at `tree.root()`.
///
/// Every span element gets a `span_index` attribute. Annotation nodes left
/// by an earlier analysis run are neither spans nor descended into, so
/// extracting from an already annotated tree yields the same spans.
pub fn extract_spans(tree: &mut ElTree, config: &AnalysisConfig) -> ExtractedSpans {
    let root = tree.root();
    let law_type = tree.attr(root, "LawType").map(str::to_string);

    let mut extractor = Extractor {
        config,
        out: ExtractedSpans::default(),
    };
    let root_container = extractor.out.container_tree.add_root(tree, root, 0);
    let mut env = Env::new(law_type);
    env.container_stack.push(root_container);
    env.parents.push(root);

    for child in child_nodes(tree, root) {
        extractor.extract(tree, child, &env);
    }
    let end = extractor.out.spans.len();
    extractor.out.container_tree.close(root_container, end);
    extractor.out.containers.push((root, (0, end)));

    debug_assert!(
        extractor.out.spans.iter().enumerate().all(|(i, s)| s.index == i),
        "span indices must be contiguous"
    );
    tracing::debug!(
        spans = extractor.out.spans.len(),
        containers = extractor.out.containers.len(),
        "Extracted spans"
    );
    extractor.out
}

struct Extractor<'a> {
    config: &'a AnalysisConfig,
    out: ExtractedSpans,
}

impl Extractor<'_> {
    fn extract(&mut self, tree: &mut ElTree, id: NodeId, parent_env: &Env) {
        let tag = tree.tag(id).to_string();
        if self.config.is_ignored(&tag) || NodeKind::of(tree, id).is_annotation() {
            return;
        }

        let mut env = parent_env.clone();
        let element = tree.get(id);
        let is_mixed = SPAN_TAGS.contains(&tag.as_str()) || element.has_text_child();

        if is_mixed {
            if element.children.len() != 1 && !SPAN_TAGS.contains(&tag.as_str()) {
                tracing::warn!(
                    tag = %tag,
                    children = element.children.len(),
                    "Unexpected mixed content"
                );
            }
            let index = self.out.spans.len();
            tree.set_attr(id, "span_index", index.to_string());
            let span = Span::new(index, id, env, tree);
            self.out.spans.push(span);
            return;
        }

        env.parents.push(id);
        let container = self.open_container(tree, id, &env);
        if let Some(container) = container {
            env.container_stack.push(container);
        }

        let start = self.out.spans.len();
        for child in child_nodes(tree, id) {
            self.extract(tree, child, &env);
        }
        let end = self.out.spans.len();

        if let Some(container) = container {
            self.out.container_tree.close(container, end);
            self.out.containers.push((id, (start, end)));
        }
    }

    fn open_container(&mut self, tree: &ElTree, id: NodeId, env: &Env) -> Option<ContainerId> {
        let parent = env.container()?;
        let start = self.out.spans.len();
        self.out.container_tree.add_child(parent, tree, id, start)
    }
}

fn child_nodes(tree: &ElTree, id: NodeId) -> Vec<NodeId> {
    tree.children(id).iter().filter_map(Child::as_node).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::el::xml::parse_xml;
    use pretty_assertions::assert_eq;

    const LAW: &str = r#"<Law LawType="Act">
  <LawNum>平成五年法律第八十八号</LawNum>
  <LawBody>
    <LawTitle>行政手続法</LawTitle>
    <MainProvision>
      <Article Num="1">
        <ArticleTitle>第一条</ArticleTitle>
        <Paragraph Num="1">
          <ParagraphNum/>
          <ParagraphSentence><Sentence>この法律は、手続を定める。</Sentence></ParagraphSentence>
        </Paragraph>
      </Article>
      <Article Num="2">
        <Paragraph Num="1">
          <ParagraphSentence><Sentence>処分（以下「甲」という。）をする。</Sentence></ParagraphSentence>
        </Paragraph>
      </Article>
    </MainProvision>
    <SupplProvision>
      <Paragraph Num="1"><ParagraphSentence><Sentence>施行する。</Sentence></ParagraphSentence></Paragraph>
    </SupplProvision>
  </LawBody>
</Law>"#;

    fn extract(xml: &str) -> (ElTree, ExtractedSpans) {
        let mut tree = parse_xml(xml).unwrap();
        let out = extract_spans(&mut tree, &AnalysisConfig::default());
        (tree, out)
    }

    #[test]
    fn test_spans_in_document_order() {
        let (_, out) = extract(LAW);
        let texts: Vec<_> = out.spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["この法律は、手続を定める。", "処分", "（", "以下", "「", "甲", "」", "という。", "）", "をする。"]
        );
    }

    #[test]
    fn test_span_indices_are_contiguous_and_tagged() {
        let (tree, out) = extract(LAW);
        for (i, span) in out.spans.iter().enumerate() {
            assert_eq!(span.index, i);
            assert_eq!(tree.attr(span.el, "span_index"), Some(i.to_string().as_str()));
        }
    }

    #[test]
    fn test_container_ranges() {
        let (tree, out) = extract(LAW);
        let ranges: Vec<_> = out
            .containers
            .iter()
            .map(|(el, range)| (tree.tag(*el).to_string(), tree.attr(*el, "Num").map(str::to_string), *range))
            .collect();
        assert_eq!(
            ranges,
            vec![
                ("Paragraph".to_string(), Some("1".to_string()), (0, 1)),
                ("Article".to_string(), Some("1".to_string()), (0, 1)),
                ("Paragraph".to_string(), Some("1".to_string()), (1, 10)),
                ("Article".to_string(), Some("2".to_string()), (1, 10)),
                ("MainProvision".to_string(), None, (0, 10)),
                ("Law".to_string(), None, (0, 10)),
            ]
        );
    }

    #[test]
    fn test_container_tree_ids_and_nesting() {
        let (_, out) = extract(LAW);
        let tree = &out.container_tree;
        let article = tree.by_path("Law/MainProvision/Article[2]").unwrap();
        assert_eq!(tree.get(article).range, (1, 10));
        for (_, container) in tree.iter() {
            assert!(container.range.0 <= container.range.1);
            assert!(container.range.1 <= out.spans.len());
        }
    }

    #[test]
    fn test_env_tracks_parents_and_law_type() {
        let (tree, out) = extract(LAW);
        let name = &out.spans[5];
        assert_eq!(name.text, "甲");
        assert_eq!(name.env.law_type.as_deref(), Some("Act"));
        let parent = name.env.parent().unwrap();
        assert_eq!(tree.tag(parent), "__PContent");
        assert_eq!(tree.attr(parent, "type"), Some("square"));
        let container = out.container_tree.get(name.env.container().unwrap());
        assert_eq!(container.tag, "Paragraph");
    }

    #[test]
    fn test_extra_ignore_tags() {
        let mut tree = parse_xml(LAW).unwrap();
        let config = AnalysisConfig {
            extra_ignore_tags: vec!["Article".to_string()],
            ..AnalysisConfig::default()
        };
        let out = extract_spans(&mut tree, &config);
        assert!(out.spans.is_empty());
    }

    #[test]
    fn test_annotation_nodes_are_not_spans() {
        let (mut tree, out) = extract(LAW);
        let name = out.spans[5].el;
        let decl = tree.create_with("____Declaration", [("name", "甲")], [Child::from("甲")]);
        tree.replace_span(name, 0, 1, decl).unwrap();

        let again = extract_spans(&mut tree, &AnalysisConfig::default());
        assert_eq!(again.spans.len(), out.spans.len());
        assert_eq!(again.spans[5].el, name);
    }
}
