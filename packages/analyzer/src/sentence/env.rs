//! Sentence environments.
//!
//! Unlike span extraction, this walk covers the whole law including
//! supplementary provisions, and its container ranges count sentences.

use crate::config::{IGNORE_SENTENCE_TAGS, SENTENCE_LIKE_TAGS};
use crate::container::{ContainerId, ContainerTree};
use crate::el::{char_len, Child, ElTree, NodeId};

/// One sentence-like element with its context.
#[derive(Debug, Clone)]
pub struct SentenceEnv {
    pub index: usize,
    pub el: NodeId,
    pub law_type: Option<String>,
    /// Enclosing elements, outermost first.
    pub parents: Vec<NodeId>,
    /// Innermost enclosing container.
    pub container: ContainerId,
    text: String,
}

impl SentenceEnv {
    /// Text of the sentence as read (ruby readings excluded).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character range of `el` within [`SentenceEnv::text`], or `None` if
    /// `el` is not part of this sentence.
    ///
    /// # Examples
    /// ```
    /// use lawtext_analyzer::el::xml::parse_xml;
    /// use lawtext_analyzer::sentence::env::get_sentence_envs;
    ///
    /// let tree = parse_xml("<Law><Sentence>甲（乙）</Sentence></Law>").unwrap();
    /// let envs = get_sentence_envs(&tree);
    /// let env = &envs.sentence_envs[0];
    /// let paren = tree.descendants(env.el).find(|id| tree.tag(*id) == "__Parentheses").unwrap();
    /// assert_eq!(env.text_range_of_el(&tree, paren), Some((1, 4)));
    /// ```
    #[must_use]
    pub fn text_range_of_el(&self, tree: &ElTree, el: NodeId) -> Option<(usize, usize)> {
        let mut offset = 0;
        find_range(tree, self.el, el, &mut offset)
    }
}

fn find_range(tree: &ElTree, id: NodeId, target: NodeId, offset: &mut usize) -> Option<(usize, usize)> {
    if IGNORE_SENTENCE_TAGS.contains(&tree.tag(id)) {
        return None;
    }
    let start = *offset;
    for child in tree.children(id) {
        match child {
            Child::Text(text) => *offset += char_len(text),
            Child::Node(sub) => {
                if let Some(range) = find_range(tree, *sub, target, offset) {
                    return Some(range);
                }
            }
        }
    }
    (id == target).then_some((start, *offset))
}

/// Text of an element as read, skipping ruby readings.
#[must_use]
pub fn sentence_text(tree: &ElTree, id: NodeId) -> String {
    let mut out = String::new();
    collect_text(tree, id, &mut out);
    out
}

fn collect_text(tree: &ElTree, id: NodeId, out: &mut String) {
    if IGNORE_SENTENCE_TAGS.contains(&tree.tag(id)) {
        return;
    }
    for child in tree.children(id) {
        match child {
            Child::Text(text) => out.push_str(text),
            Child::Node(sub) => collect_text(tree, *sub, out),
        }
    }
}

/// All sentence environments of a law plus the sentence-indexed container
/// tree.
#[derive(Debug, Clone, Default)]
pub struct SentenceEnvs {
    pub sentence_envs: Vec<SentenceEnv>,
    pub containers: ContainerTree,
}

impl SentenceEnvs {
    /// Container with the given path id.
    #[must_use]
    pub fn container(&self, id: &str) -> Option<ContainerId> {
        self.containers.by_path(id)
    }

    /// Environment of the sentence element `el`.
    #[must_use]
    pub fn env_of(&self, el: NodeId) -> Option<&SentenceEnv> {
        self.sentence_envs.iter().find(|env| env.el == el)
    }
}

/// Collect sentence environments in document order.
#[must_use]
pub fn get_sentence_envs(tree: &ElTree) -> SentenceEnvs {
    let root = tree.root();
    let law_type = tree.attr(root, "LawType").map(str::to_string);
    let mut containers = ContainerTree::new();
    let root_container = containers.add_root(tree, root, 0);

    let mut walker = Walker {
        tree,
        law_type,
        envs: Vec::new(),
        containers,
    };
    walker.walk(root, &[], root_container, true);
    let end = walker.envs.len();
    walker.containers.close(root_container, end);

    tracing::debug!(
        sentences = walker.envs.len(),
        containers = walker.containers.len(),
        "Collected sentence environments"
    );
    SentenceEnvs {
        sentence_envs: walker.envs,
        containers: walker.containers,
    }
}

struct Walker<'a> {
    tree: &'a ElTree,
    law_type: Option<String>,
    envs: Vec<SentenceEnv>,
    containers: ContainerTree,
}

impl Walker<'_> {
    fn walk(&mut self, id: NodeId, parents: &[NodeId], container: ContainerId, is_root: bool) {
        let tag = self.tree.tag(id);
        if IGNORE_SENTENCE_TAGS.contains(&tag) {
            return;
        }
        if SENTENCE_LIKE_TAGS.contains(&tag) {
            self.envs.push(SentenceEnv {
                index: self.envs.len(),
                el: id,
                law_type: self.law_type.clone(),
                parents: parents.to_vec(),
                container,
                text: sentence_text(self.tree, id),
            });
            return;
        }

        let own = if is_root {
            None
        } else {
            self.containers
                .add_child(container, self.tree, id, self.envs.len())
        };
        let mut parents = parents.to_vec();
        parents.push(id);
        let current = own.unwrap_or(container);

        for child in self.tree.element_children(id) {
            self.walk(child, &parents, current, false);
        }

        if let Some(own) = own {
            self.containers.close(own, self.envs.len());
        }
    }
}
