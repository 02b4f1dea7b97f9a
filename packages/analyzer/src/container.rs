//! Container model.
//!
//! Structural elements (the law root, top-level provisions, grouping levels,
//! articles down to items and table cells) are mirrored in a
//! [`ContainerTree`]. Every container has two parent links:
//!
//! - `parent` / `children`: the full structural tree;
//! - `sub_parent` / `sub_children`: the same tree with grouping levels
//!   ([`ContainerType::Articles`]: Part, Chapter, ...) spliced out, so that
//!   all articles of a main provision are siblings regardless of chapter.
//!
//! Each container records a half-open index range `[start, end)` over the
//! unit it was built from (spans for the span extractor, sentences for the
//! sentence layer).

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::config::{ARTICLES_CONTAINER_TAGS, ROOT_TAG, SPANS_CONTAINER_TAGS, TOPLEVEL_CONTAINER_TAGS};
use crate::el::{ElTree, NodeId};

/// Structural role of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    Root,
    Toplevel,
    Articles,
    Spans,
}

impl ContainerType {
    /// Classify a tag; `None` for non-container elements.
    #[must_use]
    pub fn classify(tag: &str) -> Option<Self> {
        if tag == ROOT_TAG {
            Some(Self::Root)
        } else if TOPLEVEL_CONTAINER_TAGS.contains(&tag) {
            Some(Self::Toplevel)
        } else if ARTICLES_CONTAINER_TAGS.contains(&tag) {
            Some(Self::Articles)
        } else if SPANS_CONTAINER_TAGS.contains(&tag) {
            Some(Self::Spans)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "ROOT",
            Self::Toplevel => "TOPLEVEL",
            Self::Articles => "ARTICLES",
            Self::Spans => "SPANS",
        }
    }
}

/// Handle to a container inside a [`ContainerTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(usize);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// A structural element together with its index range.
#[derive(Debug, Clone)]
pub struct Container {
    /// Stable path id, e.g. `Law/MainProvision/Article[3]`.
    pub id: String,
    pub el: NodeId,
    pub tag: String,
    pub container_type: ContainerType,
    /// `Num` attribute of the element, if any.
    pub num: Option<String>,
    /// `AmendLawNum` attribute (amendment supplementary provisions).
    pub amend_law_num: Option<String>,
    /// Half-open index range covered by this container.
    pub range: (usize, usize),
    pub parent: Option<ContainerId>,
    pub children: Vec<ContainerId>,
    pub sub_parent: Option<ContainerId>,
    pub sub_children: Vec<ContainerId>,
}

/// Arena of containers with lookup by element and by path id.
#[derive(Debug, Clone, Default)]
pub struct ContainerTree {
    containers: Vec<Container>,
    by_el: HashMap<NodeId, ContainerId>,
    by_path: HashMap<String, ContainerId>,
}

impl ContainerTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root container. Its range starts at `start` and is closed
    /// with [`ContainerTree::close`].
    pub fn add_root(&mut self, tree: &ElTree, el: NodeId, start: usize) -> ContainerId {
        let container_type =
            ContainerType::classify(tree.tag(el)).unwrap_or(ContainerType::Root);
        self.push(tree, el, container_type, None, start)
    }

    /// Create a container for `el` below `parent`, or `None` if `el` is not
    /// a container element.
    pub fn add_child(
        &mut self,
        parent: ContainerId,
        tree: &ElTree,
        el: NodeId,
        start: usize,
    ) -> Option<ContainerId> {
        let container_type = ContainerType::classify(tree.tag(el))?;
        let child = self.push(tree, el, container_type, Some(parent), start);

        self.containers[parent.0].children.push(child);
        if container_type != ContainerType::Articles {
            let sub_parent = if self.containers[parent.0].container_type != ContainerType::Articles {
                Some(parent)
            } else {
                self.closest(parent, |c| c.container_type != ContainerType::Articles)
            };
            debug_assert!(sub_parent.is_some(), "grouping container without a non-grouping ancestor");
            if let Some(sub_parent) = sub_parent {
                self.containers[sub_parent.0].sub_children.push(child);
                self.containers[child.0].sub_parent = Some(sub_parent);
            }
        }
        Some(child)
    }

    fn push(
        &mut self,
        tree: &ElTree,
        el: NodeId,
        container_type: ContainerType,
        parent: Option<ContainerId>,
        start: usize,
    ) -> ContainerId {
        let tag = tree.tag(el).to_string();
        let num = tree.attr(el, "Num").map(str::to_string);
        let amend_law_num = tree.attr(el, "AmendLawNum").map(str::to_string);

        let segment = match num.as_deref().or(amend_law_num.as_deref()) {
            Some(label) => format!("{tag}[{label}]"),
            None => tag.clone(),
        };
        let base = match parent {
            Some(p) => format!("{}/{segment}", self.containers[p.0].id),
            None => segment,
        };
        let mut path = base.clone();
        let mut n = 2;
        while self.by_path.contains_key(&path) {
            path = format!("{base}#{n}");
            n += 1;
        }

        let id = ContainerId(self.containers.len());
        self.containers.push(Container {
            id: path.clone(),
            el,
            tag,
            container_type,
            num,
            amend_law_num,
            range: (start, start),
            parent,
            children: Vec::new(),
            sub_parent: None,
            sub_children: Vec::new(),
        });
        self.by_el.insert(el, id);
        self.by_path.insert(path, id);
        id
    }

    /// Record the end of a container's range once all of its content has
    /// been visited.
    pub fn close(&mut self, id: ContainerId, end: usize) {
        let container = &mut self.containers[id.0];
        debug_assert!(container.range.0 <= end, "container range closed before its start");
        container.range.1 = end;
    }

    #[must_use]
    pub fn get(&self, id: ContainerId) -> &Container {
        &self.containers[id.0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// The first container created, normally the law root.
    #[must_use]
    pub fn root(&self) -> Option<ContainerId> {
        (!self.containers.is_empty()).then_some(ContainerId(0))
    }

    /// Container wrapping a given element.
    #[must_use]
    pub fn by_el(&self, el: NodeId) -> Option<ContainerId> {
        self.by_el.get(&el).copied()
    }

    /// Container with a given path id.
    #[must_use]
    pub fn by_path(&self, path: &str) -> Option<ContainerId> {
        self.by_path.get(path).copied()
    }

    /// All containers in creation (pre-)order.
    pub fn iter(&self) -> impl Iterator<Item = (ContainerId, &Container)> {
        self.containers
            .iter()
            .enumerate()
            .map(|(i, c)| (ContainerId(i), c))
    }

    /// Ancestors of `id` in the full tree, nearest first.
    #[must_use]
    pub fn parents(&self, id: ContainerId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.containers[id.0].parent,
            sub: false,
        }
    }

    /// Ancestors of `id` in the sub tree, nearest first.
    #[must_use]
    pub fn parents_sub(&self, id: ContainerId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.containers[id.0].sub_parent,
            sub: true,
        }
    }

    /// Nearest full-tree ancestor matching `pred`.
    pub fn closest(&self, id: ContainerId, pred: impl Fn(&Container) -> bool) -> Option<ContainerId> {
        self.parents(id).find(|c| pred(self.get(*c)))
    }

    /// `id` itself if it matches, otherwise [`ContainerTree::closest`].
    pub fn this_or_closest(
        &self,
        id: ContainerId,
        pred: impl Fn(&Container) -> bool,
    ) -> Option<ContainerId> {
        if pred(self.get(id)) {
            Some(id)
        } else {
            self.closest(id, pred)
        }
    }

    /// Nearest sub-tree ancestor matching `pred`.
    pub fn closest_sub(&self, id: ContainerId, pred: impl Fn(&Container) -> bool) -> Option<ContainerId> {
        self.parents_sub(id).find(|c| pred(self.get(*c)))
    }

    /// `id` itself if it matches, otherwise [`ContainerTree::closest_sub`].
    pub fn this_or_closest_sub(
        &self,
        id: ContainerId,
        pred: impl Fn(&Container) -> bool,
    ) -> Option<ContainerId> {
        if pred(self.get(id)) {
            Some(id)
        } else {
            self.closest_sub(id, pred)
        }
    }

    fn sub_siblings(&self, id: ContainerId) -> (&[ContainerId], Option<usize>) {
        match self.get(id).sub_parent {
            Some(p) => {
                let list = &self.get(p).sub_children;
                (list.as_slice(), list.iter().position(|c| *c == id))
            }
            None => (&[], None),
        }
    }

    /// Following siblings (sub tree) matching `pred`, nearest first.
    pub fn next_all_sub(&self, id: ContainerId, pred: impl Fn(&Container) -> bool) -> Vec<ContainerId> {
        match self.sub_siblings(id) {
            (list, Some(pos)) => list[pos + 1..]
                .iter()
                .copied()
                .filter(|c| pred(self.get(*c)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Preceding siblings (sub tree) matching `pred`, nearest first.
    pub fn prev_all_sub(&self, id: ContainerId, pred: impl Fn(&Container) -> bool) -> Vec<ContainerId> {
        match self.sub_siblings(id) {
            (list, Some(pos)) => list[..pos]
                .iter()
                .rev()
                .copied()
                .filter(|c| pred(self.get(*c)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Nearest following sub-tree sibling matching `pred`.
    pub fn next_sub(&self, id: ContainerId, pred: impl Fn(&Container) -> bool) -> Option<ContainerId> {
        self.next_all_sub(id, pred).first().copied()
    }

    /// Nearest preceding sub-tree sibling matching `pred`.
    pub fn prev_sub(&self, id: ContainerId, pred: impl Fn(&Container) -> bool) -> Option<ContainerId> {
        self.prev_all_sub(id, pred).first().copied()
    }

    /// Descendants of `id` (excluding `id`) in pre-order matching `pred`.
    ///
    /// Traversal stops entirely at the first descendant for which `cut`
    /// holds.
    pub fn find_all(
        &self,
        id: ContainerId,
        pred: impl Fn(&Container) -> bool,
        cut: impl Fn(&Container) -> bool,
    ) -> Vec<ContainerId> {
        let mut out = Vec::new();
        self.find_all_into(id, &pred, &cut, &mut out);
        out
    }

    fn find_all_into(
        &self,
        id: ContainerId,
        pred: &impl Fn(&Container) -> bool,
        cut: &impl Fn(&Container) -> bool,
        out: &mut Vec<ContainerId>,
    ) -> bool {
        for child in &self.get(id).children {
            let container = self.get(*child);
            if cut(container) {
                return false;
            }
            if pred(container) {
                out.push(*child);
            }
            if !self.find_all_into(*child, pred, cut, out) {
                return false;
            }
        }
        true
    }

    /// First descendant of `id` matching `pred`.
    pub fn find(&self, id: ContainerId, pred: impl Fn(&Container) -> bool) -> Option<ContainerId> {
        self.find_all(id, pred, |_| false).first().copied()
    }
}

/// Walk towards the root through `parent` or `sub_parent` links.
pub struct Ancestors<'a> {
    tree: &'a ContainerTree,
    next: Option<ContainerId>,
    sub: bool,
}

impl Iterator for Ancestors<'_> {
    type Item = ContainerId;

    fn next(&mut self) -> Option<ContainerId> {
        let current = self.next?;
        let container = self.tree.get(current);
        self.next = if self.sub {
            container.sub_parent
        } else {
            container.parent
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Law > MainProvision > Chapter[1] > Article[1], Article[2];
    ///       MainProvision > Chapter[2] > Article[3]
    fn sample() -> (ElTree, ContainerTree, Vec<ContainerId>) {
        let mut el = ElTree::new("Law");
        let law = el.root();
        let main = el.create("MainProvision");
        let ch1 = el.create_with("Chapter", [("Num", "1")], []);
        let a1 = el.create_with("Article", [("Num", "1")], []);
        let a2 = el.create_with("Article", [("Num", "2")], []);
        let ch2 = el.create_with("Chapter", [("Num", "2")], []);
        let a3 = el.create_with("Article", [("Num", "3")], []);

        let mut tree = ContainerTree::new();
        let c_law = tree.add_root(&el, law, 0);
        let c_main = tree.add_child(c_law, &el, main, 0).unwrap();
        let c_ch1 = tree.add_child(c_main, &el, ch1, 0).unwrap();
        let c_a1 = tree.add_child(c_ch1, &el, a1, 0).unwrap();
        tree.close(c_a1, 2);
        let c_a2 = tree.add_child(c_ch1, &el, a2, 2).unwrap();
        tree.close(c_a2, 3);
        tree.close(c_ch1, 3);
        let c_ch2 = tree.add_child(c_main, &el, ch2, 3).unwrap();
        let c_a3 = tree.add_child(c_ch2, &el, a3, 3).unwrap();
        tree.close(c_a3, 5);
        tree.close(c_ch2, 5);
        tree.close(c_main, 5);
        tree.close(c_law, 5);
        (el, tree, vec![c_law, c_main, c_ch1, c_a1, c_a2, c_ch2, c_a3])
    }

    #[test]
    fn test_classify() {
        assert_eq!(ContainerType::classify("Law"), Some(ContainerType::Root));
        assert_eq!(ContainerType::classify("MainProvision"), Some(ContainerType::Toplevel));
        assert_eq!(ContainerType::classify("Chapter"), Some(ContainerType::Articles));
        assert_eq!(ContainerType::classify("Paragraph"), Some(ContainerType::Spans));
        assert_eq!(ContainerType::classify("Sentence"), None);
    }

    #[test]
    fn test_path_ids() {
        let (_, tree, ids) = sample();
        assert_eq!(tree.get(ids[0]).id, "Law");
        assert_eq!(tree.get(ids[6]).id, "Law/MainProvision/Chapter[2]/Article[3]");
        assert_eq!(tree.by_path("Law/MainProvision/Chapter[1]/Article[2]"), Some(ids[4]));
    }

    #[test]
    fn test_duplicate_path_ids_are_suffixed() {
        let mut el = ElTree::new("Law");
        let law = el.root();
        let s1 = el.create("SupplProvision");
        let s2 = el.create("SupplProvision");
        let mut tree = ContainerTree::new();
        let root = tree.add_root(&el, law, 0);
        let c1 = tree.add_child(root, &el, s1, 0).unwrap();
        let c2 = tree.add_child(root, &el, s2, 0).unwrap();
        assert_eq!(tree.get(c1).id, "Law/SupplProvision");
        assert_eq!(tree.get(c2).id, "Law/SupplProvision#2");
    }

    #[test]
    fn test_non_container_is_rejected() {
        let mut el = ElTree::new("Law");
        let law = el.root();
        let sentence = el.create("Sentence");
        let mut tree = ContainerTree::new();
        let root = tree.add_root(&el, law, 0);
        assert!(tree.add_child(root, &el, sentence, 0).is_none());
    }

    #[test]
    fn test_sub_linkage_skips_grouping() {
        let (_, tree, ids) = sample();
        let (c_main, c_ch1, c_a1, c_a2, c_a3) = (ids[1], ids[2], ids[3], ids[4], ids[6]);

        assert_eq!(tree.get(c_a1).parent, Some(c_ch1));
        assert_eq!(tree.get(c_a1).sub_parent, Some(c_main));
        assert_eq!(tree.get(c_ch1).sub_parent, None);
        assert_eq!(tree.get(c_main).sub_children, vec![c_a1, c_a2, c_a3]);
    }

    #[test]
    fn test_sibling_navigation_crosses_chapters() {
        let (_, tree, ids) = sample();
        let (c_a1, c_a2, c_a3) = (ids[3], ids[4], ids[6]);
        let is_article = |c: &Container| c.tag == "Article";

        assert_eq!(tree.prev_sub(c_a3, is_article), Some(c_a2));
        assert_eq!(tree.next_sub(c_a2, is_article), Some(c_a3));
        assert_eq!(tree.next_sub(c_a3, is_article), None);
        assert_eq!(tree.prev_all_sub(c_a3, is_article), vec![c_a2, c_a1]);
    }

    #[test]
    fn test_closest() {
        let (_, tree, ids) = sample();
        let c_a3 = ids[6];
        assert_eq!(tree.closest(c_a3, |c| c.tag == "Chapter"), Some(ids[5]));
        assert_eq!(tree.closest_sub(c_a3, |c| c.tag == "Chapter"), None);
        assert_eq!(tree.this_or_closest(c_a3, |c| c.tag == "Article"), Some(c_a3));
        assert_eq!(tree.this_or_closest_sub(c_a3, |c| c.tag == "MainProvision"), Some(ids[1]));
    }

    #[test]
    fn test_ranges_are_nested() {
        let (_, tree, _) = sample();
        for (_, container) in tree.iter() {
            if let Some(parent) = container.parent {
                let outer = tree.get(parent).range;
                assert!(outer.0 <= container.range.0 && container.range.1 <= outer.1);
            }
        }
    }

    #[test]
    fn test_find_all_and_find() {
        let (_, tree, ids) = sample();
        let articles = tree.find_all(ids[0], |c| c.tag == "Article", |_| false);
        assert_eq!(articles, vec![ids[3], ids[4], ids[6]]);

        let cut_at_ch2 = tree.find_all(ids[0], |c| c.tag == "Article", |c| c.id.ends_with("Chapter[2]"));
        assert_eq!(cut_at_ch2, vec![ids[3], ids[4]]);

        assert_eq!(tree.find(ids[1], |c| c.num.as_deref() == Some("3")), Some(ids[6]));
        assert_eq!(tree.find(ids[2], |c| c.num.as_deref() == Some("3")), None);
    }
}
