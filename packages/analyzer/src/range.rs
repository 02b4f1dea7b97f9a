//! Text ranges over a sequence of units (spans or sentences).
//!
//! A container range counts whole units; a [`TextPos`] additionally carries
//! a character offset inside a unit. Converting container references into
//! ranges coalesces touching ranges and can clip everything before a cut
//! point.

use serde::Serialize;

use crate::container::{ContainerId, ContainerTree, ContainerType};

/// Unit index plus character offset inside the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TextPos {
    pub index: usize,
    pub offset: usize,
}

impl TextPos {
    #[must_use]
    pub fn new(index: usize, offset: usize) -> Self {
        Self { index, offset }
    }
}

/// Half-open `[start, end)` range of text positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRange {
    pub start: TextPos,
    pub end: TextPos,
}

impl TextRange {
    #[must_use]
    pub fn new(start: TextPos, end: TextPos) -> Self {
        Self { start, end }
    }

    /// Whole units `[start, end)`.
    #[must_use]
    pub fn units(start: usize, end: usize) -> Self {
        Self::new(TextPos::new(start, 0), TextPos::new(end, 0))
    }
}

/// Reference to one container or to an inclusive run of containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRef {
    One(ContainerId),
    /// From the start of the first through the end of the second.
    Through(ContainerId, ContainerId),
}

/// Sort `ranges` by start and merge those that overlap or touch, so the
/// result is ordered, disjoint and non-adjacent. Empty ranges are dropped.
#[must_use]
pub fn coalesce(mut ranges: Vec<TextRange>) -> Vec<TextRange> {
    ranges.retain(|r| r.start < r.end);
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Convert container references into coalesced text ranges.
///
/// References may come in any order and may overlap. The root container
/// stands for its children, minus supplementary provisions of amending
/// laws. With `following`, ranges that end at or before the cut point are
/// dropped and ranges straddling it start at it.
#[must_use]
pub fn container_ranges(
    containers: &ContainerTree,
    refs: &[ContainerRef],
    following: Option<TextPos>,
) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    for container_ref in refs {
        match *container_ref {
            ContainerRef::Through(from, to) => {
                let start = containers.get(from).range.0;
                let end = containers.get(to).range.1;
                if start <= end {
                    ranges.push(TextRange::units(start, end));
                }
            }
            ContainerRef::One(id) => {
                let container = containers.get(id);
                if container.container_type == ContainerType::Root {
                    for child in &container.children {
                        let child = containers.get(*child);
                        if child.tag == "SupplProvision" && child.amend_law_num.is_some() {
                            continue;
                        }
                        ranges.push(TextRange::units(child.range.0, child.range.1));
                    }
                } else {
                    ranges.push(TextRange::units(container.range.0, container.range.1));
                }
            }
        }
    }

    let ranges = coalesce(ranges);
    match following {
        Some(cut) => clip_following(ranges, cut),
        None => ranges,
    }
}

/// Drop what lies before `cut`.
#[must_use]
pub fn clip_following(ranges: Vec<TextRange>, cut: TextPos) -> Vec<TextRange> {
    ranges
        .into_iter()
        .filter(|r| r.end > cut)
        .map(|mut r| {
            if r.start < cut {
                r.start = cut;
            }
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::el::ElTree;
    use pretty_assertions::assert_eq;

    /// Law > MainProvision(0..4), SupplProvision(4..6), SupplProvision[AmendLawNum](6..9)
    fn law() -> (ContainerTree, Vec<ContainerId>) {
        let mut el = ElTree::new("Law");
        let law = el.root();
        let main = el.create("MainProvision");
        let suppl = el.create("SupplProvision");
        let amend = el.create_with("SupplProvision", [("AmendLawNum", "平成六年法律第一号")], []);
        let a1 = el.create_with("Article", [("Num", "1")], []);
        let a2 = el.create_with("Article", [("Num", "2")], []);

        let mut tree = ContainerTree::new();
        let c_law = tree.add_root(&el, law, 0);
        let c_main = tree.add_child(c_law, &el, main, 0).unwrap();
        let c_a1 = tree.add_child(c_main, &el, a1, 0).unwrap();
        tree.close(c_a1, 2);
        let c_a2 = tree.add_child(c_main, &el, a2, 2).unwrap();
        tree.close(c_a2, 4);
        tree.close(c_main, 4);
        let c_suppl = tree.add_child(c_law, &el, suppl, 4).unwrap();
        tree.close(c_suppl, 6);
        let c_amend = tree.add_child(c_law, &el, amend, 6).unwrap();
        tree.close(c_amend, 9);
        tree.close(c_law, 9);
        (tree, vec![c_law, c_main, c_a1, c_a2, c_suppl, c_amend])
    }

    #[test]
    fn test_coalesce_touching_and_overlapping() {
        let ranges = coalesce(vec![
            TextRange::units(5, 6),
            TextRange::units(2, 4),
            TextRange::units(0, 2),
            TextRange::units(1, 3),
            TextRange::units(7, 7),
        ]);
        assert_eq!(ranges, vec![TextRange::units(0, 4), TextRange::units(5, 6)]);
    }

    #[test]
    fn test_coalesce_keeps_offsets() {
        let ranges = coalesce(vec![
            TextRange::new(TextPos::new(2, 3), TextPos::new(4, 0)),
            TextRange::new(TextPos::new(1, 0), TextPos::new(2, 5)),
        ]);
        assert_eq!(ranges, vec![TextRange::new(TextPos::new(1, 0), TextPos::new(4, 0))]);
    }

    #[test]
    fn test_root_excludes_amendment_suppl_provision() {
        let (tree, ids) = law();
        let ranges = container_ranges(&tree, &[ContainerRef::One(ids[0])], None);
        assert_eq!(ranges, vec![TextRange::units(0, 6)]);
    }

    #[test]
    fn test_adjacent_containers_coalesce() {
        let (tree, ids) = law();
        let refs = [ContainerRef::One(ids[2]), ContainerRef::One(ids[3])];
        assert_eq!(container_ranges(&tree, &refs, None), vec![TextRange::units(0, 4)]);
    }

    #[test]
    fn test_through_pair() {
        let (tree, ids) = law();
        let refs = [ContainerRef::Through(ids[3], ids[4])];
        assert_eq!(container_ranges(&tree, &refs, None), vec![TextRange::units(2, 6)]);
    }

    #[test]
    fn test_following_clips_and_drops() {
        let (tree, ids) = law();
        let refs = [ContainerRef::One(ids[2]), ContainerRef::One(ids[4])];
        let ranges = container_ranges(&tree, &refs, Some(TextPos::new(1, 3)));
        assert_eq!(
            ranges,
            vec![TextRange::new(TextPos::new(1, 3), TextPos::new(2, 0)), TextRange::units(4, 6)]
        );

        let ranges = container_ranges(&tree, &refs, Some(TextPos::new(5, 0)));
        assert_eq!(ranges, vec![TextRange::units(5, 6)]);

        let ranges = container_ranges(&tree, &refs, Some(TextPos::new(2, 0)));
        assert_eq!(ranges, vec![TextRange::units(4, 6)]);
    }

    #[test]
    fn test_reversed_refs_are_sorted_and_merged() {
        let (tree, ids) = law();
        let refs = [ContainerRef::One(ids[3]), ContainerRef::One(ids[2])];
        assert_eq!(container_ranges(&tree, &refs, None), vec![TextRange::units(0, 4)]);

        let refs = [ContainerRef::One(ids[4]), ContainerRef::One(ids[2])];
        assert_eq!(
            container_ranges(&tree, &refs, None),
            vec![TextRange::units(0, 2), TextRange::units(4, 6)]
        );
    }

    #[test]
    fn test_overlapping_refs_merge() {
        let (tree, ids) = law();
        let refs = [ContainerRef::One(ids[1]), ContainerRef::One(ids[2])];
        assert_eq!(container_ranges(&tree, &refs, None), vec![TextRange::units(0, 4)]);

        let refs = [ContainerRef::One(ids[3]), ContainerRef::One(ids[0])];
        assert_eq!(container_ranges(&tree, &refs, None), vec![TextRange::units(0, 6)]);
    }

    #[test]
    fn test_reversed_refs_then_clipped() {
        let (tree, ids) = law();
        let refs = [ContainerRef::One(ids[3]), ContainerRef::One(ids[2])];
        let ranges = container_ranges(&tree, &refs, Some(TextPos::new(1, 3)));
        assert_eq!(ranges, vec![TextRange::new(TextPos::new(1, 3), TextPos::new(4, 0))]);
    }
}
