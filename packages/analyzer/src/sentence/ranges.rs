//! Sentence text ranges for container references.

use super::env::SentenceEnvs;
use crate::range::{container_ranges, ContainerRef, TextPos, TextRange};

/// Reference to containers by path id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerIdRange {
    One(String),
    /// Inclusive: from the start of the first through the end of the second.
    Through(String, String),
}

impl From<&str> for ContainerIdRange {
    fn from(id: &str) -> Self {
        Self::One(id.to_string())
    }
}

impl From<(&str, &str)> for ContainerIdRange {
    fn from((from, to): (&str, &str)) -> Self {
        Self::Through(from.to_string(), to.to_string())
    }
}

/// Convert container references into coalesced sentence text ranges.
///
/// Unknown ids are skipped. The root container stands for its children
/// except supplementary provisions of amending laws. With `following`, what
/// lies before that position is dropped.
#[must_use]
pub fn to_sentence_text_ranges(
    refs: &[ContainerIdRange],
    envs: &SentenceEnvs,
    following: Option<TextPos>,
) -> Vec<TextRange> {
    let resolved: Vec<ContainerRef> = refs
        .iter()
        .filter_map(|r| match r {
            ContainerIdRange::One(id) => envs.container(id).map(ContainerRef::One),
            ContainerIdRange::Through(from, to) => {
                match (envs.container(from), envs.container(to)) {
                    (Some(from), Some(to)) => Some(ContainerRef::Through(from, to)),
                    _ => {
                        tracing::debug!(from = %from, to = %to, "Unknown container in range");
                        None
                    }
                }
            }
        })
        .collect();
    container_ranges(&envs.containers, &resolved, following)
}
