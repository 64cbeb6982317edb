//! Tree builder: turns flat tag relations into a rooted forest.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::entities::{TagId, TagRecord, TreeNode};
use crate::domain::error::DomainError;

/// How a tag whose parents all point outside the collection is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingParents {
    /// Treat missing parents as absent: the tag becomes a root.
    #[default]
    Root,
    /// Keep the tag off the root level; it only shows up under real parents.
    Exclude,
}

impl FromStr for DanglingParents {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "root" => Ok(Self::Root),
            "exclude" => Ok(Self::Exclude),
            other => Err(DomainError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for DanglingParents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Exclude => write!(f, "exclude"),
        }
    }
}

/// Options for tree construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeOptions {
    pub dangling_parents: DanglingParents,
}

/// Parent-to-children adjacency over one tag snapshot.
///
/// Only the first record of a given id is indexed. Effective parents drop
/// self references, references to ids outside the snapshot and repeats.
pub(crate) struct TagIndex<'a> {
    pub(crate) tags: &'a [TagRecord],
    positions: HashMap<&'a TagId, usize>,
    children: HashMap<&'a TagId, Vec<usize>>,
    effective_parents: Vec<Vec<&'a TagId>>,
}

impl<'a> TagIndex<'a> {
    pub(crate) fn new(tags: &'a [TagRecord]) -> Self {
        let mut positions: HashMap<&TagId, usize> = HashMap::with_capacity(tags.len());
        for (i, tag) in tags.iter().enumerate() {
            positions.entry(&tag.id).or_insert(i);
        }

        let mut children: HashMap<&TagId, Vec<usize>> = HashMap::new();
        let mut effective_parents = Vec::with_capacity(tags.len());
        for (i, tag) in tags.iter().enumerate() {
            if positions.get(&tag.id) != Some(&i) {
                effective_parents.push(Vec::new());
                continue;
            }
            let parents: Vec<&TagId> = tag
                .parents
                .iter()
                .filter(|p| **p != tag.id && positions.contains_key(*p))
                .unique()
                .collect();
            for parent in &parents {
                children.entry(*parent).or_default().push(i);
            }
            effective_parents.push(parents);
        }

        Self {
            tags,
            positions,
            children,
            effective_parents,
        }
    }

    /// Whether the record at `i` is the one its id resolves to.
    pub(crate) fn is_primary(&self, i: usize) -> bool {
        self.positions.get(&self.tags[i].id) == Some(&i)
    }

    pub(crate) fn contains(&self, id: &TagId) -> bool {
        self.positions.contains_key(id)
    }

    pub(crate) fn position(&self, id: &TagId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Effective parents of the record at `i`.
    pub(crate) fn parents_of(&self, i: usize) -> &[&'a TagId] {
        &self.effective_parents[i]
    }

    /// Indices of the tags listing `id` as an effective parent, in input order.
    pub(crate) fn children_of(&self, id: &TagId) -> &[usize] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn has_dangling_parent(&self, i: usize) -> bool {
        let tag = &self.tags[i];
        tag.parents
            .iter()
            .any(|p| *p != tag.id && !self.positions.contains_key(p))
    }

    /// Indices of the root-level tags, in input order.
    pub(crate) fn roots(&self, policy: DanglingParents) -> Vec<usize> {
        (0..self.tags.len())
            .filter(|&i| self.is_primary(i) && self.effective_parents[i].is_empty())
            .filter(|&i| match policy {
                DanglingParents::Root => true,
                DanglingParents::Exclude => !self.has_dangling_parent(i),
            })
            .collect()
    }
}

/// Constructs the tag forest from a complete tag snapshot.
///
/// Cycles are cut per root-to-node path: a tag is skipped when it already
/// sits on the path leading to it, so a tag may still appear under several
/// different parents.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    options: TreeOptions,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> TreeOptions {
        self.options
    }

    /// Build the forest. Roots keep their input order, as do siblings.
    ///
    /// Descent runs on an explicit frame stack, so chain depth is bounded by
    /// heap, not by the thread stack.
    #[instrument(level = "debug", skip_all, fields(tags = tags.len()))]
    pub fn build(&self, tags: &[TagRecord]) -> Vec<TreeNode> {
        let index = TagIndex::new(tags);
        let roots = index.roots(self.options.dangling_parents);
        debug!("build: {} root(s) out of {} tag(s)", roots.len(), tags.len());

        Self::expand(&index, &roots)
    }

    /// The records that would head a tree, in input order.
    pub fn roots<'a>(&self, tags: &'a [TagRecord]) -> Vec<&'a TagRecord> {
        let index = TagIndex::new(tags);
        index
            .roots(self.options.dangling_parents)
            .into_iter()
            .map(|i| &tags[i])
            .collect()
    }

    /// Build one tree per root.
    ///
    /// A tag is entered only if it is not already on the current root-to-node
    /// path; it leaves the path once its subtree is complete.
    fn expand<'a>(index: &TagIndex<'a>, roots: &[usize]) -> Vec<TreeNode> {
        let tags: &'a [TagRecord] = index.tags;
        let mut forest = Vec::with_capacity(roots.len());
        let mut path: HashSet<&'a TagId> = HashSet::new();
        let mut stack: Vec<Frame<'_>> = Vec::new();

        for &root in roots {
            path.insert(&tags[root].id);
            stack.push(Frame::new(root, index.children_of(&tags[root].id)));

            while let Some(frame) = stack.last_mut() {
                if let Some(&next) = frame.candidates.get(frame.next) {
                    frame.next += 1;
                    let tag = &tags[next];
                    if path.insert(&tag.id) {
                        stack.push(Frame::new(next, index.children_of(&tag.id)));
                    } else {
                        trace!("expand: cycle edge to {} dropped", tag.id);
                    }
                    continue;
                }

                let Some(done) = stack.pop() else {
                    break;
                };
                let tag = &tags[done.tag];
                path.remove(&tag.id);
                let node = TreeNode {
                    id: tag.id.clone(),
                    name: tag.name.clone(),
                    children: done.children,
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => forest.push(node),
                }
            }
        }
        forest
    }
}

/// One tag being expanded: its candidate children and the finished ones.
struct Frame<'i> {
    tag: usize,
    candidates: &'i [usize],
    next: usize,
    children: Vec<TreeNode>,
}

impl<'i> Frame<'i> {
    fn new(tag: usize, candidates: &'i [usize]) -> Self {
        Self {
            tag,
            candidates,
            next: 0,
            children: Vec::with_capacity(candidates.len()),
        }
    }
}

/// Build the forest with default options.
pub fn build_tree(tags: &[TagRecord]) -> Vec<TreeNode> {
    TreeBuilder::new().build(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: i64, name: &str, parents: &[i64]) -> TagRecord {
        TagRecord::new(id, name).with_parents(parents.iter().copied())
    }

    #[test]
    fn given_duplicate_and_self_parents_when_indexing_then_effective_parents_are_clean() {
        let tags = vec![tag(1, "a", &[]), tag(2, "b", &[1, 1, 2, 99])];
        let index = TagIndex::new(&tags);

        assert_eq!(index.children_of(&TagId::Int(1)), &[1]);
        assert!(index.children_of(&TagId::Int(2)).is_empty());
        assert!(index.children_of(&TagId::Int(99)).is_empty());
        assert_eq!(index.roots(DanglingParents::Root), vec![0]);
    }

    #[test]
    fn given_repeated_id_when_indexing_then_first_record_wins() {
        let tags = vec![tag(1, "first", &[]), tag(1, "second", &[])];
        let index = TagIndex::new(&tags);

        assert!(index.is_primary(0));
        assert!(!index.is_primary(1));
        assert_eq!(index.roots(DanglingParents::Root), vec![0]);
    }

    #[test]
    fn given_policy_names_when_parsing_then_accepts_known_values() {
        assert_eq!("root".parse::<DanglingParents>(), Ok(DanglingParents::Root));
        assert_eq!(
            " Exclude ".parse::<DanglingParents>(),
            Ok(DanglingParents::Exclude)
        );
        assert_eq!(
            "drop".parse::<DanglingParents>(),
            Err(DomainError::UnknownPolicy("drop".to_string()))
        );
        assert_eq!(DanglingParents::Exclude.to_string(), "exclude");
    }

    #[test]
    fn given_long_chain_when_building_then_depth_matches_chain_length() {
        let mut tags = vec![tag(0, "t0", &[])];
        for i in 1..200 {
            tags.push(tag(i, &format!("t{i}"), &[i - 1]));
        }

        let forest = build_tree(&tags);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].depth(), 200);
    }
}
