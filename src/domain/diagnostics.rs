//! Topology diagnostics for a tag snapshot.
//!
//! Tree construction silently normalizes malformed relations; this report
//! makes them visible. It never influences the built forest.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::instrument;

use crate::domain::builder::{TagIndex, TreeOptions};
use crate::domain::entities::{TagId, TagRecord};

/// A parent/child relation between two tag ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub tag: TagId,
    pub parent: TagId,
}

impl Edge {
    fn new(tag: &TagId, parent: &TagId) -> Self {
        Self {
            tag: tag.clone(),
            parent: parent.clone(),
        }
    }
}

/// Malformed relations found in one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologyReport {
    /// Parent references to ids absent from the snapshot
    pub dangling: Vec<Edge>,
    /// Tags listing themselves as parent
    pub self_loops: Vec<TagId>,
    /// Parent references listed more than once on the same tag
    pub duplicate_parents: Vec<Edge>,
    /// Ids carried by more than one record; only the first record is used
    pub duplicate_ids: Vec<TagId>,
    /// Tags lying on a parent cycle of length two or more
    pub cycles: Vec<TagId>,
    /// Edges present in `children` or `parents` but not mirrored on the other side
    pub asymmetric: Vec<Edge>,
    /// Tags that do not appear anywhere in the built forest
    pub unreachable: Vec<TagId>,
}

impl TopologyReport {
    #[instrument(level = "debug", skip_all, fields(tags = tags.len()))]
    pub fn analyze(tags: &[TagRecord], options: TreeOptions) -> Self {
        let index = TagIndex::new(tags);
        let mut report = Self::default();

        let mut seen_duplicate_ids: HashSet<&TagId> = HashSet::new();
        for (i, tag) in tags.iter().enumerate() {
            if !index.is_primary(i) {
                if seen_duplicate_ids.insert(&tag.id) {
                    report.duplicate_ids.push(tag.id.clone());
                }
                continue;
            }

            let mut counts: HashMap<&TagId, usize> = HashMap::new();
            for parent in &tag.parents {
                let count = counts.entry(parent).or_insert(0);
                *count += 1;
                if *count == 2 {
                    report.duplicate_parents.push(Edge::new(&tag.id, parent));
                }
                if *count > 1 {
                    continue;
                }
                if *parent == tag.id {
                    report.self_loops.push(tag.id.clone());
                } else if !index.contains(parent) {
                    report.dangling.push(Edge::new(&tag.id, parent));
                }
            }
        }

        report.cycles = find_cycle_members(&index);
        report.asymmetric = find_asymmetric_edges(&index);
        report.unreachable = find_unreachable(&index, options);
        report
    }

    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty()
            && self.self_loops.is_empty()
            && self.duplicate_parents.is_empty()
            && self.duplicate_ids.is_empty()
            && self.cycles.is_empty()
            && self.asymmetric.is_empty()
            && self.unreachable.is_empty()
    }

    /// Category name and entry count for every non-empty category.
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        self.sections()
            .into_iter()
            .map(|(category, entries)| (category, entries.len()))
            .collect()
    }

    /// Category name and printable entries for every non-empty category.
    ///
    /// Edges print as `parent <- tag`.
    pub fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        fn edges(edges: &[Edge]) -> Vec<String> {
            edges
                .iter()
                .map(|e| format!("{} <- {}", e.parent, e.tag))
                .collect()
        }
        fn ids(ids: &[TagId]) -> Vec<String> {
            ids.iter().map(ToString::to_string).collect()
        }

        vec![
            ("dangling parents", edges(&self.dangling)),
            ("self loops", ids(&self.self_loops)),
            ("duplicate parents", edges(&self.duplicate_parents)),
            ("duplicate ids", ids(&self.duplicate_ids)),
            ("cycle members", ids(&self.cycles)),
            ("asymmetric edges", edges(&self.asymmetric)),
            ("unreachable tags", ids(&self.unreachable)),
        ]
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .collect()
    }
}

/// Tags sharing a strongly connected component of size two or more.
///
/// Kosaraju on explicit stacks: finish order over child edges, then
/// components over parent edges. Linear in tags plus edges.
fn find_cycle_members(index: &TagIndex<'_>) -> Vec<TagId> {
    let tags = index.tags;
    let n = tags.len();

    let mut visited = vec![false; n];
    let mut finish_order = Vec::with_capacity(n);
    for start in 0..n {
        if !index.is_primary(start) || visited[start] {
            continue;
        }
        visited[start] = true;
        let mut stack = vec![(start, 0usize)];
        while let Some((node, next)) = stack.last_mut() {
            if let Some(&child) = index.children_of(&tags[*node].id).get(*next) {
                *next += 1;
                if !visited[child] {
                    visited[child] = true;
                    stack.push((child, 0));
                }
            } else {
                finish_order.push(*node);
                stack.pop();
            }
        }
    }

    let mut component: Vec<Option<usize>> = vec![None; n];
    let mut sizes: Vec<usize> = Vec::new();
    for &start in finish_order.iter().rev() {
        if component[start].is_some() {
            continue;
        }
        let id = sizes.len();
        sizes.push(0);
        component[start] = Some(id);
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            sizes[id] += 1;
            for parent in index.parents_of(node) {
                if let Some(p) = index.position(parent) {
                    if component[p].is_none() {
                        component[p] = Some(id);
                        stack.push(p);
                    }
                }
            }
        }
    }

    (0..n)
        .filter(|&i| index.is_primary(i))
        .filter(|&i| component[i].is_some_and(|c| sizes[c] > 1))
        .map(|i| tags[i].id.clone())
        .collect()
}

/// Compare `children` lists against `parents` lists.
///
/// Skipped entirely when no record reports children, since the storage
/// layer then simply did not populate that side.
fn find_asymmetric_edges(index: &TagIndex<'_>) -> Vec<Edge> {
    let tags = index.tags;
    if tags.iter().all(|t| t.children.is_empty()) {
        return Vec::new();
    }

    let mut edges: Vec<Edge> = Vec::new();
    let mut seen: HashSet<Edge> = HashSet::new();
    let mut push = |edge: Edge| {
        if seen.insert(edge.clone()) {
            edges.push(edge);
        }
    };

    for (i, tag) in tags.iter().enumerate() {
        if !index.is_primary(i) {
            continue;
        }
        for child in &tag.children {
            if let Some(pos) = index.position(child) {
                if !tags[pos].parents.contains(&tag.id) {
                    push(Edge::new(child, &tag.id));
                }
            }
        }
        for parent in &tag.parents {
            if let Some(pos) = index.position(parent) {
                if !tags[pos].children.contains(&tag.id) {
                    push(Edge::new(&tag.id, parent));
                }
            }
        }
    }
    edges
}

/// Tags not reachable from any root along child edges.
///
/// Path-local cycle cutting never hides a reachable tag, so this matches the
/// set of tags missing from the built forest without building it.
fn find_unreachable(index: &TagIndex<'_>, options: TreeOptions) -> Vec<TagId> {
    let tags = index.tags;
    let mut reached = vec![false; tags.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for root in index.roots(options.dangling_parents) {
        reached[root] = true;
        queue.push_back(root);
    }
    while let Some(i) = queue.pop_front() {
        for &child in index.children_of(&tags[i].id) {
            if !reached[child] {
                reached[child] = true;
                queue.push_back(child);
            }
        }
    }

    (0..tags.len())
        .filter(|&i| index.is_primary(i) && !reached[i])
        .map(|i| tags[i].id.clone())
        .collect()
}
