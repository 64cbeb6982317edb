//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Opaque tag identifier as handed out by the storage layer.
///
/// Storage backends use either numeric or string keys; both round-trip
/// unchanged through serde.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagId {
    Int(i64),
    Text(String),
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagId::Int(n) => write!(f, "{}", n),
            TagId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for TagId {
    fn from(value: i64) -> Self {
        TagId::Int(value)
    }
}

impl From<i32> for TagId {
    fn from(value: i32) -> Self {
        TagId::Int(i64::from(value))
    }
}

impl From<&str> for TagId {
    fn from(value: &str) -> Self {
        TagId::Text(value.to_string())
    }
}

impl From<String> for TagId {
    fn from(value: String) -> Self {
        TagId::Text(value)
    }
}

/// A tag snapshot as fetched from storage, with relations populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Unique identifier
    pub id: TagId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Parent tag ids; authoritative for tree construction
    #[serde(default, deserialize_with = "relation_ids")]
    pub parents: Vec<TagId>,
    /// Child tag ids as reported by storage; only used for diagnostics
    #[serde(default, deserialize_with = "relation_ids")]
    pub children: Vec<TagId>,
}

impl TagRecord {
    pub fn new(id: impl Into<TagId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_parents<I, T>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TagId>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TagId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Reject records whose shape cannot identify a tag.
    ///
    /// `position` is the record's index in the fetched collection and only
    /// feeds the error message.
    pub fn validate(&self, position: usize) -> DomainResult<()> {
        if let TagId::Text(s) = &self.id {
            if s.trim().is_empty() {
                return Err(DomainError::InvalidRecord {
                    position,
                    message: "empty id".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A relation entry: either a bare id or a populated relation object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RelationRef {
    Id(TagId),
    Populated { id: TagId },
}

impl RelationRef {
    fn into_id(self) -> TagId {
        match self {
            RelationRef::Id(id) | RelationRef::Populated { id } => id,
        }
    }
}

/// Accepts `null`, `[1, 2]` or `[{"id": 1, ...}, ...]`.
fn relation_ids<'de, D>(deserializer: D) -> Result<Vec<TagId>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs: Option<Vec<RelationRef>> = Option::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .map(RelationRef::into_id)
        .collect())
}

/// A node in the built tag forest.
///
/// Each occurrence owns its subtree; a tag with several parents shows up
/// once per parent with an independently built set of children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: TagId,
    pub name: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(id: impl Into<TagId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Number of levels in this subtree, counting the node itself.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|c| (c, level + 1)));
        }
        deepest
    }

    /// Number of nodes in this subtree, including replicated occurrences.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// Names of all leaves, left to right.
    pub fn leaf_names(&self) -> Vec<String> {
        let mut leaves = Vec::new();
        self.walk(&mut |node| {
            if node.children.is_empty() {
                leaves.push(node.name.clone());
            }
        });
        leaves
    }

    /// Visit every node of the subtree in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            visit(node);
            stack.extend(node.children.iter().rev());
        }
    }
}

impl Drop for TreeNode {
    // Flattened: dropping a long chain must not recurse once per level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
