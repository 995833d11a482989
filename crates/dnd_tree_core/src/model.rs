use std::{
    borrow::Borrow,
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// Stable identifier of a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Open,
    Archived,
}

/// Presentation attributes carried alongside a node. The engine never interprets them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub professional: bool,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NodeMeta {
    /// Archived nodes are read-only.
    #[inline]
    pub fn is_editable(&self) -> bool {
        self.status == NodeStatus::Open
    }
}

/// A node of the authoritative tree, stored in a [`Forest`] arena.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub parent_id: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub meta: NodeMeta,
}

impl Node {
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The flat wire shape delivered by the data collaborator: one record per node, each naming
/// its parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(flatten)]
    pub meta: NodeMeta,
}

impl NodeRecord {
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_id: None,
            meta: NodeMeta::default(),
        }
    }

    pub fn parent(mut self, parent_id: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn meta(mut self, meta: NodeMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// A nested tree item, convenient for building a [`Forest`] by hand.
#[derive(Clone, Debug)]
pub struct TreeItem {
    pub id: NodeId,
    pub label: String,
    pub meta: NodeMeta,
    pub children: Vec<TreeItem>,
}

impl TreeItem {
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            meta: NodeMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: TreeItem) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl Into<Vec<TreeItem>>) -> Self {
        self.children.extend(children.into());
        self
    }

    pub fn status(mut self, status: NodeStatus) -> Self {
        self.meta.status = status;
        self
    }

    pub fn professional(mut self, professional: bool) -> Self {
        self.meta.professional = professional;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.meta.color = Some(color.into());
        self
    }
}

/// Id-indexed arena holding an ordered forest of nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Forest {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = TreeItem>) -> Self {
        let mut forest = Self::default();
        for item in items {
            let id = item.id.clone();
            if forest.insert_item(item, None) {
                forest.roots.push(id);
            }
        }
        forest
    }

    fn insert_item(&mut self, item: TreeItem, parent_id: Option<&NodeId>) -> bool {
        if self.nodes.contains_key(&item.id) {
            return false;
        }
        let TreeItem {
            id,
            label,
            meta,
            children,
        } = item;
        self.nodes.insert(
            id.clone(),
            Node {
                id: id.clone(),
                label,
                parent_id: parent_id.cloned(),
                children: Vec::with_capacity(children.len()),
                meta,
            },
        );
        for child in children {
            let child_id = child.id.clone();
            if self.insert_item(child, Some(&id))
                && let Some(node) = self.nodes.get_mut(&id)
            {
                node.children.push(child_id);
            }
        }
        true
    }

    /// Builds the forest from parent-referencing records. Sibling order follows record order.
    ///
    /// Records whose parent is not part of the payload are unreachable and dropped together
    /// with their descendants. When an id repeats, the first record wins.
    pub fn from_records(records: impl IntoIterator<Item = NodeRecord>) -> Self {
        let mut seen = HashSet::new();
        let records: Vec<NodeRecord> = records
            .into_iter()
            .filter(|record| seen.insert(record.id.clone()))
            .collect();

        let mut nodes: HashMap<NodeId, Node> = records
            .iter()
            .map(|record| {
                (
                    record.id.clone(),
                    Node {
                        id: record.id.clone(),
                        label: record.label.clone(),
                        parent_id: record.parent_id.clone(),
                        children: Vec::new(),
                        meta: record.meta.clone(),
                    },
                )
            })
            .collect();

        let mut roots = Vec::new();
        for record in &records {
            match record.parent_id.as_ref() {
                None => roots.push(record.id.clone()),
                Some(parent_id) => {
                    if let Some(parent) = nodes.get_mut(parent_id) {
                        parent.children.push(record.id.clone());
                    }
                }
            }
        }

        // Keep only what is reachable from a root.
        let mut reachable = HashSet::with_capacity(nodes.len());
        let mut stack: Vec<NodeId> = roots.clone();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id.clone()) {
                continue;
            }
            if let Some(node) = nodes.get(&id) {
                stack.extend(node.children.iter().cloned());
            }
        }
        nodes.retain(|id, _| reachable.contains(id));

        Self { nodes, roots }
    }

    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[inline]
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Ids of `id` and all of its descendants, in pre-order.
    pub fn subtree_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            stack.extend(node.children.iter().rev().cloned());
            out.push(id);
        }
        out
    }

    /// Whether `id` sits somewhere below `ancestor_id`.
    pub fn is_descendant_of(&self, id: &NodeId, ancestor_id: &NodeId) -> bool {
        let mut current = self.nodes.get(id).and_then(|node| node.parent_id.as_ref());
        while let Some(parent_id) = current {
            if parent_id == ancestor_id {
                return true;
            }
            current = self
                .nodes
                .get(parent_id)
                .and_then(|node| node.parent_id.as_ref());
        }
        false
    }
}
