use crate::{CollapseState, Forest, NodeId, NodeMeta};

/// A flat representation of a tree node with its depth.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatEntry {
    pub id: NodeId,
    pub label: String,
    pub parent_id: Option<NodeId>,
    pub depth: usize,
    /// Position among its siblings.
    pub index: usize,
    pub has_children: bool,
    pub collapsed: bool,
    pub meta: NodeMeta,
}

impl FlatEntry {
    #[inline]
    pub fn is_editable(&self) -> bool {
        self.meta.is_editable()
    }

    /// Collapsed with something to hide.
    #[inline]
    pub fn hides_children(&self) -> bool {
        self.collapsed && self.has_children
    }
}

/// Pre-order walk of `forest`, one entry per node.
///
/// Ids missing from `collapsed` are reported as collapsed.
pub fn flatten(forest: &Forest, collapsed: &CollapseState) -> Vec<FlatEntry> {
    let mut entries = Vec::with_capacity(forest.len());
    let mut stack: Vec<(&NodeId, Option<&NodeId>, usize, usize)> = forest
        .roots()
        .iter()
        .enumerate()
        .rev()
        .map(|(index, id)| (id, None, 0, index))
        .collect();

    while let Some((id, parent_id, depth, index)) = stack.pop() {
        let Some(node) = forest.get(id) else {
            continue;
        };

        entries.push(FlatEntry {
            id: node.id.clone(),
            label: node.label.clone(),
            parent_id: parent_id.cloned(),
            depth,
            index,
            has_children: node.has_children(),
            collapsed: collapsed.get(&node.id).copied().unwrap_or(true),
            meta: node.meta.clone(),
        });

        stack.extend(
            node.children
                .iter()
                .enumerate()
                .rev()
                .map(|(index, child_id)| (child_id, Some(&node.id), depth + 1, index)),
        );
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreeItem;

    fn dump(entries: &[FlatEntry]) -> String {
        let mut out = String::new();
        for entry in entries {
            out.push_str(&"  ".repeat(entry.depth));
            out.push_str(entry.id.as_str());
            out.push_str(&format!(" #{}", entry.index));
            out.push('\n');
        }
        out
    }

    #[test]
    fn flatten_is_pre_order_with_sibling_indices() {
        let forest = Forest::from_items([
            TreeItem::new("A", "A")
                .child(TreeItem::new("B", "B").child(TreeItem::new("C", "C")))
                .child(TreeItem::new("D", "D")),
            TreeItem::new("E", "E"),
        ]);

        let entries = flatten(&forest, &CollapseState::new());
        assert_eq!(
            dump(&entries).trim(),
            r#"A #0
  B #0
    C #0
  D #1
E #1"#
        );
        assert_eq!(entries[2].parent_id, Some(NodeId::new("B")));
        assert_eq!(entries[4].parent_id, None);
        assert!(entries[0].has_children);
        assert!(!entries[2].has_children);
    }

    #[test]
    fn collapsed_flag_defaults_to_true() {
        let forest = Forest::from_items([TreeItem::new("A", "A").child(TreeItem::new("B", "B"))]);
        let mut state = CollapseState::new();
        state.insert(NodeId::new("A"), false);

        let entries = flatten(&forest, &state);
        assert!(!entries[0].collapsed);
        assert!(entries[1].collapsed);
        assert!(!entries[1].hides_children());
    }

    #[test]
    fn empty_forest_flattens_to_nothing() {
        assert!(flatten(&Forest::new(), &CollapseState::new()).is_empty());
    }
}
