use std::collections::HashSet;

use crate::{FlatEntry, NodeId};

/// Drops every transitive descendant of `suppressed` from a pre-order sequence.
///
/// The suppressed entries themselves stay visible.
pub fn remove_children_of(entries: &[FlatEntry], suppressed: &HashSet<NodeId>) -> Vec<FlatEntry> {
    let mut excluded: HashSet<&NodeId> = suppressed.iter().collect();
    let mut visible = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry
            .parent_id
            .as_ref()
            .is_some_and(|parent_id| excluded.contains(parent_id))
        {
            if entry.has_children {
                excluded.insert(&entry.id);
            }
            continue;
        }
        visible.push(entry.clone());
    }

    visible
}

/// Ids whose subtrees must be hidden: collapsed nodes with children, plus the dragged node.
pub fn suppressed_ids(entries: &[FlatEntry], active_id: Option<&NodeId>) -> HashSet<NodeId> {
    entries
        .iter()
        .filter(|entry| entry.hides_children())
        .map(|entry| entry.id.clone())
        .chain(active_id.cloned())
        .collect()
}

/// Flat entries as rendered: collapsed and dragged subtrees removed.
pub fn visible_entries(entries: &[FlatEntry], active_id: Option<&NodeId>) -> Vec<FlatEntry> {
    remove_children_of(entries, &suppressed_ids(entries, active_id))
}
