use crate::{FlatEntry, NodeId};

/// Where the dragged node would land if dropped now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    pub depth: usize,
    pub max_depth: usize,
    pub min_depth: usize,
    pub parent_id: Option<NodeId>,
}

/// Whole indentation levels covered by a horizontal offset. Halves round up.
pub fn drag_depth(offset_left: f32, indentation_width: f32) -> i64 {
    if indentation_width.is_nan() || indentation_width <= 0.0 || !offset_left.is_finite() {
        return 0;
    }
    (offset_left / indentation_width + 0.5).floor() as i64
}

/// Removes the element at `from` and reinserts it at `to`.
pub fn move_element<T>(mut items: Vec<T>, from: usize, to: usize) -> Vec<T> {
    if from >= items.len() {
        return items;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    items
}

/// Computes the depth and parent `active_id` would take if dropped over `over_id`.
///
/// `visible` must be the rendered sequence, i.e. with the active node's subtree already
/// removed. Returns `None` when either id is not part of it.
pub fn project(
    visible: &[FlatEntry],
    active_id: &NodeId,
    over_id: &NodeId,
    offset_left: f32,
    indentation_width: f32,
) -> Option<Projection> {
    let active_ix = visible.iter().position(|entry| entry.id == *active_id)?;
    let over_ix = visible.iter().position(|entry| entry.id == *over_id)?;
    let active = &visible[active_ix];

    let moved = move_element(visible.iter().collect::<Vec<_>>(), active_ix, over_ix);
    let previous = over_ix.checked_sub(1).and_then(|ix| moved.get(ix)).copied();
    let next = moved.get(over_ix + 1).copied();

    let projected_depth =
        (active.depth as i64).saturating_add(drag_depth(offset_left, indentation_width));
    let max_depth = previous.map_or(0, |entry| entry.depth + 1);
    let min_depth = next.map_or(0, |entry| entry.depth);

    // The upper bound wins should the bounds ever cross.
    let depth = if projected_depth >= max_depth as i64 {
        max_depth
    } else if projected_depth < min_depth as i64 {
        min_depth
    } else {
        projected_depth as usize
    };

    let parent_id = match previous {
        None => None,
        Some(_) if depth == 0 => None,
        Some(previous) if depth == previous.depth => previous.parent_id.clone(),
        Some(previous) if depth > previous.depth => Some(previous.id.clone()),
        Some(_) => moved[..over_ix]
            .iter()
            .rev()
            .find(|entry| entry.depth == depth)
            .and_then(|entry| entry.parent_id.clone()),
    };

    Some(Projection {
        depth,
        max_depth,
        min_depth,
        parent_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollapseState, Forest, TreeItem, flatten, visible_entries};

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    fn expanded(items: Vec<TreeItem>) -> Vec<FlatEntry> {
        let forest = Forest::from_items(items);
        let state: CollapseState = forest.ids().map(|id| (id.clone(), false)).collect();
        flatten(&forest, &state)
    }

    fn visible_while_dragging(items: Vec<TreeItem>, active: &str) -> Vec<FlatEntry> {
        visible_entries(&expanded(items), Some(&id(active)))
    }

    #[test]
    fn drag_depth_rounds_half_up() {
        assert_eq!(drag_depth(0.0, 24.0), 0);
        assert_eq!(drag_depth(11.9, 24.0), 0);
        assert_eq!(drag_depth(12.0, 24.0), 1);
        assert_eq!(drag_depth(-12.0, 24.0), 0);
        assert_eq!(drag_depth(-12.1, 24.0), -1);
        assert_eq!(drag_depth(50.0, 24.0), 2);
        assert_eq!(drag_depth(50.0, 0.0), 0);
        assert_eq!(drag_depth(f32::NAN, 24.0), 0);
    }

    #[test]
    fn extreme_offsets_clamp_without_overflow() {
        let visible = visible_while_dragging(
            vec![TreeItem::new("A", "A").child(TreeItem::new("B", "B"))],
            "B",
        );
        let deepest = project(&visible, &id("B"), &id("B"), f32::MAX, 24.0).unwrap();
        assert_eq!(deepest.depth, 1);
        assert_eq!(deepest.parent_id, Some(id("A")));

        let shallowest = project(&visible, &id("B"), &id("B"), f32::MIN, 24.0).unwrap();
        assert_eq!(shallowest.depth, 0);
        assert_eq!(shallowest.parent_id, None);

        let tiny_width = project(&visible, &id("B"), &id("B"), 1.0, f32::MIN_POSITIVE).unwrap();
        assert_eq!(tiny_width.depth, 1);
    }

    #[test]
    fn move_element_reinserts() {
        assert_eq!(move_element(vec![1, 2, 3, 4], 3, 1), vec![1, 4, 2, 3]);
        assert_eq!(move_element(vec![1, 2, 3, 4], 0, 2), vec![2, 3, 1, 4]);
        assert_eq!(move_element(vec![1, 2], 5, 0), vec![1, 2]);
    }

    #[test]
    fn missing_ids_yield_no_projection() {
        let visible = visible_while_dragging(vec![TreeItem::new("A", "A")], "A");
        assert!(project(&visible, &id("A"), &id("zzz"), 0.0, 24.0).is_none());
        assert!(project(&visible, &id("zzz"), &id("A"), 0.0, 24.0).is_none());
    }

    #[test]
    fn first_position_is_always_root() {
        let visible = visible_while_dragging(
            vec![TreeItem::new("R1", "R1"), TreeItem::new("R2", "R2")],
            "R2",
        );
        let projection = project(&visible, &id("R2"), &id("R1"), 200.0, 24.0).unwrap();
        assert_eq!(
            projection,
            Projection {
                depth: 0,
                max_depth: 0,
                min_depth: 0,
                parent_id: None,
            }
        );
    }

    #[test]
    fn indenting_in_place_nests_under_previous_sibling() {
        let visible = visible_while_dragging(
            vec![TreeItem::new("R1", "R1"), TreeItem::new("R2", "R2")],
            "R2",
        );
        let projection = project(&visible, &id("R2"), &id("R2"), 24.0, 24.0).unwrap();
        assert_eq!(projection.depth, 1);
        assert_eq!(projection.parent_id, Some(id("R1")));

        // Dragging further right cannot skip a level.
        let projection = project(&visible, &id("R2"), &id("R2"), 240.0, 24.0).unwrap();
        assert_eq!(projection.depth, 1);
        assert_eq!(projection.max_depth, 1);
    }

    #[test]
    fn next_item_bounds_depth_from_below() {
        // A > B > C, D root. Dragging D between B and C must stay deep enough to not adopt C.
        let visible = visible_while_dragging(
            vec![
                TreeItem::new("A", "A")
                    .child(TreeItem::new("B", "B").child(TreeItem::new("C", "C"))),
                TreeItem::new("D", "D"),
            ],
            "D",
        );
        let projection = project(&visible, &id("D"), &id("C"), -500.0, 24.0).unwrap();
        assert_eq!(projection.min_depth, 2);
        assert_eq!(projection.depth, 2);
        assert_eq!(projection.parent_id, Some(id("B")));
    }

    #[test]
    fn outdenting_resolves_parent_by_scanning_backwards() {
        // A > B > C, A > D. Drag D left by one level while it stays after C.
        let visible = visible_while_dragging(
            vec![
                TreeItem::new("A", "A")
                    .child(TreeItem::new("B", "B").child(TreeItem::new("C", "C")))
                    .child(TreeItem::new("D", "D")),
                TreeItem::new("E", "E"),
            ],
            "D",
        );

        let stay = project(&visible, &id("D"), &id("D"), 0.0, 24.0).unwrap();
        assert_eq!(stay.depth, 1);
        assert_eq!(stay.parent_id, Some(id("A")));

        let right = project(&visible, &id("D"), &id("D"), 24.0, 24.0).unwrap();
        assert_eq!(right.depth, 2);
        assert_eq!(right.parent_id, Some(id("B")));

        let left = project(&visible, &id("D"), &id("D"), -24.0, 24.0).unwrap();
        assert_eq!(left.depth, 0);
        assert_eq!(left.parent_id, None);
    }

    #[test]
    fn same_depth_as_previous_becomes_its_sibling() {
        let visible = visible_while_dragging(
            vec![
                TreeItem::new("A", "A")
                    .child(TreeItem::new("B", "B"))
                    .child(TreeItem::new("C", "C")),
                TreeItem::new("X", "X"),
            ],
            "X",
        );
        // X moves between B and C, offset adds one level: depth 1 == B.depth.
        let projection = project(&visible, &id("X"), &id("C"), 24.0, 24.0).unwrap();
        assert_eq!(projection.depth, 1);
        assert_eq!(projection.parent_id, Some(id("A")));
    }

    #[test]
    fn moving_down_uses_post_move_neighbours() {
        // R1, R2, R3 roots; drag R1 over R3 -> lands after R3.
        let visible = visible_while_dragging(
            vec![
                TreeItem::new("R1", "R1"),
                TreeItem::new("R2", "R2"),
                TreeItem::new("R3", "R3"),
            ],
            "R1",
        );
        let projection = project(&visible, &id("R1"), &id("R3"), 24.0, 24.0).unwrap();
        assert_eq!(projection.depth, 1);
        assert_eq!(projection.min_depth, 0);
        assert_eq!(projection.parent_id, Some(id("R3")));
    }
}
