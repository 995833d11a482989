use crate::{
    COLLAPSE_STORAGE_KEY, CollapseStorage, CollapseStore, DragEvent, DragState, FlatEntry, Forest,
    NodeId, Projection, ReparentIntent, flatten, project, visible_entries,
};

/// Horizontal distance, in pixels, of one depth level.
pub const DEFAULT_INDENTATION_WIDTH: f32 = 24.0;

/// Owns everything a rendered tree needs: the authoritative forest, collapse state, the
/// flattened and visible sequences, and the drag session with its projection.
pub struct TreeController {
    forest: Forest,
    collapse: CollapseStore,
    entries: Vec<FlatEntry>,
    visible: Vec<FlatEntry>,
    drag: DragState,
    projection: Option<Projection>,
    indentation_width: f32,
}

impl TreeController {
    /// Creates a controller whose collapse state lives in `storage` under
    /// [`COLLAPSE_STORAGE_KEY`].
    pub fn new(storage: impl CollapseStorage + 'static) -> Self {
        Self::with_storage_key(storage, COLLAPSE_STORAGE_KEY)
    }

    pub fn with_storage_key(storage: impl CollapseStorage + 'static, key: &str) -> Self {
        Self {
            forest: Forest::default(),
            collapse: CollapseStore::load(storage, key),
            entries: Vec::new(),
            visible: Vec::new(),
            drag: DragState::default(),
            projection: None,
            indentation_width: DEFAULT_INDENTATION_WIDTH,
        }
    }

    /// Set the width of one indentation level.
    ///
    /// This should match the indentation used by the row renderer.
    pub fn indentation_width(mut self, indentation_width: f32) -> Self {
        self.indentation_width = indentation_width;
        self.reproject();
        self
    }

    pub fn set_indentation_width(&mut self, indentation_width: f32) {
        self.indentation_width = indentation_width;
        self.reproject();
    }

    /// Replaces the forest with a fresh authoritative copy.
    ///
    /// Collapse state and an in-flight drag survive; everything derived is rebuilt.
    pub fn reconcile(&mut self, forest: Forest) {
        self.forest = forest;
        self.collapse.reconcile(&self.forest);
        self.entries = flatten(&self.forest, self.collapse.state());
        self.refilter();
        tracing::debug!(
            nodes = self.entries.len(),
            visible = self.visible.len(),
            "tree reconciled"
        );
    }

    /// Flips the collapsed flag of `id`. Returns the new value, or `None` when `id` is not
    /// part of the current forest.
    pub fn toggle(&mut self, id: &NodeId) -> Option<bool> {
        if !self.forest.contains(id) {
            tracing::debug!(%id, "toggle ignored for unknown node");
            return None;
        }
        let collapsed = self.collapse.toggle(id);
        for entry in self.entries.iter_mut().filter(|entry| entry.id == *id) {
            entry.collapsed = collapsed;
        }
        self.refilter();
        Some(collapsed)
    }

    pub fn start_drag(&mut self, id: NodeId) -> bool {
        if !self.drag.start(id) {
            return false;
        }
        self.refilter();
        true
    }

    pub fn drag_move(&mut self, delta_x: f32) {
        if self.drag.move_to(delta_x) {
            self.reproject();
        }
    }

    pub fn drag_over(&mut self, over_id: Option<NodeId>) {
        if self.drag.over(over_id) {
            self.reproject();
        }
    }

    /// Finishes the drag, returning the reparent intent for the mutation collaborator if the
    /// drop is valid. Nothing is applied locally.
    pub fn end_drag(&mut self) -> Option<ReparentIntent> {
        let intent = self.drag.end(self.projection.as_ref());
        self.refilter();
        intent
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
        self.refilter();
    }

    /// Feeds a neutral drag event through the drag state machine.
    pub fn handle(&mut self, event: DragEvent) -> Option<ReparentIntent> {
        let intent = self.drag.apply(event, self.projection.as_ref());
        self.refilter();
        intent
    }

    /// Tears down transient state, e.g. when the view goes away mid-drag.
    pub fn dispose(&mut self) {
        if self.drag.is_dragging() {
            self.cancel_drag();
        }
    }

    #[inline]
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    #[inline]
    pub fn collapse(&self) -> &CollapseStore {
        &self.collapse
    }

    /// Every node, in pre-order, regardless of visibility.
    #[inline]
    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    /// The sequence to render.
    #[inline]
    pub fn visible(&self) -> &[FlatEntry] {
        &self.visible
    }

    #[inline]
    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    #[inline]
    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    #[inline]
    pub fn active_id(&self) -> Option<&NodeId> {
        self.drag.active_id()
    }

    #[inline]
    pub fn over_id(&self) -> Option<&NodeId> {
        self.drag.over_id()
    }

    #[inline]
    pub fn indentation(&self) -> f32 {
        self.indentation_width
    }

    /// Depth to draw `entry` at: the projected depth for the dragged row, its own otherwise.
    pub fn display_depth(&self, entry: &FlatEntry) -> usize {
        match (self.drag.active_id(), self.projection.as_ref()) {
            (Some(active_id), Some(projection)) if *active_id == entry.id => projection.depth,
            _ => entry.depth,
        }
    }

    fn refilter(&mut self) {
        self.visible = visible_entries(&self.entries, self.drag.active_id());
        self.reproject();
    }

    fn reproject(&mut self) {
        self.projection = self.drag.session().and_then(|session| {
            let over_id = session.over_id.as_ref()?;
            project(
                &self.visible,
                &session.active_id,
                over_id,
                session.offset_left,
                self.indentation_width,
            )
        });
    }
}
