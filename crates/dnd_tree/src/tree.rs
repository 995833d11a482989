use std::{ops::Range, rc::Rc};

use gpui::{
    App, AppContext as _, Context, ElementId, Entity, EntityId, FocusHandle,
    InteractiveElement as _, IntoElement, ListSizingBehavior, ParentElement as _, Pixels, Point,
    Render, RenderOnce, SharedString, StatefulInteractiveElement as _, StyleRefinement, Styled,
    UniformListScrollHandle, Window, div, prelude::FluentBuilder as _, px, uniform_list,
};
use gpui_component::list::ListItem;
use gpui_component::scroll::{Scrollbar, ScrollbarState};
use gpui_component::{ActiveTheme as _, StyledExt as _};
use gpui_dnd_tree_core::{
    CollapseStorage, DEFAULT_INDENTATION_WIDTH, FlatEntry, Forest, NodeId, Projection,
    ReparentIntent, TreeController,
};

const CONTEXT: &str = "DndTree";

/// Create a [`DndTree`].
pub fn dnd_tree<R>(state: &Entity<DndTreeState>, render_item: R) -> DndTree
where
    R: Fn(usize, &FlatEntry, DndTreeRowState, &mut Window, &mut App) -> ListItem + 'static,
{
    DndTree::new(state, render_item)
}

#[derive(Clone)]
struct DndTreeDrag {
    tree_id: EntityId,
    item_id: NodeId,
    label: SharedString,
}

struct DragGhost {
    label: SharedString,
}

impl DragGhost {
    fn new(label: SharedString) -> Self {
        Self { label }
    }
}

impl Render for DragGhost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        div()
            .px(px(10.))
            .py(px(6.))
            .rounded(px(8.))
            .bg(theme.popover)
            .border_1()
            .border_color(theme.border)
            .shadow_md()
            .text_color(theme.popover_foreground)
            .text_sm()
            .child(self.label.clone())
    }
}

/// Index of the gap the dragged row lands in.
///
/// Moving down lands below the hovered row, moving up lands above it.
fn drop_gap(active_ix: usize, over_ix: usize) -> usize {
    if active_ix < over_ix { over_ix + 1 } else { over_ix }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DndTreeRowState {
    pub selected: bool,
    pub dragging: bool,
    /// Depth to indent the row by. Follows the projection while the row is dragged.
    pub depth: usize,
}

type RenderItem =
    Rc<dyn Fn(usize, &FlatEntry, DndTreeRowState, &mut Window, &mut App) -> ListItem>;

/// State for a tree whose rows can be collapsed and dragged onto new parents.
///
/// Drops are not applied locally: the reparent intent goes to [`DndTreeState::on_reparent`]
/// and the tree only changes once a refreshed forest is passed to
/// [`DndTreeState::set_forest`].
pub struct DndTreeState {
    focus_handle: FocusHandle,
    controller: TreeController,
    indent_width: Pixels,
    indent_offset: Pixels,
    scrollbar_state: ScrollbarState,
    scroll_handle: UniformListScrollHandle,
    selected_id: Option<NodeId>,
    drag_origin_x: Option<Pixels>,
    render_item: RenderItem,
    on_reparent: Option<Rc<dyn Fn(&ReparentIntent, &mut Window, &mut App)>>,
}

impl DndTreeState {
    pub fn new(storage: impl CollapseStorage + 'static, cx: &mut App) -> Self {
        Self {
            focus_handle: cx.focus_handle(),
            controller: TreeController::new(storage),
            indent_width: px(DEFAULT_INDENTATION_WIDTH),
            indent_offset: px(0.),
            scrollbar_state: ScrollbarState::default(),
            scroll_handle: UniformListScrollHandle::default(),
            selected_id: None,
            drag_origin_x: None,
            render_item: Rc::new(|_, _, _, _, _| ListItem::new("dnd-tree-empty")),
            on_reparent: None,
        }
    }

    /// Set the indentation width (in pixels) used to infer the intended depth during DnD.
    ///
    /// This should match the indentation used by your row renderer.
    pub fn indent_width(mut self, indent_width: Pixels) -> Self {
        self.indent_width = indent_width;
        self.controller.set_indentation_width(indent_width / px(1.));
        self
    }

    /// Set the left offset applied before the first indentation level.
    ///
    /// This is purely visual and does not affect depth projection.
    pub fn indent_offset(mut self, indent_offset: Pixels) -> Self {
        self.indent_offset = indent_offset;
        self
    }

    /// Provide a callback receiving the reparent intent of every valid drop.
    pub fn on_reparent(
        mut self,
        on_reparent: impl Fn(&ReparentIntent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_reparent = Some(Rc::new(on_reparent));
        self
    }

    pub fn forest(mut self, forest: Forest) -> Self {
        self.controller.reconcile(forest);
        self
    }

    /// Feed a refreshed authoritative forest.
    pub fn set_forest(&mut self, forest: Forest, cx: &mut Context<Self>) {
        self.controller.reconcile(forest);
        if let Some(selected_id) = self.selected_id.as_ref()
            && !self.controller.forest().contains(selected_id)
        {
            self.selected_id = None;
        }
        cx.notify();
    }

    pub fn controller(&self) -> &TreeController {
        &self.controller
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.controller.projection()
    }

    pub fn selected_entry(&self) -> Option<&FlatEntry> {
        let selected_id = self.selected_id.as_ref()?;
        self.controller
            .visible()
            .iter()
            .find(|entry| entry.id == *selected_id)
    }

    pub fn toggle(&mut self, id: &NodeId, cx: &mut Context<Self>) {
        if self.controller.toggle(id).is_some() {
            cx.notify();
        }
    }

    fn on_entry_click(
        &mut self,
        id: &NodeId,
        _event: &gpui::ClickEvent,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.selected_id = Some(id.clone());
        let has_children = self
            .controller
            .visible()
            .iter()
            .any(|entry| entry.id == *id && entry.has_children);
        if has_children {
            self.toggle(id, cx);
        }
        cx.notify();
    }

    fn on_drag_start(
        &mut self,
        drag: &DndTreeDrag,
        _cursor_offset: Point<Pixels>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !self.controller.start_drag(drag.item_id.clone()) {
            return;
        }
        self.drag_origin_x = Some(window.mouse_position().x);
        self.selected_id = Some(drag.item_id.clone());
        cx.notify();
    }

    fn drag_delta_x(&self, mouse_x: Pixels) -> f32 {
        self.drag_origin_x
            .map(|origin_x| (mouse_x - origin_x) / px(1.))
            .unwrap_or(0.)
    }

    fn on_drag_move(
        &mut self,
        event: &gpui::DragMoveEvent<DndTreeDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() {
            return;
        }

        let drag = event.drag(cx);
        if drag.tree_id != cx.entity_id() {
            return;
        }

        let mouse_position = event.event.position;
        if !event.bounds.contains(&mouse_position) && self.controller.over_id().is_some() {
            self.controller.drag_over(None);
            cx.notify();
        }
    }

    fn on_row_drag_move(
        &mut self,
        row_id: &NodeId,
        event: &gpui::DragMoveEvent<DndTreeDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() {
            return;
        }

        let drag = event.drag(cx);
        if drag.tree_id != cx.entity_id() {
            return;
        }

        let mouse_position = event.event.position;
        if !event.bounds.contains(&mouse_position) {
            return;
        }

        let previous = self.controller.projection().cloned();
        self.controller.drag_move(self.drag_delta_x(mouse_position.x));
        if self.controller.over_id() != Some(row_id) {
            self.controller.drag_over(Some(row_id.clone()));
        }
        if self.controller.projection() != previous.as_ref() {
            cx.notify();
        }
    }

    fn on_drop(&mut self, drag: &DndTreeDrag, window: &mut Window, cx: &mut Context<Self>) {
        self.drag_origin_x = None;
        if drag.tree_id != cx.entity_id() {
            self.controller.cancel_drag();
            cx.notify();
            return;
        }

        let intent = self.controller.end_drag();
        cx.notify();

        if let Some(intent) = intent
            && let Some(on_reparent) = self.on_reparent.clone()
        {
            on_reparent(&intent, window, cx);
        }
    }
}

impl Render for DndTreeState {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if !cx.has_active_drag() && self.controller.drag_state().is_dragging() {
            // The gesture ended outside of any drop target.
            self.controller.cancel_drag();
            self.drag_origin_x = None;
        }

        let render_item = Rc::clone(&self.render_item);
        let state_entity = cx.entity();
        let indent_width = self.indent_width;
        let indent_offset = self.indent_offset;

        let line = self
            .controller
            .projection()
            .zip(self.controller.over_id())
            .and_then(|(projection, over_id)| {
                let visible = self.controller.visible();
                let over_ix = visible.iter().position(|entry| entry.id == *over_id)?;
                let active_ix = self
                    .controller
                    .active_id()
                    .and_then(|active_id| visible.iter().position(|entry| entry.id == *active_id))?;
                Some((drop_gap(active_ix, over_ix), projection.depth))
            })
            .map(|(gap, depth)| {
                let theme = cx.theme();
                let item_height = self
                    .scroll_handle
                    .0
                    .borrow()
                    .last_item_size
                    .map(|s| s.item.height)
                    .unwrap_or(px(28.));
                let scroll_y = self.scroll_handle.0.borrow().base_handle.offset().y;
                div()
                    .absolute()
                    .left(indent_offset + indent_width * depth)
                    .right_0()
                    .top(item_height * gap + scroll_y)
                    .h(px(2.))
                    .bg(theme.drag_border)
            });

        div()
            .id("dnd-tree-state")
            .size_full()
            .relative()
            .child(
                uniform_list("entries", self.controller.visible().len(), {
                    cx.processor(move |state, visible_range: Range<usize>, window, cx| {
                        let mut items = Vec::with_capacity(visible_range.len());
                        for ix in visible_range {
                            let entry = state.controller.visible()[ix].clone();
                            let selected = state.selected_id.as_ref() == Some(&entry.id);
                            let dragging = state.controller.active_id() == Some(&entry.id)
                                && cx.has_active_drag();

                            let row_state = DndTreeRowState {
                                selected,
                                dragging,
                                depth: state.controller.display_depth(&entry),
                            };

                            let item = (render_item)(ix, &entry, row_state, window, cx);
                            let tree_id = cx.entity_id();
                            let drag_value = DndTreeDrag {
                                tree_id,
                                item_id: entry.id.clone(),
                                label: entry.label.clone().into(),
                            };

                            let is_disabled = !entry.is_editable();
                            let move_id = entry.id.clone();
                            let click_id = entry.id.clone();
                            let row = div()
                                .id(ix)
                                .child(item.selected(selected))
                                .on_drag_move::<DndTreeDrag>(cx.listener(
                                    move |this, ev, window, cx| {
                                        this.on_row_drag_move(&move_id, ev, window, cx);
                                    },
                                ))
                                .on_drop::<DndTreeDrag>(cx.listener(
                                    move |this, drag, window, cx| {
                                        this.on_drop(drag, window, cx);
                                    },
                                ))
                                .on_click(cx.listener(move |this, click_event, window, cx| {
                                    this.on_entry_click(&click_id, click_event, window, cx);
                                }))
                                .when(!is_disabled, |this| {
                                    let state_entity = state_entity.clone();
                                    this.on_drag(
                                        drag_value,
                                        move |drag, cursor_offset, window, cx| {
                                            state_entity.update(cx, |state, cx| {
                                                state.on_drag_start(
                                                    drag,
                                                    cursor_offset,
                                                    window,
                                                    cx,
                                                );
                                            });
                                            let label = drag.label.clone();
                                            cx.new(|_| DragGhost::new(label))
                                        },
                                    )
                                });

                            items.push(row);
                        }
                        items
                    })
                })
                .on_drag_move::<DndTreeDrag>(cx.listener(Self::on_drag_move))
                .flex_grow()
                .size_full()
                .track_scroll(self.scroll_handle.clone())
                .with_sizing_behavior(ListSizingBehavior::Auto)
                .into_any_element(),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .right_0()
                    .bottom_0()
                    .w(px(12.))
                    .child(Scrollbar::uniform_scroll(
                        &self.scrollbar_state,
                        &self.scroll_handle,
                    )),
            )
            .when_some(line, |this, line| this.child(line))
    }
}

/// A draggable tree view element that displays hierarchical data.
#[derive(IntoElement)]
pub struct DndTree {
    id: ElementId,
    state: Entity<DndTreeState>,
    style: StyleRefinement,
    render_item: RenderItem,
}

impl DndTree {
    pub fn new<R>(state: &Entity<DndTreeState>, render_item: R) -> Self
    where
        R: Fn(usize, &FlatEntry, DndTreeRowState, &mut Window, &mut App) -> ListItem + 'static,
    {
        Self {
            id: ElementId::Name(format!("dnd-tree-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_item: Rc::new(move |ix, entry, row_state, window, cx| {
                render_item(ix, entry, row_state, window, cx)
            }),
        }
    }
}

impl Styled for DndTree {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl RenderOnce for DndTree {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        self.state
            .update(cx, |state, _| state.render_item = self.render_item);

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}

#[cfg(test)]
mod tests {
    use super::drop_gap;

    #[test]
    fn drop_gap_follows_drag_direction() {
        assert_eq!(drop_gap(0, 2), 3);
        assert_eq!(drop_gap(3, 1), 1);
        assert_eq!(drop_gap(2, 2), 2);
    }
}
