use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::list::ListItem;
use gpui_component::{h_flex, v_flex};
use gpui_dnd_tree::{DndTreeRowState, DndTreeState, dnd_tree};
use gpui_dnd_tree_core::{
    CollapseStorage, FlatEntry, Forest, InMemorySpaces, NodeId, NodeMeta, NodeRecord, NodeStatus,
    ReparentIntent, StatusFilter,
};

const INDENT: Pixels = px(24.);

pub struct SpacesTreeStory {
    spaces: InMemorySpaces,
    filter: StatusFilter,
    tree: Entity<DndTreeState>,
    last_error: Option<SharedString>,
}

impl SpacesTreeStory {
    pub fn view(
        storage: impl CollapseStorage + 'static,
        _window: &mut Window,
        cx: &mut App,
    ) -> Entity<Self> {
        cx.new(|cx| {
            let spaces = demo_spaces();
            let filter = StatusFilter::default();
            let story: WeakEntity<Self> = cx.weak_entity();
            let forest = spaces.forest(filter);
            let tree = cx.new(|cx| {
                DndTreeState::new(storage, cx)
                    .indent_width(INDENT)
                    .indent_offset(px(10.))
                    .forest(forest)
                    .on_reparent(move |intent, _window, cx| {
                        let intent = intent.clone();
                        let story = story.clone();
                        // The tree is still being updated while this runs.
                        cx.defer(move |cx| {
                            story
                                .update(cx, |story, cx| story.apply_reparent(&intent, cx))
                                .ok();
                        });
                    })
            });
            Self {
                spaces,
                filter,
                tree,
                last_error: None,
            }
        })
    }

    fn apply_reparent(&mut self, intent: &ReparentIntent, cx: &mut Context<Self>) {
        match self.spaces.reparent(intent) {
            Ok(()) => self.last_error = None,
            Err(err) => {
                tracing::warn!(%err, "reparent rejected");
                self.last_error = Some(err.to_string().into());
            }
        }
        self.refresh(cx);
    }

    fn refresh(&mut self, cx: &mut Context<Self>) {
        let forest = self.spaces.forest(self.filter);
        self.tree.update(cx, |tree, cx| tree.set_forest(forest, cx));
        cx.notify();
    }

    fn toggle_archived(&mut self, cx: &mut Context<Self>) {
        self.filter = match self.filter {
            StatusFilter::OpenOnly => StatusFilter::All,
            StatusFilter::All => StatusFilter::OpenOnly,
        };
        self.refresh(cx);
    }

    fn toggle_selected_status(&mut self, cx: &mut Context<Self>) {
        let Some(entry) = self.tree.read(cx).selected_entry().cloned() else {
            return;
        };
        let status = match entry.meta.status {
            NodeStatus::Open => NodeStatus::Archived,
            NodeStatus::Archived => NodeStatus::Open,
        };
        if let Err(err) = self.spaces.set_status(&entry.id, status) {
            tracing::warn!(%err, "status change rejected");
        }
        self.refresh(cx);
    }
}

impl Render for SpacesTreeStory {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let tree = self.tree.read(cx);
        let tree_dump = format_forest(tree.controller().forest());
        let selected_id = tree
            .selected_entry()
            .map(|entry| entry.id.to_string())
            .unwrap_or_else(|| "<none>".to_string());
        let projection = tree
            .projection()
            .map(|projection| {
                let parent = projection
                    .parent_id
                    .as_ref()
                    .map(NodeId::to_string)
                    .unwrap_or_else(|| "<root>".to_string());
                format!(
                    "Projection: depth {} (min {}, max {}), parent {parent}",
                    projection.depth, projection.min_depth, projection.max_depth
                )
            })
            .unwrap_or_else(|| "Projection: <none>".to_string());
        let archived_label = match self.filter {
            StatusFilter::OpenOnly => "Show archived",
            StatusFilter::All => "Hide archived",
        };

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                v_flex()
                    .gap_y_1()
                    .child(div().text_xl().font_weight(FontWeight::BOLD).child("Spaces"))
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child("Tip: drag a space over another row to move it there; drag right to nest it one level deeper per indentation step, left to lift it out. Click a space with children to collapse or expand it. Archived spaces cannot be dragged."),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(format!("Selected: {selected_id}")),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(projection),
                    )
                    .when_some(self.last_error.clone(), |this, err| {
                        this.child(div().text_sm().text_color(theme.danger).child(err))
                    }),
            )
            .child(
                h_flex()
                    .gap_x_2()
                    .items_center()
                    .child(
                        Button::new("spaces-toggle-archived")
                            .label(archived_label)
                            .ghost()
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.toggle_archived(cx);
                            })),
                    )
                    .child(
                        Button::new("spaces-toggle-status")
                            .label("Archive / reopen selected")
                            .ghost()
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.toggle_selected_status(cx);
                            })),
                    ),
            )
            .child(
                h_flex()
                    .flex_1()
                    .min_h(px(0.))
                    .gap_x_3()
                    .child(
                        v_flex()
                            .w(px(420.))
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(div().text_sm().font_weight(FontWeight::MEDIUM).child("Tree"))
                            .child(
                                div()
                                    .flex_1()
                                    .min_h(px(0.))
                                    .rounded(px(12.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .bg(theme.background)
                                    .child(dnd_tree(
                                        &self.tree,
                                        move |ix, entry, row_state, _window, cx| {
                                            render_space_row(ix, entry, row_state, cx)
                                        },
                                    )),
                            ),
                    )
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(
                                div()
                                    .text_sm()
                                    .font_weight(FontWeight::MEDIUM)
                                    .child("Debug (fetched forest)"),
                            )
                            .child(
                                div()
                                    .flex_1()
                                    .min_h(px(0.))
                                    .rounded(px(12.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .bg(theme.background)
                                    .p(px(12.))
                                    .child(render_tree_dump(tree_dump)),
                            ),
                    ),
            )
    }
}

fn render_space_row(
    ix: usize,
    entry: &FlatEntry,
    row_state: DndTreeRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();
    let indent = INDENT * row_state.depth;
    let marker = match (entry.has_children, entry.collapsed) {
        (false, _) => " ",
        (true, true) => "▸",
        (true, false) => "▾",
    };
    let label_color = if entry.is_editable() {
        theme.foreground
    } else {
        theme.muted_foreground
    };

    ListItem::new(ix)
        .pl(px(10.) + indent)
        .when(row_state.dragging, |this| this.opacity(0.4))
        .child(
            h_flex()
                .gap_x_2()
                .items_center()
                .child(div().w(px(12.)).text_color(theme.muted_foreground).child(marker))
                .when_some(entry.meta.color.clone(), |this, color| {
                    this.child(div().text_sm().text_color(theme.muted_foreground).child(color))
                })
                .child(div().text_color(label_color).child(entry.label.clone()))
                .when(entry.meta.professional, |this| {
                    this.child(div().text_xs().text_color(theme.muted_foreground).child("work"))
                }),
        )
}

fn render_tree_dump(text: String) -> impl IntoElement {
    let lines = text
        .lines()
        .map(|line| div().text_sm().child(line.to_string()));
    v_flex().gap_y_0p5().children(lines)
}

fn format_forest(forest: &Forest) -> String {
    fn walk(forest: &Forest, ids: &[NodeId], depth: usize, out: &mut String) {
        for id in ids {
            let Some(node) = forest.get(id) else {
                continue;
            };
            out.push_str(&"  ".repeat(depth));
            out.push_str(id.as_str());
            if node.meta.status == NodeStatus::Archived {
                out.push_str(" (archived)");
            }
            out.push('\n');
            walk(forest, &node.children, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(forest, forest.roots(), 0, &mut out);
    out
}

fn demo_spaces() -> InMemorySpaces {
    let archived = NodeMeta {
        status: NodeStatus::Archived,
        ..NodeMeta::default()
    };
    let professional = NodeMeta {
        professional: true,
        ..NodeMeta::default()
    };
    InMemorySpaces::new([
        NodeRecord::new("home", "Home"),
        NodeRecord::new("home/garden", "Garden").parent("home"),
        NodeRecord::new("home/kitchen", "Kitchen").parent("home"),
        NodeRecord::new("home/kitchen/recipes", "Recipes").parent("home/kitchen"),
        NodeRecord::new("work", "Work").meta(professional.clone()),
        NodeRecord::new("work/roadmap", "Roadmap")
            .parent("work")
            .meta(professional.clone()),
        NodeRecord::new("work/hiring", "Hiring")
            .parent("work")
            .meta(professional),
        NodeRecord::new("travel", "Travel"),
        NodeRecord::new("old-projects", "Old projects").meta(archived.clone()),
        NodeRecord::new("old-projects/blog", "Blog")
            .parent("old-projects")
            .meta(archived),
    ])
}
