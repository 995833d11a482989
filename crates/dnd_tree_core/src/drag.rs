use serde::{Deserialize, Serialize};

use crate::{NodeId, Projection};

/// The single outbound request produced by a successful drop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReparentIntent {
    pub moved_id: NodeId,
    pub new_parent_id: Option<NodeId>,
}

/// Pointer-library agnostic drag events.
#[derive(Clone, Debug, PartialEq)]
pub enum DragEvent {
    Start(NodeId),
    /// Total horizontal delta since the drag started.
    Move { delta_x: f32 },
    Over(Option<NodeId>),
    End,
    Cancel,
}

/// State of one in-flight drag gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub active_id: NodeId,
    pub over_id: Option<NodeId>,
    pub offset_left: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragState {
    #[inline]
    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(session) => Some(session),
        }
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    #[inline]
    pub fn active_id(&self) -> Option<&NodeId> {
        self.session().map(|session| &session.active_id)
    }

    #[inline]
    pub fn over_id(&self) -> Option<&NodeId> {
        self.session().and_then(|session| session.over_id.as_ref())
    }

    /// Begins a drag on `id`. Ignored while another drag is in flight.
    pub fn start(&mut self, id: NodeId) -> bool {
        if let DragState::Dragging(session) = self {
            tracing::warn!(
                active = %session.active_id,
                requested = %id,
                "drag start ignored, a drag is already active"
            );
            return false;
        }
        tracing::debug!(%id, "drag start");
        *self = DragState::Dragging(DragSession {
            active_id: id.clone(),
            over_id: Some(id),
            offset_left: 0.0,
        });
        true
    }

    /// Records the total horizontal delta since start.
    pub fn move_to(&mut self, delta_x: f32) -> bool {
        let DragState::Dragging(session) = self else {
            tracing::debug!("drag move ignored while idle");
            return false;
        };
        session.offset_left = delta_x;
        true
    }

    pub fn over(&mut self, over_id: Option<NodeId>) -> bool {
        let DragState::Dragging(session) = self else {
            tracing::debug!("drag over ignored while idle");
            return false;
        };
        session.over_id = over_id;
        true
    }

    /// Ends the drag. Emits an intent when a projection exists and something is hovered.
    pub fn end(&mut self, projection: Option<&Projection>) -> Option<ReparentIntent> {
        let DragState::Dragging(session) = std::mem::take(self) else {
            tracing::debug!("drag end ignored while idle");
            return None;
        };

        let intent = match (projection, session.over_id) {
            (Some(projection), Some(_)) => Some(ReparentIntent {
                moved_id: session.active_id,
                new_parent_id: projection.parent_id.clone(),
            }),
            _ => None,
        };
        tracing::debug!(?intent, "drag end");
        intent
    }

    pub fn cancel(&mut self) {
        if let DragState::Dragging(session) = std::mem::take(self) {
            tracing::debug!(id = %session.active_id, "drag cancelled");
        }
    }

    /// Applies `event`. `projection` is only consulted on [`DragEvent::End`].
    pub fn apply(
        &mut self,
        event: DragEvent,
        projection: Option<&Projection>,
    ) -> Option<ReparentIntent> {
        match event {
            DragEvent::Start(id) => {
                self.start(id);
                None
            }
            DragEvent::Move { delta_x } => {
                self.move_to(delta_x);
                None
            }
            DragEvent::Over(over_id) => {
                self.over(over_id);
                None
            }
            DragEvent::End => self.end(projection),
            DragEvent::Cancel => {
                self.cancel();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    fn projection(parent: Option<&str>) -> Projection {
        Projection {
            depth: 1,
            max_depth: 1,
            min_depth: 0,
            parent_id: parent.map(id),
        }
    }

    #[test]
    fn start_hovers_the_dragged_node() {
        let mut state = DragState::default();
        assert!(state.start(id("A")));
        assert_eq!(
            state.session(),
            Some(&DragSession {
                active_id: id("A"),
                over_id: Some(id("A")),
                offset_left: 0.0,
            })
        );
    }

    #[test]
    fn second_start_is_ignored() {
        let mut state = DragState::default();
        state.start(id("A"));
        assert!(!state.start(id("B")));
        assert_eq!(state.active_id(), Some(&id("A")));
    }

    #[test]
    fn move_replaces_offset() {
        let mut state = DragState::default();
        state.start(id("A"));
        state.move_to(10.0);
        state.move_to(30.0);
        assert_eq!(state.session().unwrap().offset_left, 30.0);
    }

    #[test]
    fn end_with_projection_and_target_emits_once() {
        let mut state = DragState::default();
        state.apply(DragEvent::Start(id("A")), None);
        state.apply(DragEvent::Over(Some(id("B"))), None);

        let intent = state.apply(DragEvent::End, Some(&projection(Some("B"))));
        assert_eq!(
            intent,
            Some(ReparentIntent {
                moved_id: id("A"),
                new_parent_id: Some(id("B")),
            })
        );
        assert_eq!(state, DragState::Idle);
        assert_eq!(state.apply(DragEvent::End, Some(&projection(None))), None);
    }

    #[test]
    fn end_without_target_or_projection_emits_nothing() {
        let mut state = DragState::default();
        state.start(id("A"));
        state.over(None);
        assert_eq!(state.end(Some(&projection(None))), None);
        assert!(!state.is_dragging());

        state.start(id("A"));
        assert_eq!(state.end(None), None);
        assert!(!state.is_dragging());
    }

    #[test]
    fn cancel_resets_without_intent() {
        let mut state = DragState::default();
        state.start(id("A"));
        state.move_to(48.0);
        assert_eq!(state.apply(DragEvent::Cancel, Some(&projection(None))), None);
        assert_eq!(state, DragState::Idle);
    }

    #[test]
    fn events_while_idle_are_ignored() {
        let mut state = DragState::default();
        assert!(!state.move_to(5.0));
        assert!(!state.over(Some(id("A"))));
        assert_eq!(state.end(Some(&projection(None))), None);
        assert_eq!(state, DragState::Idle);
    }
}
