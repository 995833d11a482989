//! Headless engine behind the drag-and-drop tree: flattening, visibility filtering, collapse
//! state, the drag session and depth/parent projection.

mod collapse;
mod controller;
mod drag;
mod flatten;
mod model;
mod projection;
mod repository;
mod storage;
mod visibility;

pub use crate::collapse::*;
pub use crate::controller::*;
pub use crate::drag::*;
pub use crate::flatten::*;
pub use crate::model::*;
pub use crate::projection::*;
pub use crate::repository::*;
pub use crate::storage::*;
pub use crate::visibility::*;
