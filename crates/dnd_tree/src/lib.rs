mod tree;

pub use tree::{DndTree, DndTreeRowState, DndTreeState, dnd_tree};
