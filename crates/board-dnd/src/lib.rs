//! Board DragDrop Primitives
//!
//! The parts of card drag-and-drop that never touch the DOM: the drag
//! session state machine, drop position from sibling midpoints, list
//! reordering, and the movement threshold that tells a tap from a drag.
//!
//! Ids are generic so the same machinery works for any card/column pair.

mod gesture;
mod position;
mod session;

pub use gesture::{GestureStep, Point, TouchGesture, DEFAULT_TOUCH_THRESHOLD_PX};
pub use position::{drop_index, index_of, place, Bounds};
pub use session::{DragError, DragMachine, DragPhase, DragSession};
