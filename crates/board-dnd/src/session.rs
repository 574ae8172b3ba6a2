//! Drag session state machine.
//!
//! `Idle -> Dragging -> (Dropped | Cancelled) -> Idle`. Dropped and Cancelled
//! are transitions, not resting states: both hand the session back to the
//! caller and leave the machine idle.

use thiserror::Error;
use tracing::debug;

/// Where a card came from, captured when the drag starts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragSession<T, L> {
    pub task: T,
    pub source_list: L,
    pub source_index: usize,
}

/// Resting states of the machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragPhase<T, L> {
    Idle,
    Dragging(DragSession<T, L>),
}

impl<T, L> Default for DragPhase<T, L> {
    fn default() -> Self {
        DragPhase::Idle
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DragError {
    #[error("a drag is already in progress")]
    AlreadyDragging,
    #[error("no drag in progress")]
    NotDragging,
}

/// Single-gesture drag state
#[derive(Debug)]
pub struct DragMachine<T, L> {
    phase: DragPhase<T, L>,
}

impl<T, L> Default for DragMachine<T, L> {
    fn default() -> Self {
        Self { phase: DragPhase::Idle }
    }
}

impl<T: std::fmt::Debug, L: std::fmt::Debug> DragMachine<T, L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase<T, L> {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging(_))
    }

    /// Session of the drag in progress, if any
    pub fn session(&self) -> Option<&DragSession<T, L>> {
        match &self.phase {
            DragPhase::Dragging(session) => Some(session),
            DragPhase::Idle => None,
        }
    }

    /// Idle -> Dragging
    pub fn start(&mut self, session: DragSession<T, L>) -> Result<(), DragError> {
        if self.is_dragging() {
            return Err(DragError::AlreadyDragging);
        }
        debug!(?session, "drag started");
        self.phase = DragPhase::Dragging(session);
        Ok(())
    }

    /// Dragging -> Dropped -> Idle. Returns the session for the caller to
    /// apply and keep for rollback.
    pub fn drop_session(&mut self) -> Result<DragSession<T, L>, DragError> {
        match std::mem::take(&mut self.phase) {
            DragPhase::Dragging(session) => {
                debug!(?session, "drag dropped");
                Ok(session)
            }
            DragPhase::Idle => Err(DragError::NotDragging),
        }
    }

    /// Dragging -> Cancelled -> Idle. A no-op when idle.
    pub fn cancel(&mut self) -> Option<DragSession<T, L>> {
        match std::mem::take(&mut self.phase) {
            DragPhase::Dragging(session) => {
                debug!(?session, "drag cancelled");
                Some(session)
            }
            DragPhase::Idle => None,
        }
    }
}
