//! Board errors.
//!
//! Transport and application failures reach the user as a notification.
//! Local refusals go back to the caller and the log only.

use thiserror::Error;
use wasm_bindgen::JsValue;

use board_dnd::DragError;

use crate::models::{ListId, TaskId};

pub type BoardResult<T> = Result<T, BoardError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    /// The request never produced a response
    #[error("connection error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("server answered HTTP {status}")]
    Status { status: u16 },

    /// The server answered but the body made no sense
    #[error("unreadable response: {0}")]
    Decode(String),

    /// `success: false`, with the server's reason
    #[error("{0}")]
    Rejected(String),

    #[error("could not encode request: {0}")]
    Encode(String),

    #[error(transparent)]
    Drag(#[from] DragError),

    #[error("task {0} is not on the board")]
    UnknownTask(TaskId),

    #[error("list {0} is not on the board")]
    UnknownList(ListId),

    #[error("a move of task {0} is still in flight")]
    MoveInFlight(TaskId),

    #[error("task title is empty")]
    EmptyTitle,

    #[error("page element missing: {0}")]
    MissingElement(String),

    #[error("invalid board config: {0}")]
    Config(String),
}

/// How a failure is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Application,
    Local,
}

impl BoardError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BoardError::Transport(_) | BoardError::Status { .. } | BoardError::Decode(_) => {
                FailureKind::Transport
            }
            BoardError::Rejected(_) => FailureKind::Application,
            _ => FailureKind::Local,
        }
    }

    /// Text shown to the user after "Failed to ...: "
    pub fn reason(&self) -> String {
        match self {
            BoardError::Transport(_) => "connection error".to_string(),
            BoardError::Status { status } => status_reason(*status).to_string(),
            BoardError::Decode(_) => "unexpected server response".to_string(),
            BoardError::Rejected(reason) => reason.clone(),
            other => other.to_string(),
        }
    }

    pub fn from_js(err: JsValue) -> Self {
        BoardError::Transport(format!("{:?}", err))
    }
}

fn status_reason(status: u16) -> &'static str {
    match status {
        403 => "you don't have permission to do that",
        404 => "the requested resource was not found",
        500.. => "server error, please try again",
        _ => "connection error, check your internet connection",
    }
}
