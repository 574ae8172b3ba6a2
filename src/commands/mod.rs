//! Task Service Bindings
//!
//! Frontend bindings to the server's task endpoints, organized by concern:
//! - `wire`: paths, request bodies and response decoding
//! - `csrf`: token lookup and the same-origin rule
//! - `http`: the fetch-backed [`TaskService`]

mod csrf;
mod http;
mod wire;

use async_trait::async_trait;

use crate::error::BoardResult;
use crate::models::{ListId, MoveRequest, Task, TaskId};

pub use http::HttpTaskService;

/// The remote task service, as the controller sees it
#[async_trait(?Send)]
pub trait TaskService {
    /// Persist a move; `Ok` once the server confirmed it
    async fn move_task(&self, request: &MoveRequest) -> BoardResult<()>;

    /// Create a task with `title` at the end of `list`
    async fn quick_create(&self, list: &ListId, title: &str) -> BoardResult<Task>;

    /// Flip completion; returns the server's resulting state
    async fn toggle_complete(&self, task: &TaskId) -> BoardResult<bool>;
}
