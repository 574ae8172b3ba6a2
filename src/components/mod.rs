//! UI Components
//!
//! Leptos components mounted into the server-rendered board.

mod notifications;
mod task_card;

pub use notifications::NotificationCenter;
pub use task_card::TaskCard;
