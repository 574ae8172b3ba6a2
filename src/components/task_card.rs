//! Task Card Component
//!
//! Markup for a card appended after quick-create, matching the cards the
//! server renders so drag, drop and toggle treat both alike.

use leptos::prelude::*;

use crate::models::Task;

#[component]
pub fn TaskCard(task: Task) -> impl IntoView {
    let id = task.id.to_string();
    let card_id = id.clone();
    let href = format!("/tasks/{}/", id);
    let badge = format!("badge bg-{}", task.badge_color());
    let card_class = if task.completed { "task-card mb-2 completed" } else { "task-card mb-2" };
    let icon = if task.completed { "fas fa-undo" } else { "fas fa-check" };

    view! {
        <div class=card_class draggable="true" data-task-id=card_id>
            <div class="card task-item">
                <div class="card-body p-3">
                    <div class="d-flex justify-content-between align-items-start mb-2">
                        <h6 class="card-title mb-1">
                            <a href=href class="text-decoration-none">{task.title}</a>
                        </h6>
                        <span class=badge>{task.priority_label}</span>
                    </div>
                    <button
                        type="button"
                        class="btn btn-sm btn-outline-success quick-complete"
                        data-task-id=id
                    >
                        <i class=icon></i>
                    </button>
                </div>
            </div>
        </div>
    }
}
