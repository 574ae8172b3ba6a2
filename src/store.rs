//! Notification State Store
//!
//! Uses Leptos reactive_stores so the host re-renders only the list.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::Severity;

/// One visible notification
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    /// Bootstrap alert classes for this notice
    pub fn class(&self) -> String {
        format!(
            "alert alert-{} alert-dismissible fade show notification",
            self.severity.as_str()
        )
    }
}

/// Notifications currently shown, oldest first
#[derive(Clone, Debug, Default, Store)]
pub struct NoticeState {
    pub notices: Vec<Notice>,
}

pub type NoticeStore = Store<NoticeState>;

// ========================
// Store Helper Functions
// ========================

pub fn store_push_notice(store: &NoticeStore, notice: Notice) {
    store.notices().write().push(notice);
}

/// Remove a notice by id; returns whether it was shown
pub fn store_remove_notice(store: &NoticeStore, id: u64) -> bool {
    remove_notice(&mut store.notices().write(), id)
}

pub fn store_clear_notices(store: &NoticeStore) {
    store.notices().write().clear();
}

pub fn remove_notice(notices: &mut Vec<Notice>, id: u64) -> bool {
    let before = notices.len();
    notices.retain(|notice| notice.id != id);
    notices.len() != before
}
