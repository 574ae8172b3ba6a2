//! Notification Center
//!
//! Transient Bootstrap alerts in the page's `.notification-container`.
//! Each notice expires on its own timer or when the user closes it,
//! whichever comes first.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use leptos::mount::mount_to;
use leptos::prelude::*;
use reactive_stores::Store;
use tracing::debug;
use wasm_bindgen::JsCast;

use crate::controller::Notify;
use crate::error::{BoardError, BoardResult};
use crate::models::Severity;
use crate::store::{
    store_clear_notices, store_push_notice, store_remove_notice, Notice,
    NoticeState, NoticeStateStoreFields, NoticeStore,
};
use crate::timers::{Scheduler, TimerId};

const CONTAINER_CLASS: &str = "notification-container";

struct Inner {
    store: NoticeStore,
    timers: Rc<dyn Scheduler>,
    expiries: RefCell<HashMap<u64, TimerId>>,
    next_id: Cell<u64>,
    ttl_ms: u32,
}

impl Inner {
    fn remove(&self, id: u64) {
        let timer = self.expiries.borrow_mut().remove(&id);
        if let Some(timer) = timer {
            self.timers.cancel(timer);
        }
        if store_remove_notice(&self.store, id) {
            debug!(id, "notification removed");
        }
    }
}

#[derive(Clone)]
pub struct NotificationCenter {
    inner: Rc<Inner>,
}

impl NotificationCenter {
    pub fn new(timers: Rc<dyn Scheduler>, ttl_ms: u32) -> Self {
        Self {
            inner: Rc::new(Inner {
                store: Store::new(NoticeState::default()),
                timers,
                expiries: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
                ttl_ms,
            }),
        }
    }

    /// Render the host into the page's container, creating it if needed
    pub fn mount(
        document: &web_sys::Document,
        timers: Rc<dyn Scheduler>,
        ttl_ms: u32,
    ) -> BoardResult<Self> {
        let container = find_or_create_container(document)?;
        let center = Self::new(timers, ttl_ms);
        let store = center.inner.store;

        let handle = StoredValue::new_local(Rc::downgrade(&center.inner));
        let on_dismiss = Callback::new(move |id: u64| {
            handle.with_value(|inner: &Weak<Inner>| {
                if let Some(inner) = inner.upgrade() {
                    inner.remove(id);
                }
            })
        });
        mount_to(container, move || {
            view! { <NotificationHost store=store on_dismiss=on_dismiss /> }
        })
        .forget();

        Ok(center)
    }

    /// Show `message`; returns the notice id
    pub fn push(&self, message: &str, severity: Severity) -> u64 {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        store_push_notice(
            &self.inner.store,
            Notice {
                id,
                message: message.to_string(),
                severity,
            },
        );

        let inner = Rc::downgrade(&self.inner);
        let timer = self.inner.timers.schedule_once(
            self.inner.ttl_ms,
            Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.remove(id);
                }
            }),
        );
        self.inner.expiries.borrow_mut().insert(id, timer);
        id
    }

    pub fn clear(&self) {
        let expiries: Vec<TimerId> = self.inner.expiries.borrow_mut().drain().map(|(_, t)| t).collect();
        for timer in expiries {
            self.inner.timers.cancel(timer);
        }
        store_clear_notices(&self.inner.store);
    }
}

impl Notify for NotificationCenter {
    fn notify(&self, message: &str, severity: Severity) {
        self.push(message, severity);
    }
}

fn find_or_create_container(document: &web_sys::Document) -> BoardResult<web_sys::HtmlElement> {
    let existing = document
        .query_selector(&format!(".{}", CONTAINER_CLASS))
        .map_err(BoardError::from_js)?;
    let element = match existing {
        Some(element) => element,
        None => {
            let element = document.create_element("div").map_err(BoardError::from_js)?;
            element.set_class_name(&format!("{} position-fixed top-0 end-0 p-3", CONTAINER_CLASS));
            let body = document
                .body()
                .ok_or_else(|| BoardError::MissingElement("body".into()))?;
            body.append_child(&element).map_err(BoardError::from_js)?;
            element
        }
    };
    element
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|_| BoardError::MissingElement(CONTAINER_CLASS.into()))
}

/// Alerts currently in the store, oldest on top
#[component]
pub fn NotificationHost(
    store: NoticeStore,
    #[prop(into)] on_dismiss: Callback<u64>,
) -> impl IntoView {
    view! {
        <For
            each=move || store.notices().get()
            key=|notice| notice.id
            children=move |notice| {
                let id = notice.id;
                view! {
                    <div class=notice.class() role="alert">
                        {notice.message.clone()}
                        <button
                            type="button"
                            class="btn-close"
                            aria-label="Close"
                            on:click=move |_| on_dismiss.run(id)
                        ></button>
                    </div>
                }
            }
        />
    }
}
