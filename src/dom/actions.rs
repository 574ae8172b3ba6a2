//! Quick-create and quick-complete handlers.

use std::rc::Rc;

use leptos::task::spawn_local;
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlInputElement, MouseEvent, SubmitEvent};

use super::{ListenerSet, QUICK_COMPLETE, QUICK_FORM};
use crate::app::PageController;
use crate::models::{ListId, TaskId};

fn title_of(form: &Element) -> String {
    form.query_selector("input[name=\"title\"]")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .unwrap_or_default()
}

pub fn bind(document: &Document, listeners: &ListenerSet, controller: &Rc<PageController>) {
    let target: &web_sys::EventTarget = document.as_ref();

    let c = Rc::clone(controller);
    listeners.on(target, "submit", move |ev: SubmitEvent| {
        let Some(form) = ev
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .filter(|el| el.matches(QUICK_FORM).unwrap_or(false))
        else {
            return;
        };
        ev.prevent_default();
        let Some(list) = form.get_attribute("data-list-id").map(ListId::new) else {
            warn!("quick-create form without data-list-id");
            return;
        };
        let title = title_of(&form);
        let c = Rc::clone(&c);
        spawn_local(async move {
            let _ = c.on_submit(&list, &title).await;
        });
    });

    let c = Rc::clone(controller);
    listeners.on(target, "click", move |ev: MouseEvent| {
        let Some(toggle) = ev
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(QUICK_COMPLETE).ok().flatten())
        else {
            return;
        };
        ev.prevent_default();
        ev.stop_propagation();
        let Some(task) = toggle.get_attribute("data-task-id").map(TaskId::new) else {
            return;
        };
        let c = Rc::clone(&c);
        spawn_local(async move {
            let _ = c.on_toggle(&task).await;
        });
    });
}
