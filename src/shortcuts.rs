//! Keyboard Shortcuts
//!
//! `n` new task, `l` new list, `f` or Ctrl/Cmd+K search, Escape closes
//! whatever is open. Single letters are ignored while typing.

use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, KeyboardEvent};

use crate::dom::{elements, ListenerSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    NewTask,
    NewList,
    Search,
    Escape,
}

/// What the key handler needs to know about one keydown
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyInput<'a> {
    pub key: &'a str,
    pub ctrl: bool,
    pub meta: bool,
    /// The event target is an input, textarea or select
    pub editable: bool,
}

pub fn map_key(input: KeyInput<'_>) -> Option<Shortcut> {
    if (input.ctrl || input.meta) && input.key.eq_ignore_ascii_case("k") {
        return Some(Shortcut::Search);
    }
    if input.key == "Escape" {
        return Some(Shortcut::Escape);
    }
    if input.editable || input.ctrl || input.meta {
        return None;
    }
    match input.key {
        "n" => Some(Shortcut::NewTask),
        "l" => Some(Shortcut::NewList),
        "f" => Some(Shortcut::Search),
        _ => None,
    }
}

fn is_editable(target: Option<&Element>) -> bool {
    target
        .map(|el| matches!(el.tag_name().to_ascii_lowercase().as_str(), "input" | "textarea" | "select"))
        .unwrap_or(false)
}

fn focus(element: Option<Element>) {
    if let Some(el) = element.and_then(|el| el.dyn_into::<HtmlElement>().ok()) {
        let _ = el.focus();
    }
}

fn all(document: &Document, selector: &str) -> Vec<Element> {
    document
        .query_selector_all(selector)
        .map(elements)
        .unwrap_or_default()
}

fn run(document: &Document, shortcut: Shortcut) {
    debug!(?shortcut, "shortcut");
    match shortcut {
        Shortcut::NewTask => focus(
            document
                .query_selector(".quick-task-form input[name=\"title\"]")
                .ok()
                .flatten(),
        ),
        Shortcut::NewList => focus(all(document, "input[name=\"name\"]").pop()),
        Shortcut::Search => focus(document.query_selector("input[name=\"q\"]").ok().flatten()),
        Shortcut::Escape => {
            if let Some(active) = document
                .active_element()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                let _ = active.blur();
            }
            for open in all(document, ".quick-task-form.show, .dropdown-menu.show") {
                let _ = open.class_list().remove_1("show");
            }
            crate::conveniences::hide_open_modals(document);
        }
    }
}

pub fn bind(document: &Document, listeners: &ListenerSet) {
    let doc = document.clone();
    listeners.on(document.as_ref(), "keydown", move |ev: KeyboardEvent| {
        let target = ev.target().and_then(|t| t.dyn_into::<Element>().ok());
        let key = ev.key();
        let input = KeyInput {
            key: &key,
            ctrl: ev.ctrl_key(),
            meta: ev.meta_key(),
            editable: is_editable(target.as_ref()),
        };
        if let Some(shortcut) = map_key(input) {
            ev.prevent_default();
            run(&doc, shortcut);
        }
    });
}
