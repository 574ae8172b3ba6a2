//! Page Conveniences
//!
//! Small behaviors every board page gets: Bootstrap widgets, flash message
//! expiry, dark mode, copy buttons, anchor scrolling, the auto-save
//! indicator, delete confirmation, growing textareas, the double-submit
//! guard and search validation.

use std::rc::Rc;

use js_sys::{Array, Function, Reflect};
use leptos::task::spawn_local;
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, HtmlButtonElement, HtmlElement, HtmlInputElement, MouseEvent,
    ScrollBehavior, ScrollToOptions, SubmitEvent, Window,
};

use crate::config::BoardConfig;
use crate::dom::{elements, ListenerSet, QUICK_FORM};
use crate::timers::{Debouncer, TimerRegistry};

const DARK_MODE_KEY: &str = "darkMode";
const DARK_MODE_CLASS: &str = "dark-mode";
const SAVED_VISIBLE_MS: u32 = 2_000;
const FLASH_SELECTOR: &str = ".alert";
const FLASH_FADE_MS: u32 = 600;
const ANCHOR_SELECTOR: &str = "a[href^=\"#\"]";
/// Room left above an anchor target for the fixed navbar
pub const ANCHOR_OFFSET_PX: f64 = 100.0;
const DELETE_PROMPT: &str =
    "Are you sure you want to delete this item? This action cannot be undone.";

fn all(document: &Document, selector: &str) -> Vec<Element> {
    document
        .query_selector_all(selector)
        .map(elements)
        .unwrap_or_default()
}

fn closest(target: Option<web_sys::EventTarget>, selector: &str) -> Option<Element> {
    target?
        .dyn_into::<Element>()
        .ok()?
        .closest(selector)
        .ok()
        .flatten()
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn bootstrap(window: &Window) -> Option<JsValue> {
    get(window.as_ref(), "bootstrap")
}

// ========================
// Bootstrap widgets
// ========================

/// Wrap tooltip and popover triggers when Bootstrap is on the page
pub fn init_bootstrap_widgets(window: &Window, document: &Document) {
    let Some(bootstrap) = bootstrap(window) else {
        debug!("bootstrap not loaded, skipping widgets");
        return;
    };
    for (toggle, widget) in [("tooltip", "Tooltip"), ("popover", "Popover")] {
        let Some(ctor) = get(&bootstrap, widget).and_then(|c| c.dyn_into::<Function>().ok()) else {
            continue;
        };
        for element in all(document, &format!("[data-bs-toggle=\"{}\"]", toggle)) {
            if let Err(err) = Reflect::construct(&ctor, &Array::of1(&element)) {
                warn!(widget, ?err, "widget init failed");
            }
        }
    }
}

pub fn hide_open_modals(document: &Document) {
    let Some(window) = document.default_view() else {
        return;
    };
    let Some(modal) = bootstrap(&window).and_then(|b| get(&b, "Modal")) else {
        return;
    };
    let Some(get_instance) = get(&modal, "getInstance").and_then(|f| f.dyn_into::<Function>().ok())
    else {
        return;
    };
    for element in all(document, ".modal.show") {
        let Some(instance) = get_instance.call1(&modal, &element).ok().filter(|i| i.is_object()) else {
            continue;
        };
        if let Some(hide) = get(&instance, "hide").and_then(|f| f.dyn_into::<Function>().ok()) {
            let _ = hide.call0(&instance);
        }
    }
}

// ========================
// Flash messages
// ========================

/// Fade out the alerts the server rendered with the page after `ttl_ms`.
/// Alerts raised later by the notification center expire on their own.
fn expire_flash_messages(document: &Document, timers: &Rc<TimerRegistry>, ttl_ms: u32) {
    let flashes: Vec<HtmlElement> = all(document, FLASH_SELECTOR)
        .into_iter()
        .filter(|el| el.closest(".notification-container").ok().flatten().is_none())
        .filter_map(|el| el.dyn_into::<HtmlElement>().ok())
        .collect();
    if flashes.is_empty() {
        return;
    }
    debug!(count = flashes.len(), ttl_ms, "flash messages scheduled to hide");
    let registry = Rc::clone(timers);
    timers.schedule(ttl_ms, move || {
        for flash in &flashes {
            let style = flash.style();
            let _ = style.set_property("transition", &format!("opacity {}ms", FLASH_FADE_MS));
            let _ = style.set_property("opacity", "0");
        }
        registry.schedule(FLASH_FADE_MS, move || {
            for flash in &flashes {
                let _ = flash.style().set_property("display", "none");
            }
        });
    });
}

// ========================
// Anchor scrolling
// ========================

/// Document offset to scroll to so the target sits `offset` below the top
pub fn anchor_scroll_top(target_top: f64, scroll_y: f64, offset: f64) -> f64 {
    (target_top + scroll_y - offset).max(0.0)
}

fn scroll_to_anchor(window: &Window, document: &Document, anchor: &Element) {
    let Some(href) = anchor.get_attribute("href") else {
        return;
    };
    // "#" alone or a malformed fragment is not a valid selector
    let Some(target) = document.query_selector(&href).ok().flatten() else {
        return;
    };
    let top = anchor_scroll_top(
        target.get_bounding_client_rect().top(),
        window.scroll_y().unwrap_or_default(),
        ANCHOR_OFFSET_PX,
    );
    let options = ScrollToOptions::new();
    options.set_top(top);
    options.set_behavior(ScrollBehavior::Smooth);
    window.scroll_to_with_scroll_to_options(&options);
}

// ========================
// Dark mode
// ========================

fn restore_dark_mode(window: &Window, document: &Document) {
    let stored = window
        .local_storage()
        .ok()
        .flatten()
        .and_then(|storage| storage.get_item(DARK_MODE_KEY).ok().flatten());
    if stored.as_deref() == Some("true") {
        if let Some(body) = document.body() {
            let _ = body.class_list().add_1(DARK_MODE_CLASS);
        }
    }
}

fn toggle_dark_mode(window: &Window, document: &Document) {
    let Some(body) = document.body() else {
        return;
    };
    let dark = body.class_list().toggle(DARK_MODE_CLASS).unwrap_or(false);
    if let Some(storage) = window.local_storage().ok().flatten() {
        let _ = storage.set_item(DARK_MODE_KEY, if dark { "true" } else { "false" });
    }
}

// ========================
// Clipboard
// ========================

async fn write_clipboard(window: &Window, text: &str) -> Result<(), JsValue> {
    let clipboard = get(window.navigator().as_ref(), "clipboard")
        .ok_or_else(|| JsValue::from_str("clipboard unavailable"))?;
    let write_text = get(&clipboard, "writeText")
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| JsValue::from_str("writeText unavailable"))?;
    let promise = write_text
        .call1(&clipboard, &JsValue::from_str(text))?
        .dyn_into::<js_sys::Promise>()?;
    JsFuture::from(promise).await?;
    Ok(())
}

fn copy_with_feedback(window: Window, button: Element, timers: Rc<TimerRegistry>, feedback_ms: u32) {
    let Some(text) = button.get_attribute("data-text") else {
        return;
    };
    spawn_local(async move {
        if let Err(err) = write_clipboard(&window, &text).await {
            warn!(?err, "copy to clipboard failed");
            return;
        }
        let original = button.inner_html();
        button.set_inner_html("<i class=\"fas fa-check me-2\"></i>Copied!");
        timers.schedule(feedback_ms, move || button.set_inner_html(&original));
    });
}

// ========================
// Auto-save indicator
// ========================

fn show_indicator(document: &Document, text: Option<&str>) {
    for indicator in all(document, ".save-indicator") {
        let Ok(indicator) = indicator.dyn_into::<HtmlElement>() else {
            continue;
        };
        match text {
            Some(text) => {
                indicator.set_text_content(Some(text));
                let _ = indicator.style().remove_property("display");
            }
            None => {
                let _ = indicator.style().set_property("display", "none");
            }
        }
    }
}

fn autosave_cycle(document: Document, timers: Rc<TimerRegistry>, settle_ms: u32) {
    show_indicator(&document, Some("Saving…"));
    let registry = Rc::clone(&timers);
    timers.schedule(settle_ms, move || {
        show_indicator(&document, Some("Saved"));
        registry.schedule(SAVED_VISIBLE_MS, move || show_indicator(&document, None));
    });
}

// ========================
// Textareas
// ========================

fn fit_textarea(element: &Element) {
    let Some(el) = element.dyn_ref::<HtmlElement>() else {
        return;
    };
    let style = el.style();
    let _ = style.set_property("height", "auto");
    let _ = style.set_property("height", &format!("{}px", element.scroll_height()));
    let _ = style.set_property("overflow-y", "hidden");
}

// ========================
// Forms
// ========================

/// Whether a search query is long enough to send
pub fn search_query_ok(query: &str, min_chars: usize) -> bool {
    query.trim().chars().count() >= min_chars
}

fn guard_submit(form: &Element, timers: &Rc<TimerRegistry>, guard_ms: u32) {
    let Some(button) = form
        .query_selector("button[type=\"submit\"]")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
    else {
        return;
    };
    let original = button.inner_html();
    button.set_disabled(true);
    button.set_inner_html("<span class=\"loading me-2\"></span>Processing...");
    timers.schedule(guard_ms, move || {
        button.set_disabled(false);
        button.set_inner_html(&original);
    });
}

pub fn bind(
    window: &Window,
    document: &Document,
    listeners: &ListenerSet,
    timers: &Rc<TimerRegistry>,
    config: &BoardConfig,
) {
    init_bootstrap_widgets(window, document);
    expire_flash_messages(document, timers, config.flash_ttl_ms);
    restore_dark_mode(window, document);
    for textarea in all(document, "textarea") {
        fit_textarea(&textarea);
    }

    let target: &web_sys::EventTarget = document.as_ref();

    let (win, doc, registry) = (window.clone(), document.clone(), Rc::clone(timers));
    let feedback_ms = config.copy_feedback_ms;
    listeners.on(target, "click", move |ev: MouseEvent| {
        if let Some(button) = closest(ev.target(), ".copy-to-clipboard") {
            copy_with_feedback(win.clone(), button, Rc::clone(&registry), feedback_ms);
        } else if closest(ev.target(), ".dark-mode-toggle").is_some() {
            toggle_dark_mode(&win, &doc);
        } else if closest(ev.target(), ".confirm-delete").is_some()
            && !win.confirm_with_message(DELETE_PROMPT).unwrap_or(false)
        {
            ev.prevent_default();
            ev.stop_propagation();
        } else if let Some(anchor) = closest(ev.target(), ANCHOR_SELECTOR) {
            ev.prevent_default();
            scroll_to_anchor(&win, &doc, &anchor);
        }
    });

    let (doc, registry) = (document.clone(), Rc::clone(timers));
    let debouncer = Debouncer::default();
    let (debounce_ms, settle_ms) = (config.autosave_debounce_ms, config.autosave_settle_ms);
    listeners.on(target, "input", move |ev: Event| {
        let Some(element) = ev.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if element.tag_name().eq_ignore_ascii_case("textarea") {
            fit_textarea(&element);
        }
        if element.closest(".auto-save").ok().flatten().is_some() {
            let (doc, timers) = (doc.clone(), Rc::clone(&registry));
            debouncer.trigger(&*registry, debounce_ms, move || autosave_cycle(doc, timers, settle_ms));
        }
    });

    let (win, registry) = (window.clone(), Rc::clone(timers));
    let (min_chars, guard_ms) = (config.search_min_chars, config.submit_guard_ms);
    listeners.on(target, "submit", move |ev: SubmitEvent| {
        let Some(form) = ev.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if form.id() == "search-form" {
            let query = form
                .query_selector("input[name=\"q\"]")
                .ok()
                .flatten()
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();
            if !search_query_ok(&query, min_chars) {
                ev.prevent_default();
                let _ = win.alert_with_message(&format!(
                    "Please enter at least {} characters to search.",
                    min_chars
                ));
                return;
            }
        }
        if ev.default_prevented() || form.matches(QUICK_FORM).unwrap_or(false) {
            return;
        }
        guard_submit(&form, &registry, guard_ms);
    });
}
