//! Drag handlers for the board.
//!
//! Native HTML5 drag events drive the controller directly. On touch
//! devices a second set of handlers turns a finger drag past the threshold
//! into the same start/drop/cancel calls.

use std::cell::RefCell;
use std::rc::Rc;

use board_dnd::{GestureStep, Point, TouchGesture};
use leptos::task::spawn_local;
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DragEvent, Element, HtmlElement, Node, TouchEvent};

use super::{list_id_from_container, list_of, task_id_of, ListenerSet, CARD, CONTAINER};
use crate::app::PageController;
use crate::models::{ListId, TaskId};
use crate::timers::ThrottleGate;

/// Minimum time between repositioning a floating card
const TOUCH_MOVE_THROTTLE_MS: f64 = 16.0;

/// Offset of the floating card from the finger
const FLOAT_OFFSET_X: f64 = 150.0;
const FLOAT_OFFSET_Y: f64 = 50.0;

const FLOAT_STYLES: [&str; 7] = [
    "position",
    "top",
    "left",
    "z-index",
    "transform",
    "opacity",
    "pointer-events",
];

fn closest(target: Option<web_sys::EventTarget>, selector: &str) -> Option<Element> {
    target?
        .dyn_into::<Element>()
        .ok()?
        .closest(selector)
        .ok()
        .flatten()
}

/// Drop the current drag onto `list` and persist it in the background
fn drop_and_commit(controller: &Rc<PageController>, list: &ListId, pointer_y: f64) {
    match controller.on_drop(list, pointer_y) {
        Ok(pending) => {
            let controller = Rc::clone(controller);
            spawn_local(async move {
                // Failures are already reported to the user
                let _ = controller.commit_move(pending).await;
            });
        }
        Err(err) => warn!(%list, %err, "drop refused"),
    }
}

pub fn bind_native(document: &Document, listeners: &ListenerSet, controller: &Rc<PageController>) {
    let target: &web_sys::EventTarget = document.as_ref();

    let c = Rc::clone(controller);
    listeners.on(target, "dragstart", move |ev: DragEvent| {
        let Some(card) = closest(ev.target(), CARD) else {
            return;
        };
        let Some(task) = task_id_of(&card) else {
            return;
        };
        if let Some(transfer) = ev.data_transfer() {
            let _ = transfer.set_data("text/plain", task.as_str());
            transfer.set_effect_allowed("move");
        }
        if let Err(err) = c.on_drag_start(&task) {
            debug!(%task, %err, "drag not started");
            ev.prevent_default();
        }
    });

    listeners.on(target, "dragover", move |ev: DragEvent| {
        let Some(container) = closest(ev.target(), CONTAINER) else {
            return;
        };
        ev.prevent_default();
        if let Some(transfer) = ev.data_transfer() {
            transfer.set_drop_effect("move");
        }
        let _ = container.class_list().add_1("drag-over");
    });

    listeners.on(target, "dragleave", move |ev: DragEvent| {
        let Some(container) = closest(ev.target(), CONTAINER) else {
            return;
        };
        let related = ev.related_target().and_then(|t| t.dyn_into::<Node>().ok());
        // Moving onto a child still counts as inside
        if !container.contains(related.as_ref()) {
            let _ = container.class_list().remove_1("drag-over");
        }
    });

    let c = Rc::clone(controller);
    listeners.on(target, "drop", move |ev: DragEvent| {
        let Some(container) = closest(ev.target(), CONTAINER) else {
            return;
        };
        ev.prevent_default();
        let _ = container.class_list().remove_1("drag-over");
        let Some(list) = list_id_from_container(&container.id()) else {
            warn!(id = %container.id(), "drop on a container without a list id");
            c.on_drag_cancel();
            return;
        };
        drop_and_commit(&c, &list, f64::from(ev.client_y()));
    });

    let c = Rc::clone(controller);
    listeners.on(target, "dragend", move |_ev: DragEvent| {
        // After a drop the session is already closed
        if c.is_dragging() {
            c.on_drag_cancel();
        }
    });
}

/// Whether the page runs on a touch-capable device
pub fn touch_supported(window: &web_sys::Window) -> bool {
    js_sys::Reflect::has(window, &JsValue::from_str("ontouchstart")).unwrap_or(false)
}

struct TouchDrag {
    gesture: TouchGesture<TaskId>,
    card: HtmlElement,
    throttle: ThrottleGate,
}

fn touch_point(touches: Option<web_sys::TouchList>) -> Option<Point> {
    let touch = touches?.get(0)?;
    Some(Point::new(
        f64::from(touch.client_x()),
        f64::from(touch.client_y()),
    ))
}

fn float_at(card: &HtmlElement, point: Point) {
    let style = card.style();
    let _ = style.set_property("top", &format!("{}px", point.y - FLOAT_OFFSET_Y));
    let _ = style.set_property("left", &format!("{}px", point.x - FLOAT_OFFSET_X));
}

fn lift(card: &HtmlElement, point: Point) {
    let style = card.style();
    let _ = style.set_property("position", "fixed");
    let _ = style.set_property("z-index", "1000");
    let _ = style.set_property("transform", "rotate(5deg)");
    let _ = style.set_property("opacity", "0.8");
    // Hit-testing on release must see what is under the card
    let _ = style.set_property("pointer-events", "none");
    float_at(card, point);
}

fn settle(card: &HtmlElement) {
    let style = card.style();
    for property in FLOAT_STYLES {
        let _ = style.remove_property(property);
    }
}

pub fn bind_touch(
    document: &Document,
    listeners: &ListenerSet,
    controller: &Rc<PageController>,
    threshold: f64,
) {
    let target: &web_sys::EventTarget = document.as_ref();
    let active: Rc<RefCell<Option<TouchDrag>>> = Rc::new(RefCell::new(None));

    let state = Rc::clone(&active);
    listeners.on(target, "touchstart", move |ev: TouchEvent| {
        let Some(card) = closest(ev.target(), CARD) else {
            return;
        };
        let (Some(task), Some(origin)) = (task_id_of(&card), touch_point(Some(ev.touches()))) else {
            return;
        };
        let Ok(card) = card.dyn_into::<HtmlElement>() else {
            return;
        };
        *state.borrow_mut() = Some(TouchDrag {
            gesture: TouchGesture::new(task, origin, threshold),
            card,
            throttle: ThrottleGate::new(TOUCH_MOVE_THROTTLE_MS),
        });
    });

    let state = Rc::clone(&active);
    let c = Rc::clone(controller);
    listeners.on_active(target, "touchmove", move |ev: TouchEvent| {
        let Some(point) = touch_point(Some(ev.touches())) else {
            return;
        };
        let mut slot = state.borrow_mut();
        let Some(drag) = slot.as_mut() else {
            return;
        };
        match drag.gesture.track(point) {
            GestureStep::Pending => {}
            GestureStep::Started => {
                if let Err(err) = c.on_drag_start(drag.gesture.task()) {
                    debug!(task = %drag.gesture.task(), %err, "touch drag not started");
                    *slot = None;
                    return;
                }
                ev.prevent_default();
                lift(&drag.card, point);
            }
            GestureStep::Dragging => {
                ev.prevent_default();
                if drag.throttle.try_fire(js_sys::Date::now()) {
                    float_at(&drag.card, point);
                }
            }
        }
    });

    let state = Rc::clone(&active);
    let c = Rc::clone(controller);
    let doc = document.clone();
    listeners.on(target, "touchend", move |ev: TouchEvent| {
        let Some(drag) = state.borrow_mut().take() else {
            return;
        };
        if !drag.gesture.is_dragging() {
            return;
        }
        settle(&drag.card);

        let Some(point) = touch_point(Some(ev.changed_touches())) else {
            c.on_drag_cancel();
            return;
        };
        let list = doc
            .element_from_point(point.x as f32, point.y as f32)
            .as_ref()
            .and_then(list_of);
        match list {
            Some(list) => drop_and_commit(&c, &list, point.y),
            None => {
                debug!(task = %drag.gesture.task(), "touch released outside any list");
                c.on_drag_cancel();
            }
        }
    });

    let state = Rc::clone(&active);
    let c = Rc::clone(controller);
    listeners.on(target, "touchcancel", move |_ev: TouchEvent| {
        if let Some(drag) = state.borrow_mut().take() {
            if drag.gesture.is_dragging() {
                settle(&drag.card);
                c.on_drag_cancel();
            }
        }
    });
}
