//! Server-rendered board markup.
//!
//! [`DomBoard`] is the [`BoardView`] over the live document:
//! - lists are `.tasks-container#tasks-<listId>` inside a `.task-list`
//!   holding a `.task-count`
//! - cards are `.task-card[data-task-id]`
//! - quick-create forms are `form.quick-task-form[data-list-id]`

pub mod actions;
pub mod drag;
pub mod listeners;

use std::rc::Rc;

use board_dnd::Bounds;
use leptos::mount::mount_to;
use leptos::prelude::*;
use tracing::{trace, warn};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlElement, HtmlInputElement, Node, NodeList,
};

use crate::components::TaskCard;
use crate::controller::{BoardView, Pulse};
use crate::error::{BoardError, BoardResult};
use crate::models::{ListId, Task, TaskId};
use crate::timers::TimerRegistry;

pub use listeners::ListenerSet;

pub const CARD: &str = ".task-card";
pub const CONTAINER: &str = ".tasks-container";
pub const CONTAINER_PREFIX: &str = "tasks-";
pub const QUICK_FORM: &str = "form.quick-task-form";
pub const QUICK_COMPLETE: &str = ".quick-complete";

const ORIGINAL_CONTENT_ATTR: &str = "data-original-content";
const BUSY_CONTENT: &str = "<span class=\"loading\"></span>";

/// List id of a container element id (`tasks-<listId>`)
pub fn list_id_from_container(element_id: &str) -> Option<ListId> {
    element_id
        .strip_prefix(CONTAINER_PREFIX)
        .filter(|id| !id.is_empty())
        .map(ListId::from)
}

/// Escape a value for a double-quoted CSS attribute selector
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn card_selector(task: &TaskId) -> String {
    format!("{}[data-task-id=\"{}\"]", CARD, css_string(task.as_str()))
}

pub fn form_selector(list: &ListId) -> String {
    format!("{}[data-list-id=\"{}\"]", QUICK_FORM, css_string(list.as_str()))
}

/// Elements of a `NodeList`, skipping non-element nodes
pub fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    root.query_selector_all(selector).map(elements).unwrap_or_default()
}

pub fn task_id_of(element: &Element) -> Option<TaskId> {
    element
        .get_attribute("data-task-id")
        .filter(|id| !id.is_empty())
        .map(TaskId::new)
}

/// List id of the container `element` sits in, or is
pub fn list_of(element: &Element) -> Option<ListId> {
    let container = element.closest(CONTAINER).ok().flatten()?;
    list_id_from_container(&container.id())
}

#[derive(Clone)]
pub struct DomBoard {
    document: Document,
    timers: Rc<TimerRegistry>,
    pulse_ms: u32,
}

impl DomBoard {
    pub fn new(document: Document, timers: Rc<TimerRegistry>, pulse_ms: u32) -> Self {
        Self {
            document,
            timers,
            pulse_ms,
        }
    }

    pub fn card(&self, task: &TaskId) -> Option<Element> {
        self.document.query_selector(&card_selector(task)).ok().flatten()
    }

    pub fn container(&self, list: &ListId) -> Option<Element> {
        self.document
            .get_element_by_id(&format!("{}{}", CONTAINER_PREFIX, list))
            .filter(|el| el.class_list().contains(&CONTAINER[1..]))
    }

    fn form(&self, list: &ListId) -> Option<Element> {
        self.document.query_selector(&form_selector(list)).ok().flatten()
    }

    fn title_input(&self, list: &ListId) -> Option<HtmlInputElement> {
        self.form(list)?
            .query_selector("input[name=\"title\"]")
            .ok()
            .flatten()?
            .dyn_into::<HtmlInputElement>()
            .ok()
    }

    fn all_containers(&self) -> Vec<Element> {
        self.document
            .query_selector_all(CONTAINER)
            .map(elements)
            .unwrap_or_default()
    }

    fn cards_in(&self, container: &Element) -> Vec<Element> {
        query_all(container, CARD)
    }
}

impl BoardView for DomBoard {
    fn locate(&self, task: &TaskId) -> Option<(ListId, usize)> {
        let card = self.card(task)?;
        let container = card.closest(CONTAINER).ok().flatten()?;
        let list = list_id_from_container(&container.id())?;
        let card_node: &Node = &card;
        let index = self
            .cards_in(&container)
            .iter()
            .position(|el| el.is_same_node(Some(card_node)))?;
        Some((list, index))
    }

    fn has_list(&self, list: &ListId) -> bool {
        self.container(list).is_some()
    }

    fn sibling_bounds(&self, list: &ListId, dragged: &TaskId) -> Vec<Bounds> {
        let Some(container) = self.container(list) else {
            return Vec::new();
        };
        self.cards_in(&container)
            .iter()
            .filter(|el| task_id_of(el).as_ref() != Some(dragged))
            .map(|el| Bounds::from(&el.get_bounding_client_rect()))
            .collect()
    }

    fn place(&self, task: &TaskId, list: &ListId, index: usize) -> BoardResult<usize> {
        let card = self
            .card(task)
            .ok_or_else(|| BoardError::UnknownTask(task.clone()))?;
        let container = self
            .container(list)
            .ok_or_else(|| BoardError::UnknownList(list.clone()))?;
        let card_node: &Node = &card;
        let siblings: Vec<Element> = self
            .cards_in(&container)
            .into_iter()
            .filter(|el| !el.is_same_node(Some(card_node)))
            .collect();

        match siblings.get(index) {
            Some(before) => {
                let parent = before.parent_node().unwrap_or_else(|| container.clone().into());
                let before: &Node = before;
                parent
                    .insert_before(&card, Some(before))
                    .map_err(BoardError::from_js)?;
                Ok(index)
            }
            None => {
                container.append_child(&card).map_err(BoardError::from_js)?;
                Ok(siblings.len())
            }
        }
    }

    fn set_dragging(&self, task: &TaskId, dragging: bool) {
        if let Some(card) = self.card(task) {
            let _ = card.class_list().toggle_with_force("dragging", dragging);
        }
    }

    fn set_drop_targets(&self, active: bool) {
        for container in self.all_containers() {
            let classes = container.class_list();
            if active {
                let _ = classes.add_1("drop-zone");
            } else {
                let _ = classes.remove_2("drop-zone", "drag-over");
            }
        }
    }

    fn pulse(&self, task: &TaskId, pulse: Pulse) {
        let Some(card) = self.card(task) else {
            return;
        };
        let class = pulse.class();
        let _ = card.class_list().add_1(class);
        self.timers.schedule(self.pulse_ms, move || {
            let _ = card.class_list().remove_1(class);
        });
    }

    fn refresh_counts(&self) {
        let lists = self
            .document
            .query_selector_all(".task-list")
            .map(elements)
            .unwrap_or_default();
        for list in lists {
            let count = query_all(&list, CARD).len();
            if let Ok(Some(label)) = list.query_selector(".task-count") {
                label.set_text_content(Some(&count.to_string()));
            }
            trace!(list = ?list.get_attribute("data-list-id"), count, "count refreshed");
        }
    }

    fn append_task(&self, list: &ListId, task: &Task) -> BoardResult<()> {
        let container = self
            .container(list)
            .ok_or_else(|| BoardError::UnknownList(list.clone()))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| BoardError::MissingElement(format!("{}{}", CONTAINER_PREFIX, list)))?;
        let task = task.clone();
        mount_to(container, move || view! { <TaskCard task=task /> }).forget();
        Ok(())
    }

    fn set_completed(&self, task: &TaskId, completed: bool) -> BoardResult<()> {
        let card = self
            .card(task)
            .ok_or_else(|| BoardError::UnknownTask(task.clone()))?;
        let _ = card.class_list().toggle_with_force("completed", completed);
        let icon = if completed { "fas fa-undo" } else { "fas fa-check" };
        if let Ok(Some(toggle)) = card.query_selector(QUICK_COMPLETE) {
            toggle.set_inner_html(&format!("<i class=\"{}\"></i>", icon));
        }
        Ok(())
    }

    fn set_submit_busy(&self, list: &ListId, busy: bool) {
        let Some(button) = self
            .form(list)
            .and_then(|form| form.query_selector("button[type=\"submit\"]").ok().flatten())
            .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
        else {
            warn!(%list, "quick-create form has no submit button");
            return;
        };
        button.set_disabled(busy);
        if busy {
            let _ = button.set_attribute(ORIGINAL_CONTENT_ATTR, &button.inner_html());
            button.set_inner_html(BUSY_CONTENT);
        } else if let Some(original) = button.get_attribute(ORIGINAL_CONTENT_ATTR) {
            button.set_inner_html(&original);
            let _ = button.remove_attribute(ORIGINAL_CONTENT_ATTR);
        }
    }

    fn clear_title(&self, list: &ListId) {
        if let Some(input) = self.title_input(list) {
            input.set_value("");
        }
    }

    fn focus_title(&self, list: &ListId) {
        if let Some(input) = self.title_input(list) {
            let _ = input.focus();
        }
    }
}
