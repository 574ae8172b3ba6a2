//! Board Page
//!
//! Wires the controller to the live document once per page load and owns
//! everything that has to be torn down when the page goes away.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{ErrorEvent, PageTransitionEvent};

use crate::commands::HttpTaskService;
use crate::components::NotificationCenter;
use crate::config::BoardConfig;
use crate::controller::BoardController;
use crate::dom::{actions, drag, DomBoard, ListenerSet};
use crate::error::{BoardError, BoardResult};
use crate::models::Severity;
use crate::timers::{Scheduler, TimerRegistry};
use crate::{conveniences, shortcuts, time};

pub type PageController = BoardController<DomBoard, HttpTaskService, NotificationCenter>;

const UNCAUGHT_MESSAGE: &str = "An unexpected error occurred. Please reload the page.";

thread_local! {
    static ACTIVE_PAGE: RefCell<Option<Rc<BoardPage>>> = const { RefCell::new(None) };
}

pub struct BoardPage {
    controller: Rc<PageController>,
    listeners: ListenerSet,
    timers: Rc<TimerRegistry>,
    notifications: NotificationCenter,
}

impl BoardPage {
    /// Bind every handler to the current document
    pub fn attach(config: &BoardConfig) -> BoardResult<Rc<Self>> {
        let window = web_sys::window().ok_or_else(|| BoardError::MissingElement("window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| BoardError::MissingElement("document".into()))?;

        let timers = TimerRegistry::new();
        let notifications =
            NotificationCenter::mount(&document, Rc::clone(&timers) as Rc<dyn Scheduler>, config.notification_ttl_ms)?;
        let view = DomBoard::new(document.clone(), Rc::clone(&timers), config.pulse_ms);
        let controller = Rc::new(BoardController::new(
            view,
            HttpTaskService::new(config),
            notifications.clone(),
            config.move_policy,
        ));

        let listeners = ListenerSet::new();
        drag::bind_native(&document, &listeners, &controller);
        let touch = drag::touch_supported(&window);
        if touch {
            drag::bind_touch(&document, &listeners, &controller, config.touch_threshold_px);
        }
        actions::bind(&document, &listeners, &controller);
        shortcuts::bind(&document, &listeners);
        conveniences::bind(&window, &document, &listeners, &timers, config);

        time::refresh(&document);
        time::start_refresh(&document, &timers, config.refresh_interval_ms);

        let center = notifications.clone();
        listeners.on(window.as_ref(), "error", move |ev: ErrorEvent| {
            error!(message = %ev.message(), file = %ev.filename(), line = ev.lineno(), "uncaught error");
            center.push(UNCAUGHT_MESSAGE, Severity::Danger);
        });

        info!(
            listeners = listeners.len(),
            touch,
            policy = ?config.move_policy,
            "board attached"
        );
        Ok(Rc::new(Self {
            controller,
            listeners,
            timers,
            notifications,
        }))
    }

    /// Detach listeners, stop timers and drop visible notifications
    pub fn teardown(&self) {
        self.controller.on_drag_cancel();
        self.listeners.clear();
        self.timers.cancel_all();
        self.notifications.clear();
        info!("board torn down");
    }
}

fn activate(config: &BoardConfig) {
    match BoardPage::attach(config) {
        Ok(page) => {
            let previous = ACTIVE_PAGE.with(|slot| slot.replace(Some(page)));
            if let Some(previous) = previous {
                previous.teardown();
            }
        }
        Err(err) => error!(%err, "board could not attach"),
    }
}

/// Tear the page down when it is discarded; a page kept in the
/// back/forward cache keeps its handlers
fn install_teardown(window: &web_sys::Window) {
    let on_pagehide = Closure::<dyn FnMut(PageTransitionEvent)>::new(|ev: PageTransitionEvent| {
        if ev.persisted() {
            return;
        }
        if let Some(page) = ACTIVE_PAGE.with(|slot| slot.borrow_mut().take()) {
            page.teardown();
        }
    });
    if let Err(err) =
        window.add_event_listener_with_callback("pagehide", on_pagehide.as_ref().unchecked_ref())
    {
        warn!(?err, "pagehide listener not installed");
    }
    on_pagehide.forget();
}

/// Attach now, or once the document has finished parsing
pub fn start(config: BoardConfig) {
    let Some(window) = web_sys::window() else {
        error!("no window, board not started");
        return;
    };
    install_teardown(&window);

    let loading = window
        .document()
        .map(|doc| doc.ready_state() == "loading")
        .unwrap_or(false);
    if !loading {
        activate(&config);
        return;
    }

    let on_ready = Closure::once_into_js(move || activate(&config));
    if let Err(err) =
        window.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())
    {
        warn!(?err, "DOMContentLoaded listener not installed");
    }
}
