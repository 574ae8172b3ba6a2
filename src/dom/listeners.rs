//! Owned event listeners.
//!
//! Every handler the page installs lives here until [`ListenerSet::clear`]
//! detaches it, so nothing is left behind on `pagehide`.

use std::cell::RefCell;

use tracing::{trace, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

#[derive(Default)]
pub struct ListenerSet {
    listeners: RefCell<Vec<Listener>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for `event` on `target`; events that are not an `E` are ignored
    pub fn on<E, F>(&self, target: &EventTarget, event: &'static str, handler: F)
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        self.add(target, event, handler, None);
    }

    /// Like [`ListenerSet::on`] but non-passive, so the handler may call
    /// `prevent_default` on touch events
    pub fn on_active<E, F>(&self, target: &EventTarget, event: &'static str, handler: F)
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        self.add(target, event, handler, Some(options));
    }

    fn add<E, F>(
        &self,
        target: &EventTarget,
        event: &'static str,
        mut handler: F,
        options: Option<AddEventListenerOptions>,
    ) where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let closure = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            if let Ok(ev) = ev.dyn_into::<E>() {
                handler(ev);
            }
        });
        let callback = closure.as_ref().unchecked_ref();
        let added = match &options {
            Some(options) => target
                .add_event_listener_with_callback_and_add_event_listener_options(event, callback, options),
            None => target.add_event_listener_with_callback(event, callback),
        };
        if let Err(err) = added {
            warn!(event, ?err, "could not add listener");
            return;
        }
        trace!(event, "listener added");
        self.listeners.borrow_mut().push(Listener {
            target: target.clone(),
            event,
            closure,
        });
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Detach and drop every listener
    pub fn clear(&self) {
        let listeners: Vec<Listener> = self.listeners.borrow_mut().drain(..).collect();
        for listener in &listeners {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
        trace!(count = listeners.len(), "listeners cleared");
    }
}
