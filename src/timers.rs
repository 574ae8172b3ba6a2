//! Page Timers
//!
//! Every timeout and interval the page starts goes through one
//! [`TimerRegistry`] so teardown can stop them all at once.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};
use tracing::trace;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub(crate) u64);

/// One-shot scheduling, as seen by code that only needs to start and stop
/// its own timeouts
pub trait Scheduler {
    /// Run `f` once after `ms`
    fn schedule_once(&self, ms: u32, f: Box<dyn FnOnce()>) -> TimerId;
    /// Stop a pending timeout; unknown or fired ids are ignored
    fn cancel(&self, id: TimerId);
}

#[derive(Debug, Clone)]
enum Handle {
    Timeout(JsValue),
    Interval(JsValue),
}

/// Id allocation and the handles still pending
#[derive(Debug)]
struct TimerBook<H> {
    next_id: Cell<u64>,
    handles: RefCell<HashMap<TimerId, H>>,
}

impl<H> Default for TimerBook<H> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            handles: RefCell::new(HashMap::new()),
        }
    }
}

impl<H> TimerBook<H> {
    fn issue(&self) -> TimerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        TimerId(id)
    }

    fn insert(&self, id: TimerId, handle: H) {
        self.handles.borrow_mut().insert(id, handle);
    }

    fn take(&self, id: TimerId) -> Option<H> {
        self.handles.borrow_mut().remove(&id)
    }

    fn drain(&self) -> Vec<H> {
        self.handles.borrow_mut().drain().map(|(_, h)| h).collect()
    }

    fn len(&self) -> usize {
        self.handles.borrow().len()
    }
}

#[derive(Default)]
pub struct TimerRegistry {
    book: Rc<TimerBook<Handle>>,
}

impl TimerRegistry {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Run `f` once after `ms`
    pub fn schedule(&self, ms: u32, f: impl FnOnce() + 'static) -> TimerId {
        let id = self.book.issue();
        let book = Rc::downgrade(&self.book);
        // The JS side owns the callback; the registry only keeps the handle
        let handle = JsValue::from(
            Timeout::new(ms, move || {
                if let Some(book) = book.upgrade() {
                    book.take(id);
                }
                f();
            })
            .forget(),
        );
        self.book.insert(id, Handle::Timeout(handle));
        trace!(?id, ms, "timeout scheduled");
        id
    }

    /// Run `f` every `ms` until cancelled
    pub fn every(&self, ms: u32, f: impl FnMut() + 'static) -> TimerId {
        let id = self.book.issue();
        let handle = JsValue::from(Interval::new(ms, f).forget());
        self.book.insert(id, Handle::Interval(handle));
        trace!(?id, ms, "interval started");
        id
    }

    pub fn cancel(&self, id: TimerId) {
        if let Some(handle) = self.book.take(id) {
            clear(handle);
        }
    }

    pub fn cancel_all(&self) {
        trace!(count = self.book.len(), "cancelling all timers");
        for handle in self.book.drain() {
            clear(handle);
        }
    }
}

impl Scheduler for TimerRegistry {
    fn schedule_once(&self, ms: u32, f: Box<dyn FnOnce()>) -> TimerId {
        self.schedule(ms, f)
    }

    fn cancel(&self, id: TimerId) {
        TimerRegistry::cancel(self, id);
    }
}

fn clear(handle: Handle) {
    let Some(window) = web_sys::window() else {
        return;
    };
    match handle {
        Handle::Timeout(h) => {
            if let Some(h) = h.as_f64() {
                window.clear_timeout_with_handle(h as i32);
            }
        }
        Handle::Interval(h) => {
            if let Some(h) = h.as_f64() {
                window.clear_interval_with_handle(h as i32);
            }
        }
    }
}

/// Restarts a single pending timeout on every trigger
#[derive(Default)]
pub struct Debouncer {
    pending: Cell<Option<TimerId>>,
}

impl Debouncer {
    pub fn trigger(&self, timers: &dyn Scheduler, ms: u32, f: impl FnOnce() + 'static) {
        if let Some(previous) = self.pending.take() {
            timers.cancel(previous);
        }
        self.pending.set(Some(timers.schedule_once(ms, Box::new(f))));
    }
}

/// Lets at most one call through per `limit_ms`
#[derive(Debug, Clone, Copy)]
pub struct ThrottleGate {
    limit_ms: f64,
    last: Option<f64>,
}

impl ThrottleGate {
    pub fn new(limit_ms: f64) -> Self {
        Self { limit_ms, last: None }
    }

    pub fn try_fire(&mut self, now_ms: f64) -> bool {
        match self.last {
            Some(last) if now_ms - last < self.limit_ms => false,
            _ => {
                self.last = Some(now_ms);
                true
            }
        }
    }
}
