//! In-memory board, service and notifier for controller tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use board_dnd::Bounds;
use tokio::sync::oneshot;

use crate::commands::TaskService;
use crate::controller::{BoardView, Notify, Pulse};
use crate::error::{BoardError, BoardResult};
use crate::models::{ListId, MoveRequest, Severity, Task, TaskId};
use crate::timers::{Scheduler, TimerId};

const CARD_PITCH: f64 = 50.0;
const CARD_HEIGHT: f64 = 40.0;

/// Board with lists laid out top to bottom, cards `CARD_PITCH` apart
#[derive(Default)]
pub struct FakeBoard {
    lists: RefCell<Vec<(ListId, Vec<TaskId>)>>,
    completed: RefCell<HashMap<TaskId, bool>>,
    counts: RefCell<HashMap<ListId, usize>>,
    dragging: RefCell<Option<TaskId>>,
    drop_targets: RefCell<bool>,
    pulses: RefCell<Vec<(TaskId, Pulse)>>,
    busy: RefCell<Vec<(ListId, bool)>>,
    cleared: RefCell<Vec<ListId>>,
    focused: RefCell<Vec<ListId>>,
}

pub fn board(lists: &[(&str, &[&str])]) -> FakeBoard {
    let fake = FakeBoard::default();
    *fake.lists.borrow_mut() = lists
        .iter()
        .map(|(list, tasks)| {
            (
                ListId::from(*list),
                tasks.iter().map(|t| TaskId::from(*t)).collect(),
            )
        })
        .collect();
    fake
}

impl FakeBoard {
    pub fn order(&self, list: &str) -> Vec<String> {
        self.lists
            .borrow()
            .iter()
            .find(|(id, _)| id.as_str() == list)
            .map(|(_, tasks)| tasks.iter().map(|t| t.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn count(&self, list: &str) -> Option<usize> {
        self.counts.borrow().get(&ListId::from(list)).copied()
    }

    pub fn completed(&self, task: &TaskId) -> Option<bool> {
        self.completed.borrow().get(task).copied()
    }

    pub fn is_marked_dragging(&self, task: &TaskId) -> bool {
        self.dragging.borrow().as_ref() == Some(task)
    }

    pub fn drop_targets_active(&self) -> bool {
        *self.drop_targets.borrow()
    }

    pub fn pulses(&self) -> Vec<(TaskId, Pulse)> {
        self.pulses.borrow().clone()
    }

    pub fn busy_history(&self) -> Vec<(ListId, bool)> {
        self.busy.borrow().clone()
    }

    pub fn cleared_titles(&self) -> Vec<ListId> {
        self.cleared.borrow().clone()
    }

    pub fn focused_titles(&self) -> Vec<ListId> {
        self.focused.borrow().clone()
    }

    fn contains(&self, task: &TaskId) -> bool {
        self.locate(task).is_some()
    }
}

impl BoardView for FakeBoard {
    fn locate(&self, task: &TaskId) -> Option<(ListId, usize)> {
        self.lists.borrow().iter().find_map(|(list, tasks)| {
            board_dnd::index_of(tasks, task).map(|index| (list.clone(), index))
        })
    }

    fn has_list(&self, list: &ListId) -> bool {
        self.lists.borrow().iter().any(|(id, _)| id == list)
    }

    fn sibling_bounds(&self, list: &ListId, dragged: &TaskId) -> Vec<Bounds> {
        self.lists
            .borrow()
            .iter()
            .find(|(id, _)| id == list)
            .map(|(_, tasks)| {
                tasks
                    .iter()
                    .filter(|t| *t != dragged)
                    .enumerate()
                    .map(|(i, _)| Bounds::new(i as f64 * CARD_PITCH, CARD_HEIGHT))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn place(&self, task: &TaskId, list: &ListId, index: usize) -> BoardResult<usize> {
        let mut lists = self.lists.borrow_mut();
        if !lists.iter().any(|(id, _)| id == list) {
            return Err(BoardError::UnknownList(list.clone()));
        }
        for (_, tasks) in lists.iter_mut() {
            tasks.retain(|t| t != task);
        }
        let (_, tasks) = lists
            .iter_mut()
            .find(|(id, _)| id == list)
            .ok_or_else(|| BoardError::UnknownList(list.clone()))?;
        Ok(board_dnd::place(tasks, task.clone(), index))
    }

    fn set_dragging(&self, task: &TaskId, dragging: bool) {
        *self.dragging.borrow_mut() = dragging.then(|| task.clone());
    }

    fn set_drop_targets(&self, active: bool) {
        *self.drop_targets.borrow_mut() = active;
    }

    fn pulse(&self, task: &TaskId, pulse: Pulse) {
        self.pulses.borrow_mut().push((task.clone(), pulse));
    }

    fn refresh_counts(&self) {
        let counts = self
            .lists
            .borrow()
            .iter()
            .map(|(list, tasks)| (list.clone(), tasks.len()))
            .collect();
        *self.counts.borrow_mut() = counts;
    }

    fn append_task(&self, list: &ListId, task: &Task) -> BoardResult<()> {
        let mut lists = self.lists.borrow_mut();
        let (_, tasks) = lists
            .iter_mut()
            .find(|(id, _)| id == list)
            .ok_or_else(|| BoardError::UnknownList(list.clone()))?;
        tasks.push(task.id.clone());
        Ok(())
    }

    fn set_completed(&self, task: &TaskId, completed: bool) -> BoardResult<()> {
        if !self.contains(task) {
            return Err(BoardError::UnknownTask(task.clone()));
        }
        self.completed.borrow_mut().insert(task.clone(), completed);
        Ok(())
    }

    fn set_submit_busy(&self, list: &ListId, busy: bool) {
        self.busy.borrow_mut().push((list.clone(), busy));
    }

    fn clear_title(&self, list: &ListId) {
        self.cleared.borrow_mut().push(list.clone());
    }

    fn focus_title(&self, list: &ListId) {
        self.focused.borrow_mut().push(list.clone());
    }
}

/// A scripted move reply, either ready or released by the test
pub enum Scripted {
    Now(BoardResult<()>),
    Later(oneshot::Receiver<BoardResult<()>>),
}

/// Service answering from scripted queues; unscripted calls succeed
#[derive(Default)]
pub struct FakeService {
    moves: RefCell<VecDeque<Scripted>>,
    creates: RefCell<VecDeque<BoardResult<Task>>>,
    toggles: RefCell<VecDeque<BoardResult<bool>>>,
    moves_sent: RefCell<Vec<MoveRequest>>,
    creates_sent: RefCell<Vec<(ListId, String)>>,
}

impl FakeService {
    pub fn script_move(&self, reply: Scripted) {
        self.moves.borrow_mut().push_back(reply);
    }

    pub fn script_create(&self, reply: BoardResult<Task>) {
        self.creates.borrow_mut().push_back(reply);
    }

    pub fn script_toggle(&self, reply: BoardResult<bool>) {
        self.toggles.borrow_mut().push_back(reply);
    }

    pub fn moves_sent(&self) -> Vec<MoveRequest> {
        self.moves_sent.borrow().clone()
    }

    pub fn creates_sent(&self) -> Vec<(ListId, String)> {
        self.creates_sent.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TaskService for FakeService {
    async fn move_task(&self, request: &MoveRequest) -> BoardResult<()> {
        self.moves_sent.borrow_mut().push(request.clone());
        let reply = self.moves.borrow_mut().pop_front();
        match reply {
            None => Ok(()),
            Some(Scripted::Now(result)) => result,
            Some(Scripted::Later(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(BoardError::Transport("reply dropped".into()))),
        }
    }

    async fn quick_create(&self, list: &ListId, title: &str) -> BoardResult<Task> {
        self.creates_sent
            .borrow_mut()
            .push((list.clone(), title.to_string()));
        let reply = self.creates.borrow_mut().pop_front();
        reply.unwrap_or_else(|| Err(BoardError::Transport("unscripted".into())))
    }

    async fn toggle_complete(&self, _task: &TaskId) -> BoardResult<bool> {
        let reply = self.toggles.borrow_mut().pop_front();
        reply.unwrap_or_else(|| Err(BoardError::Transport("unscripted".into())))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.borrow().clone()
    }
}

impl Notify for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .borrow_mut()
            .push((message.to_string(), severity));
    }
}

struct Scheduled {
    id: TimerId,
    due: u64,
    f: Box<dyn FnOnce()>,
}

/// Scheduler driven by hand: nothing fires until `advance` passes its due time
#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
    next_id: Cell<u64>,
    pending: RefCell<Vec<Scheduled>>,
    cancelled: RefCell<Vec<TimerId>>,
    cleared: RefCell<HashMap<TimerId, Box<dyn FnOnce()>>>,
}

impl ManualClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Move time forward, firing due callbacks in due order
    pub fn advance(&self, ms: u64) {
        let target = self.now.get() + ms;
        loop {
            let next = {
                let mut pending = self.pending.borrow_mut();
                let earliest = pending
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.due <= target)
                    .min_by_key(|(_, s)| (s.due, s.id.0))
                    .map(|(i, _)| i);
                earliest.map(|i| pending.remove(i))
            };
            let Some(scheduled) = next else {
                break;
            };
            self.now.set(scheduled.due);
            (scheduled.f)();
        }
        self.now.set(target);
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn cancelled(&self) -> Vec<TimerId> {
        self.cancelled.borrow().clone()
    }

    /// Run a cancelled callback anyway, as a timeout already queued when
    /// it was cleared would; returns whether there was one
    pub fn fire_cancelled(&self, id: TimerId) -> bool {
        let f = self.cleared.borrow_mut().remove(&id);
        match f {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }
}

impl Scheduler for ManualClock {
    fn schedule_once(&self, ms: u32, f: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.pending.borrow_mut().push(Scheduled {
            id,
            due: self.now.get() + u64::from(ms),
            f,
        });
        id
    }

    fn cancel(&self, id: TimerId) {
        let removed = {
            let mut pending = self.pending.borrow_mut();
            pending
                .iter()
                .position(|s| s.id == id)
                .map(|i| pending.remove(i))
        };
        if let Some(scheduled) = removed {
            self.cancelled.borrow_mut().push(id);
            self.cleared.borrow_mut().insert(id, scheduled.f);
        }
    }
}
