//! Board Interaction Controller
//!
//! One per page. Owns the view it mutates, the service it persists through
//! and the notifier it reports failures to, and turns gestures into
//! optimistic DOM changes plus a request each.
//!
//! Moves are split in two: [`BoardController::on_drop`] applies the move
//! synchronously, inside the drop event, and [`BoardController::commit_move`]
//! persists it and rolls it back if the server says no.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use board_dnd::{drop_index, Bounds, DragMachine, DragSession};
use tracing::{debug, info, warn};

use crate::commands::TaskService;
use crate::config::MovePolicy;
use crate::error::{BoardError, BoardResult};
use crate::models::{ListId, MoveRequest, Severity, Task, TaskId};

/// Short visual feedback on a card after the server answered a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    Success,
    Error,
}

impl Pulse {
    pub fn class(&self) -> &'static str {
        match self {
            Pulse::Success => "move-success",
            Pulse::Error => "move-error",
        }
    }
}

/// The board as the controller sees it.
///
/// Methods take `&self`: the DOM behind the real implementation is shared
/// and mutated in place.
pub trait BoardView {
    /// List and index of a task card
    fn locate(&self, task: &TaskId) -> Option<(ListId, usize)>;
    fn has_list(&self, list: &ListId) -> bool;
    /// Cards of `list` in DOM order, without `dragged`
    fn sibling_bounds(&self, list: &ListId, dragged: &TaskId) -> Vec<Bounds>;
    /// Put `task` at `index` among the other cards of `list`; returns the
    /// index it actually landed at
    fn place(&self, task: &TaskId, list: &ListId, index: usize) -> BoardResult<usize>;
    fn set_dragging(&self, task: &TaskId, dragging: bool);
    fn set_drop_targets(&self, active: bool);
    fn pulse(&self, task: &TaskId, pulse: Pulse);
    /// Recount every list's displayed task count from its cards
    fn refresh_counts(&self);
    fn append_task(&self, list: &ListId, task: &Task) -> BoardResult<()>;
    fn set_completed(&self, task: &TaskId, completed: bool) -> BoardResult<()>;
    fn set_submit_busy(&self, list: &ListId, busy: bool);
    fn clear_title(&self, list: &ListId);
    fn focus_title(&self, list: &ListId);
}

/// Where user-facing messages go
pub trait Notify {
    fn notify(&self, message: &str, severity: Severity);
}

/// A move applied to the view and waiting for the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub ticket: u64,
    pub request: MoveRequest,
    /// Where to put the card back if the server refuses
    pub source: DragSession<TaskId, ListId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Confirmed(MoveRequest),
    /// A newer move of the same task was issued and this response was dropped
    Superseded(MoveRequest),
}

/// Moves of one task awaiting the server
#[derive(Debug, Clone, Copy)]
struct InFlight {
    latest: u64,
    pending: usize,
}

pub struct BoardController<V, S, N> {
    view: V,
    service: S,
    notifier: N,
    policy: MovePolicy,
    drag: RefCell<DragMachine<TaskId, ListId>>,
    in_flight: RefCell<HashMap<TaskId, InFlight>>,
    next_ticket: Cell<u64>,
}

impl<V: BoardView, S: TaskService, N: Notify> BoardController<V, S, N> {
    pub fn new(view: V, service: S, notifier: N, policy: MovePolicy) -> Self {
        Self {
            view,
            service,
            notifier,
            policy,
            drag: RefCell::new(DragMachine::new()),
            in_flight: RefCell::new(HashMap::new()),
            next_ticket: Cell::new(0),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.borrow().is_dragging()
    }

    pub fn has_move_in_flight(&self, task: &TaskId) -> bool {
        self.in_flight.borrow().contains_key(task)
    }

    // ========================
    // Drag and drop
    // ========================

    /// Idle -> Dragging
    pub fn on_drag_start(&self, task: &TaskId) -> BoardResult<DragSession<TaskId, ListId>> {
        if self.policy == MovePolicy::IgnoreWhilePending && self.has_move_in_flight(task) {
            warn!(%task, "drag refused, previous move still in flight");
            return Err(BoardError::MoveInFlight(task.clone()));
        }
        let (source_list, source_index) = self
            .view
            .locate(task)
            .ok_or_else(|| BoardError::UnknownTask(task.clone()))?;
        let session = DragSession {
            task: task.clone(),
            source_list,
            source_index,
        };
        self.drag.borrow_mut().start(session.clone())?;

        self.view.set_dragging(task, true);
        self.view.set_drop_targets(true);
        Ok(session)
    }

    /// Dragging -> Cancelled; the view was never moved so only the drag
    /// marks are cleared
    pub fn on_drag_cancel(&self) -> Option<DragSession<TaskId, ListId>> {
        let session = self.drag.borrow_mut().cancel()?;
        self.view.set_dragging(&session.task, false);
        self.view.set_drop_targets(false);
        Some(session)
    }

    /// Dragging -> Dropped: computes the insertion index from `pointer_y`
    /// and moves the card right away
    pub fn on_drop(&self, list: &ListId, pointer_y: f64) -> BoardResult<PendingMove> {
        if !self.view.has_list(list) {
            self.on_drag_cancel();
            return Err(BoardError::UnknownList(list.clone()));
        }
        let session = self.drag.borrow_mut().drop_session()?;
        self.view.set_dragging(&session.task, false);
        self.view.set_drop_targets(false);

        let siblings = self.view.sibling_bounds(list, &session.task);
        let index = drop_index(pointer_y, &siblings);
        let position = self.view.place(&session.task, list, index)?;
        debug!(task = %session.task, %list, position, "optimistic move applied");

        let ticket = self.issue_ticket(&session.task);
        Ok(PendingMove {
            ticket,
            request: MoveRequest {
                task: session.task.clone(),
                list: list.clone(),
                position,
            },
            source: session,
        })
    }

    /// Persist a dropped move; on failure the card goes back where it came
    /// from and the user is told why
    pub async fn commit_move(&self, pending: PendingMove) -> BoardResult<MoveOutcome> {
        let result = self.service.move_task(&pending.request).await;
        let latest = self.settle_ticket(&pending.request.task, pending.ticket);

        if !latest && self.policy == MovePolicy::DiscardStale {
            debug!(task = %pending.request.task, ticket = pending.ticket, "stale move response dropped");
            return Ok(MoveOutcome::Superseded(pending.request));
        }

        match result {
            Ok(()) => {
                info!(
                    task = %pending.request.task,
                    list = %pending.request.list,
                    position = pending.request.position,
                    "move confirmed"
                );
                self.view.pulse(&pending.request.task, Pulse::Success);
                self.view.refresh_counts();
                Ok(MoveOutcome::Confirmed(pending.request))
            }
            Err(err) => {
                warn!(task = %pending.request.task, kind = ?err.kind(), %err, "move failed, reverting");
                self.revert(&pending.source);
                self.notifier.notify(
                    &format!("Failed to move task: {}", err.reason()),
                    Severity::Danger,
                );
                self.view.pulse(&pending.request.task, Pulse::Error);
                Err(err)
            }
        }
    }

    fn revert(&self, source: &DragSession<TaskId, ListId>) {
        if let Err(err) = self
            .view
            .place(&source.task, &source.source_list, source.source_index)
        {
            warn!(task = %source.task, %err, "could not put task back");
        }
    }

    fn issue_ticket(&self, task: &TaskId) -> u64 {
        let ticket = self.next_ticket.get() + 1;
        self.next_ticket.set(ticket);
        let mut in_flight = self.in_flight.borrow_mut();
        let entry = in_flight
            .entry(task.clone())
            .or_insert(InFlight { latest: ticket, pending: 0 });
        entry.latest = ticket;
        entry.pending += 1;
        ticket
    }

    /// Marks one of the task's moves as answered; returns whether `ticket`
    /// was the most recent move issued for it
    fn settle_ticket(&self, task: &TaskId, ticket: u64) -> bool {
        let mut in_flight = self.in_flight.borrow_mut();
        let Some(entry) = in_flight.get_mut(task) else {
            return true;
        };
        let latest = entry.latest == ticket;
        entry.pending = entry.pending.saturating_sub(1);
        if entry.pending == 0 {
            in_flight.remove(task);
        }
        latest
    }

    // ========================
    // Quick actions
    // ========================

    /// Quick-create form submit
    pub async fn on_submit(&self, list: &ListId, title: &str) -> BoardResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            self.view.focus_title(list);
            return Err(BoardError::EmptyTitle);
        }

        self.view.set_submit_busy(list, true);
        let result = self.service.quick_create(list, title).await;
        self.view.set_submit_busy(list, false);

        match result {
            Ok(task) => {
                info!(task = %task.id, %list, "task created");
                if let Err(err) = self.view.append_task(list, &task) {
                    warn!(task = %task.id, %err, "created task could not be shown");
                }
                self.view.clear_title(list);
                self.view.refresh_counts();
                self.notifier.notify("Task created", Severity::Success);
                Ok(task)
            }
            Err(err) => {
                warn!(%list, kind = ?err.kind(), %err, "quick create failed");
                self.notifier.notify(
                    &format!("Failed to create task: {}", err.reason()),
                    Severity::Danger,
                );
                Err(err)
            }
        }
    }

    /// Quick-complete toggle; the card shows whatever the server reports
    pub async fn on_toggle(&self, task: &TaskId) -> BoardResult<bool> {
        match self.service.toggle_complete(task).await {
            Ok(completed) => {
                debug!(%task, completed, "completion toggled");
                if let Err(err) = self.view.set_completed(task, completed) {
                    warn!(%task, %err, "toggled task is no longer on the board");
                }
                Ok(completed)
            }
            Err(err) => {
                warn!(%task, kind = ?err.kind(), %err, "toggle failed");
                self.notifier.notify(
                    &format!("Failed to update task: {}", err.reason()),
                    Severity::Danger,
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{board, FakeBoard, FakeService, RecordingNotifier, Scripted};
    use tokio::sync::oneshot;

    type TestController = BoardController<FakeBoard, FakeService, RecordingNotifier>;

    fn controller(view: FakeBoard, policy: MovePolicy) -> TestController {
        BoardController::new(view, FakeService::default(), RecordingNotifier::default(), policy)
    }

    fn t(id: &str) -> TaskId {
        TaskId::from(id)
    }

    fn l(id: &str) -> ListId {
        ListId::from(id)
    }

    #[tokio::test]
    async fn test_drag_within_list_moves_immediately_and_sends_one_request() {
        let c = controller(board(&[("A", &["T1", "T2", "T3"])]), MovePolicy::default());

        c.on_drag_start(&t("T3")).unwrap();
        assert!(c.view().is_marked_dragging(&t("T3")));
        assert!(c.view().drop_targets_active());

        // Siblings T1, T2 have midpoints 20 and 70: 50 lands between them
        let pending = c.on_drop(&l("A"), 50.0).unwrap();
        assert_eq!(c.view().order("A"), vec!["T1", "T3", "T2"]);
        assert!(!c.view().is_marked_dragging(&t("T3")));
        assert!(!c.view().drop_targets_active());

        let outcome = c.commit_move(pending).await.unwrap();
        let expected = MoveRequest { task: t("T3"), list: l("A"), position: 1 };
        assert_eq!(outcome, MoveOutcome::Confirmed(expected.clone()));
        assert_eq!(c.service.moves_sent(), vec![expected]);
        assert_eq!(c.view().pulses(), vec![(t("T3"), Pulse::Success)]);
        assert_eq!(c.view().count("A"), Some(3));
    }

    #[tokio::test]
    async fn test_drop_extremes() {
        let c = controller(
            board(&[("A", &["T1"]), ("B", &["U1", "U2"])]),
            MovePolicy::default(),
        );

        c.on_drag_start(&t("T1")).unwrap();
        let pending = c.on_drop(&l("B"), -100.0).unwrap();
        assert_eq!(pending.request.position, 0);
        assert_eq!(c.view().order("B"), vec!["T1", "U1", "U2"]);
        c.commit_move(pending).await.unwrap();

        c.on_drag_start(&t("U1")).unwrap();
        let pending = c.on_drop(&l("A"), 10_000.0).unwrap();
        assert_eq!(pending.request.position, 0);
        assert_eq!(c.view().order("A"), vec!["U1"]);
        c.commit_move(pending).await.unwrap();
        assert_eq!(c.view().count("A"), Some(1));
        assert_eq!(c.view().count("B"), Some(2));
    }

    #[tokio::test]
    async fn test_rejected_move_reverts_and_notifies_once() {
        let c = controller(
            board(&[("A", &["T1", "T2", "T3"]), ("B", &["U1"])]),
            MovePolicy::default(),
        );
        c.service.script_move(Scripted::Now(Err(BoardError::Rejected("locked".into()))));

        c.on_drag_start(&t("T2")).unwrap();
        let pending = c.on_drop(&l("B"), 0.0).unwrap();
        assert_eq!(c.view().order("B"), vec!["T2", "U1"]);

        let err = c.commit_move(pending).await.unwrap_err();
        assert_eq!(err, BoardError::Rejected("locked".into()));
        assert_eq!(c.view().order("A"), vec!["T1", "T2", "T3"]);
        assert_eq!(c.view().order("B"), vec!["U1"]);

        let notices = c.notifier.messages();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].1, Severity::Danger);
        assert!(notices[0].0.contains("locked"));
        assert_eq!(c.view().pulses(), vec![(t("T2"), Pulse::Error)]);
    }

    #[tokio::test]
    async fn test_transport_failure_restores_exact_position() {
        let c = controller(
            board(&[("A", &["T1", "T2", "T3", "T4"]), ("B", &[])]),
            MovePolicy::default(),
        );
        c.service.script_move(Scripted::Now(Err(BoardError::Transport("offline".into()))));

        let before = c.view().locate(&t("T3"));
        c.on_drag_start(&t("T3")).unwrap();
        let pending = c.on_drop(&l("A"), 0.0).unwrap();
        assert_eq!(c.view().order("A"), vec!["T3", "T1", "T2", "T4"]);

        c.commit_move(pending).await.unwrap_err();
        assert_eq!(c.view().locate(&t("T3")), before);
        assert_eq!(c.view().order("A"), vec!["T1", "T2", "T3", "T4"]);
        assert!(c.notifier.messages()[0].0.contains("connection error"));
    }

    #[test]
    fn test_cancel_leaves_board_untouched() {
        let c = controller(board(&[("A", &["T1", "T2"])]), MovePolicy::default());
        c.on_drag_start(&t("T1")).unwrap();
        let session = c.on_drag_cancel().unwrap();
        assert_eq!(session.source_index, 0);
        assert_eq!(c.view().order("A"), vec!["T1", "T2"]);
        assert!(!c.is_dragging());
        assert!(!c.view().drop_targets_active());
        assert!(c.service.moves_sent().is_empty());
    }

    #[test]
    fn test_drop_on_unknown_list_cancels() {
        let c = controller(board(&[("A", &["T1"])]), MovePolicy::default());
        c.on_drag_start(&t("T1")).unwrap();
        let err = c.on_drop(&l("Z"), 0.0).unwrap_err();
        assert_eq!(err, BoardError::UnknownList(l("Z")));
        assert!(!c.is_dragging());
        assert_eq!(c.view().order("A"), vec!["T1"]);
    }

    #[test]
    fn test_drag_errors() {
        let c = controller(board(&[("A", &["T1", "T2"])]), MovePolicy::default());
        assert!(matches!(c.on_drop(&l("A"), 0.0), Err(BoardError::Drag(_))));
        assert_eq!(
            c.on_drag_start(&t("nope")).unwrap_err(),
            BoardError::UnknownTask(t("nope"))
        );
        c.on_drag_start(&t("T1")).unwrap();
        assert!(matches!(c.on_drag_start(&t("T2")), Err(BoardError::Drag(_))));
    }

    #[tokio::test]
    async fn test_ignore_while_pending_refuses_second_drag() {
        let c = controller(board(&[("A", &["T1", "T2"])]), MovePolicy::IgnoreWhilePending);
        let (tx, rx) = oneshot::channel();
        c.service.script_move(Scripted::Later(rx));

        c.on_drag_start(&t("T1")).unwrap();
        let pending = c.on_drop(&l("A"), 1_000.0).unwrap();

        let (first, ()) = tokio::join!(c.commit_move(pending), async {
            assert!(c.has_move_in_flight(&t("T1")));
            assert_eq!(
                c.on_drag_start(&t("T1")).unwrap_err(),
                BoardError::MoveInFlight(t("T1"))
            );
            // Other tasks are unaffected
            c.on_drag_start(&t("T2")).unwrap();
            c.on_drag_cancel();
            tx.send(Ok(())).unwrap();
        });
        assert!(first.is_ok());
        assert!(!c.has_move_in_flight(&t("T1")));
        c.on_drag_start(&t("T1")).unwrap();
    }

    #[tokio::test]
    async fn test_discard_stale_drops_older_response() {
        let c = controller(board(&[("A", &["T1", "T2", "T3"])]), MovePolicy::DiscardStale);
        let (tx_first, rx_first) = oneshot::channel();
        let (tx_second, rx_second) = oneshot::channel();
        c.service.script_move(Scripted::Later(rx_first));
        c.service.script_move(Scripted::Later(rx_second));

        c.on_drag_start(&t("T1")).unwrap();
        let first = c.on_drop(&l("A"), 1_000.0).unwrap();
        c.on_drag_start(&t("T1")).unwrap();
        let second = c.on_drop(&l("A"), 50.0).unwrap();
        assert_eq!(c.view().order("A"), vec!["T2", "T1", "T3"]);

        let (first, second, ()) = tokio::join!(c.commit_move(first), c.commit_move(second), async {
            tx_second.send(Ok(())).unwrap();
            tokio::task::yield_now().await;
            // The older move fails late; its revert must not happen
            tx_first.send(Err(BoardError::Rejected("stale".into()))).unwrap();
        });

        assert!(matches!(second, Ok(MoveOutcome::Confirmed(_))));
        assert!(matches!(first, Ok(MoveOutcome::Superseded(_))));
        assert_eq!(c.view().order("A"), vec!["T2", "T1", "T3"]);
        assert!(c.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_last_write_wins_applies_every_response() {
        let c = controller(board(&[("A", &["T1", "T2", "T3"])]), MovePolicy::LastWriteWins);
        let (tx_first, rx_first) = oneshot::channel();
        c.service.script_move(Scripted::Later(rx_first));
        c.service.script_move(Scripted::Now(Ok(())));

        c.on_drag_start(&t("T1")).unwrap();
        let first = c.on_drop(&l("A"), 1_000.0).unwrap();
        c.on_drag_start(&t("T1")).unwrap();
        let second = c.on_drop(&l("A"), 50.0).unwrap();

        let (first, second, ()) = tokio::join!(c.commit_move(first), c.commit_move(second), async {
            tokio::task::yield_now().await;
            tx_first.send(Err(BoardError::Rejected("conflict".into()))).unwrap();
        });

        assert!(second.is_ok());
        assert!(first.is_err());
        // The late failure reverts to the first drag's source
        assert_eq!(c.view().order("A"), vec!["T1", "T2", "T3"]);
        assert_eq!(c.notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_title_sends_nothing() {
        let c = controller(board(&[("A", &["T1"])]), MovePolicy::default());
        let err = c.on_submit(&l("A"), "  ").await.unwrap_err();
        assert_eq!(err, BoardError::EmptyTitle);
        assert!(c.service.creates_sent().is_empty());
        assert_eq!(c.view().order("A"), vec!["T1"]);
        assert_eq!(c.view().focused_titles(), vec![l("A")]);
        assert!(c.view().busy_history().is_empty());
        assert!(c.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_quick_create_appends_and_clears() {
        let c = controller(board(&[("A", &["T1"])]), MovePolicy::default());
        c.service.script_create(Ok(Task {
            id: t("T9"),
            title: "Ship it".into(),
            priority_label: "Medium".into(),
            priority_color: "warning".into(),
            completed: false,
        }));

        let task = c.on_submit(&l("A"), "  Ship it ").await.unwrap();
        assert_eq!(task.id, t("T9"));
        assert_eq!(c.service.creates_sent(), vec![(l("A"), "Ship it".to_string())]);
        assert_eq!(c.view().order("A"), vec!["T1", "T9"]);
        assert_eq!(c.view().cleared_titles(), vec![l("A")]);
        assert_eq!(c.view().busy_history(), vec![(l("A"), true), (l("A"), false)]);
        assert_eq!(c.view().count("A"), Some(2));
        assert_eq!(c.notifier.messages(), vec![("Task created".to_string(), Severity::Success)]);
    }

    #[tokio::test]
    async fn test_quick_create_failure_keeps_list_and_reenables() {
        let c = controller(board(&[("A", &["T1"])]), MovePolicy::default());
        c.service.script_create(Err(BoardError::Status { status: 500 }));

        c.on_submit(&l("A"), "Ship it").await.unwrap_err();
        assert_eq!(c.view().order("A"), vec!["T1"]);
        assert!(c.view().cleared_titles().is_empty());
        assert_eq!(c.view().busy_history(), vec![(l("A"), true), (l("A"), false)]);
        let notices = c.notifier.messages();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].1, Severity::Danger);
    }

    #[tokio::test]
    async fn test_toggle_follows_server_state() {
        let c = controller(board(&[("A", &["T1"])]), MovePolicy::default());
        c.service.script_toggle(Ok(true));
        c.service.script_toggle(Ok(false));

        assert_eq!(c.on_toggle(&t("T1")).await, Ok(true));
        assert_eq!(c.view().completed(&t("T1")), Some(true));
        assert_eq!(c.on_toggle(&t("T1")).await, Ok(false));
        assert_eq!(c.view().completed(&t("T1")), Some(false));
    }

    #[tokio::test]
    async fn test_toggle_reports_true_twice_without_flipping_locally() {
        let c = controller(board(&[("A", &["T1"])]), MovePolicy::default());
        c.service.script_toggle(Ok(true));
        c.service.script_toggle(Ok(true));

        c.on_toggle(&t("T1")).await.unwrap();
        c.on_toggle(&t("T1")).await.unwrap();
        assert_eq!(c.view().completed(&t("T1")), Some(true));
    }

    #[tokio::test]
    async fn test_toggle_failure_leaves_state() {
        let c = controller(board(&[("A", &["T1"])]), MovePolicy::default());
        c.service.script_toggle(Ok(true));
        c.service.script_toggle(Err(BoardError::Transport("offline".into())));

        c.on_toggle(&t("T1")).await.unwrap();
        c.on_toggle(&t("T1")).await.unwrap_err();
        assert_eq!(c.view().completed(&t("T1")), Some(true));
        assert_eq!(c.notifier.messages().len(), 1);
        assert_eq!(c.notifier.messages()[0].1, Severity::Danger);
    }
}
