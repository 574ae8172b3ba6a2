//! Touch gesture tracking.
//!
//! A touch on a card is only a drag once the finger has travelled past the
//! threshold on either axis; anything shorter stays a tap.

/// Movement threshold in device-independent pixels to start dragging
pub const DEFAULT_TOUCH_THRESHOLD_PX: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Result of feeding one touch-move into a gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureStep {
    /// Still within the threshold
    Pending,
    /// This move crossed the threshold
    Started,
    /// Already dragging
    Dragging,
}

/// One finger on one card
#[derive(Clone, Debug)]
pub struct TouchGesture<T> {
    task: T,
    origin: Point,
    threshold: f64,
    dragging: bool,
}

impl<T> TouchGesture<T> {
    pub fn new(task: T, origin: Point, threshold: f64) -> Self {
        Self { task, origin, threshold, dragging: false }
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn track(&mut self, point: Point) -> GestureStep {
        if self.dragging {
            return GestureStep::Dragging;
        }
        let dx = (point.x - self.origin.x).abs();
        let dy = (point.y - self.origin.y).abs();
        if dx > self.threshold || dy > self.threshold {
            self.dragging = true;
            GestureStep::Started
        } else {
            GestureStep::Pending
        }
    }
}
