//! Drop position math and list reordering.

/// Vertical extent of a sibling card
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

impl From<&web_sys::DomRect> for Bounds {
    fn from(rect: &web_sys::DomRect) -> Self {
        Self::new(rect.top(), rect.height())
    }
}

/// Index at which a card dropped at `pointer_y` lands.
///
/// `siblings` are the destination's cards in DOM order, without the card
/// being dragged. The first sibling whose midpoint lies below the pointer
/// wins; if none does the card goes last.
pub fn drop_index(pointer_y: f64, siblings: &[Bounds]) -> usize {
    siblings
        .iter()
        .position(|bounds| pointer_y < bounds.midpoint())
        .unwrap_or(siblings.len())
}

pub fn index_of<T: PartialEq>(order: &[T], item: &T) -> Option<usize> {
    order.iter().position(|x| x == item)
}

/// Move `item` to `index` among the other entries of `order`, inserting it
/// if absent. Out-of-range indexes append. Returns the final index.
pub fn place<T: PartialEq>(order: &mut Vec<T>, item: T, index: usize) -> usize {
    if let Some(current) = index_of(order, &item) {
        order.remove(current);
    }
    let at = index.min(order.len());
    order.insert(at, item);
    at
}
