#![forbid(unsafe_code)]

//! Content-tree traits.
//!
//! The compositor is polymorphic over one capability pair: render a cell at
//! a position under a size constraint, and resolve a position to the mouse
//! listener owning that region. Everything else about the content tree
//! (layout, widgets, styling) lives outside this crate.
//!
//! All listener methods take `&self`: the call model is single-threaded and
//! synchronous, so implementors keep their own state behind `Cell`/`RefCell`.

use crate::cell::Cell;
use crate::context::InvalidationHandle;
use std::fmt;
use std::rc::Rc;
use weft_core::geometry::{Position, Size};

/// A mouse listener owning some screen region.
///
/// All positions passed to these callbacks are relative to the listener's
/// own origin. Default implementations ignore the event, so implementors
/// override only what they care about.
pub trait MouseListener {
    /// The cursor entered this listener's region.
    fn on_mouse_enter(&self) {}

    /// The cursor moved within this listener's region.
    fn on_mouse_move(&self, _position: Position) {}

    /// The cursor left this listener's region.
    fn on_mouse_leave(&self) {}

    /// A button was pressed over this listener's region.
    fn on_mouse_down(&self, _position: Position) {}

    /// A button was released over this listener's region.
    fn on_mouse_up(&self, _position: Position) {}
}

/// The resolution of an absolute cursor position: the listener owning that
/// region, and the position relative to the listener's origin.
#[derive(Clone)]
pub struct MouseTarget {
    /// The listener owning the region under the cursor.
    pub listener: Rc<dyn MouseListener>,
    /// Cursor position relative to the listener's origin.
    pub position: Position,
}

impl MouseTarget {
    /// Create a new target.
    pub fn new(listener: Rc<dyn MouseListener>, position: Position) -> Self {
        Self { listener, position }
    }

    /// Check whether two targets resolve to the same listener.
    ///
    /// Identity, not equality: two distinct listeners of the same type are
    /// different targets.
    #[inline]
    pub fn same_listener(&self, other: &MouseTarget) -> bool {
        Rc::ptr_eq(&self.listener, &other.listener)
    }
}

impl fmt::Debug for MouseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MouseTarget")
            .field("listener", &Rc::as_ptr(&self.listener))
            .field("position", &self.position)
            .finish()
    }
}

/// The root of a renderable content tree.
pub trait Control {
    /// Lay the content out within the given constraints and return the size
    /// it occupies.
    ///
    /// The compositor always passes `min == max` (the canvas size): content
    /// exactly fills the drawing surface, with no scrolling or overflow.
    fn arrange(&self, min: Size, max: Size) -> Size;

    /// The cell this content renders at `position` under the most recent
    /// arrangement.
    ///
    /// Must not mutate content state or fire invalidations; it is called
    /// from inside the update loop.
    fn cell_at(&self, position: Position) -> Cell;

    /// Resolve an absolute position to the mouse listener owning that
    /// region, if any.
    fn hit_test(&self, _position: Position) -> Option<MouseTarget> {
        None
    }

    /// Receive the invalidation handle for the drawing context this content
    /// was just bound to. Mutating content should hold on to it and call
    /// [`InvalidationHandle::invalidate`] after changes.
    fn attach(&self, _surface: InvalidationHandle) {}

    /// The drawing context is being torn down; drop any stored handle.
    fn detach(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quiet;
    impl MouseListener for Quiet {}

    #[test]
    fn same_listener_is_identity() {
        let a: Rc<dyn MouseListener> = Rc::new(Quiet);
        let b: Rc<dyn MouseListener> = Rc::new(Quiet);

        let at_a = MouseTarget::new(a.clone(), Position::new(1, 1));
        let also_a = MouseTarget::new(a, Position::new(2, 2));
        let at_b = MouseTarget::new(b, Position::new(1, 1));

        assert!(at_a.same_listener(&also_a));
        assert!(!at_a.same_listener(&at_b));
    }
}
