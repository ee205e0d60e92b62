#![forbid(unsafe_code)]

//! Mouse-context transition machine.
//!
//! Raw absolute-position samples are resolved (elsewhere) into an optional
//! [`MouseTarget`]; this module synthesizes enter/leave/move semantics from
//! the delta between the previous and the new resolution.
//!
//! [`transition`] is a pure function from `(old, new)` to `(new, notices)`,
//! decoupled from both the resolution and the state mutation, so the
//! machine is testable without a live listener. It runs identically whether
//! the trigger was cursor movement or content changing shape under a
//! stationary cursor.
//!
//! # Invariants
//!
//! 1. A listener change always fires `Leave` (old) before `Enter` (new).
//! 2. `Enter` is always immediately followed by one `Move`, so a freshly
//!    entered listener knows the cursor position without waiting for a
//!    second sample.
//! 3. Re-resolving an unchanged target fires nothing.

use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;
use weft_core::geometry::Position;
use weft_render::control::{MouseListener, MouseTarget};

/// One pending listener callback.
pub enum MouseNotice {
    /// The cursor left this listener's region.
    Leave(Rc<dyn MouseListener>),
    /// The cursor entered this listener's region.
    Enter(Rc<dyn MouseListener>),
    /// The cursor moved to the given relative position.
    Move(Rc<dyn MouseListener>, Position),
    /// A button went down at the given relative position.
    Down(Rc<dyn MouseListener>, Position),
    /// A button came up at the given relative position.
    Up(Rc<dyn MouseListener>, Position),
}

impl MouseNotice {
    /// Invoke the corresponding listener callback.
    pub fn deliver(self) {
        match self {
            MouseNotice::Leave(listener) => listener.on_mouse_leave(),
            MouseNotice::Enter(listener) => listener.on_mouse_enter(),
            MouseNotice::Move(listener, position) => listener.on_mouse_move(position),
            MouseNotice::Down(listener, position) => listener.on_mouse_down(position),
            MouseNotice::Up(listener, position) => listener.on_mouse_up(position),
        }
    }
}

impl fmt::Debug for MouseNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseNotice::Leave(listener) => {
                f.debug_tuple("Leave").field(&Rc::as_ptr(listener)).finish()
            }
            MouseNotice::Enter(listener) => {
                f.debug_tuple("Enter").field(&Rc::as_ptr(listener)).finish()
            }
            MouseNotice::Move(listener, position) => f
                .debug_tuple("Move")
                .field(&Rc::as_ptr(listener))
                .field(position)
                .finish(),
            MouseNotice::Down(listener, position) => f
                .debug_tuple("Down")
                .field(&Rc::as_ptr(listener))
                .field(position)
                .finish(),
            MouseNotice::Up(listener, position) => f
                .debug_tuple("Up")
                .field(&Rc::as_ptr(listener))
                .field(position)
                .finish(),
        }
    }
}

/// The batch of notices one transition can produce: at most leave + enter +
/// move.
pub type NoticeBatch = SmallVec<[MouseNotice; 3]>;

/// Compute the state transition from the previously resolved target to a
/// freshly resolved one.
///
/// Returns the new state together with the callbacks to fire, in order.
/// The caller commits the state before delivering so reentrant
/// re-resolution observes a consistent machine.
pub fn transition(
    old: Option<&MouseTarget>,
    new: Option<MouseTarget>,
) -> (Option<MouseTarget>, NoticeBatch) {
    let mut notices = NoticeBatch::new();

    let same_listener = match (old, &new) {
        (Some(old), Some(new)) => old.same_listener(new),
        (None, None) => true,
        _ => false,
    };

    if !same_listener {
        if let Some(old) = old {
            notices.push(MouseNotice::Leave(old.listener.clone()));
        }
        if let Some(new) = &new {
            notices.push(MouseNotice::Enter(new.listener.clone()));
            notices.push(MouseNotice::Move(new.listener.clone(), new.position));
        }
    } else if let (Some(old), Some(new)) = (old, &new)
        && old.position != new.position
    {
        notices.push(MouseNotice::Move(new.listener.clone(), new.position));
    }

    (new, notices)
}
