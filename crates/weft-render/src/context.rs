#![forbid(unsafe_code)]

//! Drawing context: the virtual canvas a content tree renders into.
//!
//! A `DrawingContext` binds one content root to exactly one invalidation
//! listener. This is a deliberate single-subscriber observer, not an event
//! bus: the orchestrator is always the sole consumer of invalidation
//! notifications.
//!
//! Content holds a weak [`InvalidationHandle`] rather than the context
//! itself, so a context that has been replaced becomes inert: stale handles
//! fail to upgrade and their notifications go nowhere.

use crate::cell::Cell;
use crate::control::{Control, MouseTarget};
use std::cell::Cell as StateCell;
use std::fmt;
use std::rc::{Rc, Weak};
use weft_core::geometry::{Position, Rect, Size};

/// The single subscriber slot of a [`DrawingContext`].
///
/// Implemented by the orchestrator. Both notifications are dropped, not
/// buffered, while the orchestrator's freeze lock is engaged.
pub trait ContextListener {
    /// Everything may have changed.
    fn on_full_invalidate(&self);

    /// The given rectangle changed.
    fn on_partial_invalidate(&self, rect: Rect);
}

/// State shared between a context and the invalidation handles it issued.
struct ContextShared {
    listener: Weak<dyn ContextListener>,
    size: StateCell<Size>,
}

/// A content tree bound to an invalidation listener, exposed as an
/// indexable canvas of cells.
pub struct DrawingContext {
    content: Rc<dyn Control>,
    shared: Rc<ContextShared>,
}

impl DrawingContext {
    /// Bind `content` to `listener` and hand the content an invalidation
    /// handle.
    pub fn new(content: Rc<dyn Control>, listener: Weak<dyn ContextListener>) -> Self {
        let shared = Rc::new(ContextShared {
            listener,
            size: StateCell::new(Size::ZERO),
        });
        content.attach(InvalidationHandle {
            shared: Rc::downgrade(&shared),
        });
        Self { content, shared }
    }

    /// The size of the most recent arrangement.
    #[inline]
    pub fn size(&self) -> Size {
        self.shared.size.get()
    }

    /// Push layout constraints to the content and record the resulting
    /// size.
    ///
    /// Layout may fire intermediate invalidations through the handle while
    /// it recomputes geometry; callers that need atomicity freeze around
    /// this call and issue one explicit redraw afterwards.
    pub fn set_limits(&self, min: Size, max: Size) {
        let size = self.content.arrange(min, max);
        debug_assert!(
            size.width >= min.width
                && size.height >= min.height
                && size.width <= max.width
                && size.height <= max.height,
            "content arranged outside its constraints"
        );
        self.shared.size.set(size);
    }

    /// The cell the content renders at `position`.
    #[inline]
    pub fn cell_at(&self, position: Position) -> Cell {
        self.content.cell_at(position)
    }

    /// Resolve an absolute position against the content tree.
    #[inline]
    pub fn hit_test(&self, position: Position) -> Option<MouseTarget> {
        self.content.hit_test(position)
    }

    /// The bound content root.
    #[inline]
    pub fn content(&self) -> &Rc<dyn Control> {
        &self.content
    }
}

impl Drop for DrawingContext {
    fn drop(&mut self) {
        // Detach last so the content sees its handle die before the slot
        // is reused by a rebind.
        self.content.detach();
    }
}

impl fmt::Debug for DrawingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingContext")
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

/// A weak notification channel from content to the context's listener.
///
/// Cheap to clone; safe to hold across a context teardown (notifications
/// through a dead handle are dropped).
#[derive(Clone)]
pub struct InvalidationHandle {
    shared: Weak<ContextShared>,
}

impl InvalidationHandle {
    /// Notify the listener that everything may have changed.
    pub fn invalidate_all(&self) {
        if let Some(shared) = self.shared.upgrade()
            && let Some(listener) = shared.listener.upgrade()
        {
            listener.on_full_invalidate();
        }
    }

    /// Notify the listener that `rect` changed.
    pub fn invalidate(&self, rect: Rect) {
        if let Some(shared) = self.shared.upgrade()
            && let Some(listener) = shared.listener.upgrade()
        {
            listener.on_partial_invalidate(rect);
        }
    }

    /// Check whether the originating context is still alive.
    pub fn is_attached(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

impl fmt::Debug for InvalidationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        full: StateCell<u32>,
        partial: RefCell<Vec<Rect>>,
    }

    impl Recorder {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                full: StateCell::new(0),
                partial: RefCell::new(Vec::new()),
            })
        }
    }

    impl ContextListener for Recorder {
        fn on_full_invalidate(&self) {
            self.full.set(self.full.get() + 1);
        }

        fn on_partial_invalidate(&self, rect: Rect) {
            self.partial.borrow_mut().push(rect);
        }
    }

    struct Fixed {
        handle: RefCell<Option<InvalidationHandle>>,
    }

    impl Fixed {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                handle: RefCell::new(None),
            })
        }

        fn handle(&self) -> InvalidationHandle {
            self.handle.borrow().clone().expect("attached")
        }
    }

    impl Control for Fixed {
        fn arrange(&self, _min: Size, max: Size) -> Size {
            max
        }

        fn cell_at(&self, _position: Position) -> Cell {
            Cell::from_char('#')
        }

        fn attach(&self, surface: InvalidationHandle) {
            *self.handle.borrow_mut() = Some(surface);
        }

        fn detach(&self) {
            self.handle.borrow_mut().take();
        }
    }

    #[test]
    fn set_limits_records_size() {
        let listener = Recorder::new();
        let as_listener: Rc<dyn ContextListener> = listener.clone();
        let content = Fixed::new();
        let context = DrawingContext::new(content, Rc::downgrade(&as_listener));

        assert_eq!(context.size(), Size::ZERO);
        context.set_limits(Size::new(10, 4), Size::new(10, 4));
        assert_eq!(context.size(), Size::new(10, 4));
        assert_eq!(context.cell_at(Position::ORIGIN), Cell::from_char('#'));
    }

    #[test]
    fn handle_forwards_to_single_listener() {
        let listener = Recorder::new();
        let as_listener: Rc<dyn ContextListener> = listener.clone();
        let content = Fixed::new();
        let _context = DrawingContext::new(content.clone(), Rc::downgrade(&as_listener));

        let handle = content.handle();
        assert!(handle.is_attached());

        handle.invalidate_all();
        handle.invalidate(Rect::new(1, 2, 3, 4));

        assert_eq!(listener.full.get(), 1);
        assert_eq!(*listener.partial.borrow(), vec![Rect::new(1, 2, 3, 4)]);
    }

    #[test]
    fn dropped_context_detaches_content_and_deadens_handles() {
        let listener = Recorder::new();
        let as_listener: Rc<dyn ContextListener> = listener.clone();
        let content = Fixed::new();
        let context = DrawingContext::new(content.clone(), Rc::downgrade(&as_listener));

        let handle = content.handle();
        drop(context);

        // Content was told to let go of its handle.
        assert!(content.handle.borrow().is_none());

        // The clone we kept is now inert.
        assert!(!handle.is_attached());
        handle.invalidate_all();
        handle.invalidate(Rect::new(0, 0, 1, 1));
        assert_eq!(listener.full.get(), 0);
        assert!(listener.partial.borrow().is_empty());
    }

    #[test]
    fn dead_listener_is_ignored() {
        let content = Fixed::new();
        let context = {
            let listener = Recorder::new();
            let as_listener: Rc<dyn ContextListener> = listener;
            DrawingContext::new(content.clone(), Rc::downgrade(&as_listener))
            // listener dropped here
        };

        // No panic, nothing to notify.
        content.handle().invalidate_all();
        drop(context);
    }
}
