#![forbid(unsafe_code)]

//! The screen orchestrator.
//!
//! `Screen` wires the pieces together: it owns the shadow buffer and the
//! current drawing context, drives the diff/flush update loop against the
//! physical console, and routes keyboard and mouse input to content
//! listeners.
//!
//! # Call model
//!
//! Single-threaded, synchronous, run-to-completion. `Screen` lives behind
//! an `Rc` because it is simultaneously the public API object and the
//! drawing context's invalidation listener; interior mutability replaces
//! `&mut` receivers. Listener callbacks fire only while the screen holds no
//! internal borrows, so a callback may mutate content and trigger a nested
//! synchronous update: cells already visited in an outer pass stay valid,
//! and cells changed mid-pass surface in the next update.
//!
//! # Invariants
//!
//! 1. The shadow buffer's size equals the console's size immediately after
//!    any resize; it is the authoritative record of what is on screen.
//! 2. The drawing context's size equals the shadow buffer's size: content
//!    exactly fills the canvas, never overflows or underflows it.
//! 3. The resolved mouse target always reflects the latest position sample
//!    against the latest layout.

use crate::freeze::FreezeLock;
use crate::input::{self, InputEvent, InputListener};
use crate::mouse;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, trace};
use weft_core::geometry::{Position, Rect, Size};
use weft_render::console::Console;
use weft_render::context::{ContextListener, DrawingContext};
use weft_render::control::{Control, MouseTarget};
use weft_render::shadow::ShadowBuffer;

/// Orchestrator for one terminal session.
pub struct Screen {
    console: RefCell<Box<dyn Console>>,
    buffer: RefCell<ShadowBuffer>,
    context: RefCell<Option<DrawingContext>>,
    content: RefCell<Option<Rc<dyn Control>>>,
    freeze: FreezeLock,
    mouse_position: Cell<Option<Position>>,
    mouse_down: Cell<bool>,
    mouse_target: RefCell<Option<MouseTarget>>,
}

impl Screen {
    /// Create a screen over the given console.
    ///
    /// The shadow buffer adopts the console's current window size. No
    /// content is bound yet; [`set_content`](Self::set_content) completes
    /// the wiring.
    pub fn new(console: Box<dyn Console>) -> Rc<Self> {
        let size = console.size();
        Rc::new(Self {
            console: RefCell::new(console),
            buffer: RefCell::new(ShadowBuffer::new(size)),
            context: RefCell::new(None),
            content: RefCell::new(None),
            freeze: FreezeLock::new(),
            mouse_position: Cell::new(None),
            mouse_down: Cell::new(false),
            mouse_target: RefCell::new(None),
        })
    }

    /// The console's current window size.
    pub fn window_size(&self) -> Size {
        self.console.borrow().size()
    }

    /// The shadow buffer's current size.
    pub fn buffer_size(&self) -> Size {
        self.buffer.borrow().size()
    }

    /// The currently bound content root, if any.
    pub fn content(&self) -> Option<Rc<dyn Control>> {
        self.content.borrow().clone()
    }

    /// Replace the root of the renderable tree.
    ///
    /// Drops the prior drawing context (detaching its content) before
    /// constructing the new one, then re-initializes. Rebinding the same
    /// content is valid and still re-initializes; that path is documented,
    /// not optimized.
    pub fn set_content(self: &Rc<Self>, content: Rc<dyn Control>) {
        // Dispose-before-rebind: the old context must release its content
        // before the same content can be attached to a fresh context.
        self.context.borrow_mut().take();

        *self.content.borrow_mut() = Some(Rc::clone(&content));
        let listener: Rc<dyn ContextListener> = self.clone();
        let context = DrawingContext::new(content, Rc::downgrade(&listener));
        *self.context.borrow_mut() = Some(context);

        self.initialize();
    }

    /// Swap the physical console boundary and re-initialize against it.
    pub fn set_console(&self, console: Box<dyn Console>) {
        *self.console.borrow_mut() = console;
        self.initialize();
    }

    /// Adopt the console's current window size.
    ///
    /// The canonical first call after construction and content binding.
    pub fn setup(&self) {
        self.resize(self.window_size());
    }

    /// Set the console's size, re-allocate the shadow buffer to match, and
    /// re-initialize.
    pub fn resize(&self, size: Size) {
        debug!(width = size.width, height = size.height, "resize");
        self.console.borrow_mut().set_size(size);
        self.buffer.borrow_mut().resize(size);
        self.initialize();
    }

    /// If the buffer no longer matches the window, resize the buffer to the
    /// window. Call after an external window-size change.
    pub fn adjust_buffer_to_window(&self) {
        if self.window_size() != self.buffer_size() {
            self.resize(self.window_size());
        }
    }

    /// Inverse of [`adjust_buffer_to_window`](Self::adjust_buffer_to_window):
    /// ask the console to grow or shrink to the buffer's size. Call when
    /// content wants a fixed canvas.
    pub fn adjust_window_to_buffer(&self) {
        if self.window_size() != self.buffer_size() {
            self.resize(self.buffer_size());
        }
    }

    /// Full re-initialization: reset the console, forget the shadow state,
    /// lay content out to exactly fill the canvas, and repaint once.
    ///
    /// Layout may fire intermediate invalidations while it recomputes
    /// geometry; those are meaningless until layout settles, so the layout
    /// step runs under the freeze lock and a single authoritative redraw
    /// follows the unfreeze. The lock itself never triggers a catch-up;
    /// this method is the one place that pairs a guarded mutation with its
    /// explicit redraw.
    fn initialize(&self) {
        let size = self.buffer_size();
        debug!(width = size.width, height = size.height, "initialize");

        self.console.borrow_mut().initialize();
        self.buffer.borrow_mut().clear();

        {
            let _guard = self.freeze.guard();
            if let Some(context) = self.context.borrow().as_ref() {
                context.set_limits(size, size);
            }
        }

        self.redraw();
        // Layout may have moved regions under a stationary cursor.
        self.refresh_mouse_target();
    }

    /// Update the rectangle covering the entire current content size.
    pub fn redraw(&self) {
        let size = self
            .context
            .borrow()
            .as_ref()
            .map(DrawingContext::size)
            .unwrap_or(Size::ZERO);
        self.update(Rect::from_size(size));
    }

    /// Diff-and-flush `rect`: write every cell within it whose content
    /// differs from the shadow buffer's record, and nothing else.
    ///
    /// The rect is clipped to the shadow buffer's bounds and to the
    /// console's current window bounds. A write failing with a transient
    /// surface change re-clips the remaining iteration to the console's
    /// now-current bounds and continues; it never aborts the pass. After a
    /// pass over the full content rectangle, the shadow buffer exactly
    /// mirrors the visible screen.
    pub fn update(&self, rect: Rect) {
        let context_ref = self.context.borrow();
        let Some(context) = context_ref.as_ref() else {
            return;
        };
        let mut console = self.console.borrow_mut();
        let mut buffer = self.buffer.borrow_mut();

        console.on_refresh_start();

        let mut clip = rect.intersection(&buffer.bounds());
        clip = clip.intersection(&Rect::from_size(console.size()));

        let mut writes = 0u32;
        let mut y = clip.top();
        // The clip bounds are re-read every step so a mid-loop re-clip
        // takes effect immediately.
        while y < clip.bottom() {
            let mut x = clip.left();
            while x < clip.right() {
                let position = Position::new(x, y);
                let cell = context.cell_at(position);
                if buffer.update(position, cell) {
                    match console.write(position, &cell) {
                        Ok(()) => writes += 1,
                        Err(_) => {
                            // The window changed shape mid-pass; shrink the
                            // remaining work to what is still visible.
                            clip = clip.intersection(&Rect::from_size(console.size()));
                        }
                    }
                }
                x += 1;
            }
            y += 1;
        }

        console.on_refresh_end();
        trace!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            writes,
            "update"
        );
    }

    /// Drain all currently available key events and dispatch each through
    /// `listeners` in slice order, stopping at the first listener that
    /// marks it handled.
    ///
    /// Non-blocking: returns as soon as the console reports no more input.
    /// Dispatch order is the caller's order; any topmost-first policy
    /// belongs to whoever builds the slice.
    pub fn read_input(&self, listeners: &[Rc<dyn InputListener>]) {
        loop {
            let key = {
                let mut console = self.console.borrow_mut();
                if !console.key_available() {
                    break;
                }
                console.read_key()
            };
            // A drained event without a canonical key mapping is skipped,
            // not a reason to stop draining.
            let Some(key) = key else {
                continue;
            };

            trace!(?key, "dispatch key");
            let mut event = InputEvent::new(key);
            input::dispatch(listeners, &mut event);
        }
    }

    /// Update the tracked cursor position (`None` = untracked) and
    /// re-resolve the mouse target, synthesizing enter/move/leave
    /// callbacks from the delta.
    pub fn set_mouse_position(&self, position: Option<Position>) {
        self.mouse_position.set(position);
        self.refresh_mouse_target();
    }

    /// Update the tracked button state. An actual change while a target is
    /// resolved synthesizes a down or up callback at the target's relative
    /// position.
    pub fn set_mouse_button(&self, down: bool) {
        let was_down = self.mouse_down.get();
        if was_down != down {
            let target = self.mouse_target.borrow().clone();
            if let Some(target) = target {
                let notice = if down {
                    mouse::MouseNotice::Down(target.listener, target.position)
                } else {
                    mouse::MouseNotice::Up(target.listener, target.position)
                };
                notice.deliver();
            }
        }
        self.mouse_down.set(down);
    }

    /// Resolve the tracked position against the current layout and run the
    /// transition machine.
    ///
    /// The new target is committed before any callback fires, so reentrant
    /// re-resolution from inside a callback observes consistent state and
    /// terminates (an unchanged resolution fires nothing).
    fn refresh_mouse_target(&self) {
        let resolved = match (self.mouse_position.get(), self.context.borrow().as_ref()) {
            (Some(position), Some(context)) => context.hit_test(position),
            _ => None,
        };

        let old = self.mouse_target.borrow().clone();
        let (new, notices) = mouse::transition(old.as_ref(), resolved);
        *self.mouse_target.borrow_mut() = new;

        for notice in notices {
            notice.deliver();
        }
    }
}

impl ContextListener for Screen {
    fn on_full_invalidate(&self) {
        if self.freeze.is_frozen() {
            return;
        }
        self.redraw();
        self.refresh_mouse_target();
    }

    fn on_partial_invalidate(&self, rect: Rect) {
        if self.freeze.is_frozen() {
            return;
        }
        self.update(rect);
        self.refresh_mouse_target();
    }
}
