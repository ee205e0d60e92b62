#![forbid(unsafe_code)]

//! Keyboard input dispatch.
//!
//! Each raw key is wrapped in an [`InputEvent`] carrying a `handled` flag
//! and offered to an ordered collection of listeners. The first listener to
//! mark the event handled stops propagation.
//!
//! The collection order IS the dispatch order. If an application wants
//! topmost-control-first semantics, whatever builds the listener slice is
//! responsible for that ordering; this module imposes no policy.

use std::rc::Rc;
use weft_core::event::KeyEvent;

/// One key event in flight through the listener chain.
#[derive(Debug, Clone)]
pub struct InputEvent {
    key: KeyEvent,
    handled: bool,
}

impl InputEvent {
    /// Wrap a raw key event, initially unhandled.
    #[must_use]
    pub const fn new(key: KeyEvent) -> Self {
        Self {
            key,
            handled: false,
        }
    }

    /// The wrapped key.
    #[inline]
    pub const fn key(&self) -> KeyEvent {
        self.key
    }

    /// Check whether a listener already consumed this event.
    #[inline]
    pub const fn is_handled(&self) -> bool {
        self.handled
    }

    /// Consume the event, stopping further propagation.
    #[inline]
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }
}

/// A keyboard listener.
pub trait InputListener {
    /// Inspect the event; call [`InputEvent::mark_handled`] to consume it.
    fn on_input(&self, event: &mut InputEvent);
}

/// Offer `event` to each listener in order until one marks it handled.
pub fn dispatch(listeners: &[Rc<dyn InputListener>], event: &mut InputEvent) {
    for listener in listeners {
        listener.on_input(event);
        if event.is_handled() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use weft_core::event::{KeyCode, KeyEvent};

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
        consume: bool,
    }

    impl InputListener for Recorder {
        fn on_input(&self, event: &mut InputEvent) {
            self.log.borrow_mut().push(self.name);
            if self.consume {
                event.mark_handled();
            }
        }
    }

    fn listener(
        name: &'static str,
        log: &Rc<RefCell<Vec<&'static str>>>,
        consume: bool,
    ) -> Rc<dyn InputListener> {
        Rc::new(Recorder {
            name,
            log: log.clone(),
            consume,
        })
    }

    #[test]
    fn unhandled_event_reaches_all_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = [
            listener("a", &log, false),
            listener("b", &log, false),
            listener("c", &log, false),
        ];

        let mut event = InputEvent::new(KeyEvent::new(KeyCode::Enter));
        dispatch(&listeners, &mut event);

        assert!(!event.is_handled());
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn handling_short_circuits() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = [
            listener("a", &log, true),
            listener("b", &log, false),
            listener("c", &log, false),
        ];

        let mut event = InputEvent::new(KeyEvent::new(KeyCode::Escape));
        dispatch(&listeners, &mut event);

        assert!(event.is_handled());
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn mid_chain_handler_stops_tail() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = [
            listener("a", &log, false),
            listener("b", &log, true),
            listener("c", &log, false),
        ];

        let mut event = InputEvent::new(KeyEvent::new(KeyCode::Tab));
        dispatch(&listeners, &mut event);

        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn event_exposes_wrapped_key() {
        let event = InputEvent::new(KeyEvent::new(KeyCode::Char('z')));
        assert!(event.key().is_char('z'));
        assert!(!event.is_handled());
    }
}
