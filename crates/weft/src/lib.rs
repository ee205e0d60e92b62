#![forbid(unsafe_code)]

//! weft public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports the common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use weft_core::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};
pub use weft_core::geometry::{Position, Rect, Size};

// --- Render re-exports -----------------------------------------------------

pub use weft_render::cell::{Cell, Color, StyleFlags};
pub use weft_render::console::{Console, ConsoleOptions, CrosstermConsole, SurfaceChanged};
pub use weft_render::context::{ContextListener, DrawingContext, InvalidationHandle};
pub use weft_render::control::{Control, MouseListener, MouseTarget};
pub use weft_render::headless::VirtualConsole;
pub use weft_render::shadow::ShadowBuffer;

// --- Runtime re-exports ----------------------------------------------------

pub use weft_runtime::freeze::{FreezeGuard, FreezeLock};
pub use weft_runtime::{InputEvent, InputListener, Screen, dispatch};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for weft apps.
#[derive(Debug)]
pub enum Error {
    /// I/O failure during terminal operations.
    Io(std::io::Error),
    /// Terminal or compositor error with message.
    Terminal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Terminal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Terminal(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Convenient result alias for weft apps.
pub type Result<T> = std::result::Result<T, Error>;

/// The commonly-needed imports in one place.
pub mod prelude {
    pub use crate::{
        Cell, Color, ConsoleOptions, Control, CrosstermConsole, Event, InputEvent, InputListener,
        InvalidationHandle, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind,
        MouseListener, MouseTarget, Position, Rect, Screen, Size, StyleFlags,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_and_source() {
        let io = Error::from(std::io::Error::other("boom"));
        assert_eq!(io.to_string(), "boom");
        assert!(std::error::Error::source(&io).is_some());

        let terminal = Error::Terminal("no tty".into());
        assert_eq!(terminal.to_string(), "no tty");
        assert!(std::error::Error::source(&terminal).is_none());
    }
}
