#![forbid(unsafe_code)]

//! Physical console boundary.
//!
//! The [`Console`] trait is the seam between the compositor core and the
//! terminal driver. The core only ever needs: the window size, a way to
//! reset driver state, non-blocking key reads, positioned cell writes, and
//! refresh batching hints.
//!
//! # Error contract
//!
//! Exactly one error crosses this boundary: [`SurfaceChanged`], returned by
//! [`Console::write`] when the terminal's shape changed since the last size
//! read. It is recoverable; the update loop re-clips and continues. All
//! other driver-level I/O failures are the implementation's responsibility
//! to define — [`CrosstermConsole`] logs and swallows them, since a dead
//! tty fails every subsequent call anyway and the host loop owns process
//! exit.
//!
//! # Cleanup Order
//!
//! [`CrosstermConsole`] restores terminal state on drop, in reverse order
//! of enabling:
//! 1. Show cursor (if hidden)
//! 2. Disable mouse capture (if enabled)
//! 3. Leave alternate screen (if entered)
//! 4. Exit raw mode
//! 5. Flush stdout
//!
//! The same restoration runs from a panic hook and, on unix, from a
//! SIGINT/SIGTERM handler thread.

use crate::cell::{Cell, Color, StyleFlags};
use std::cell::Cell as StateCell;
use std::fmt;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use weft_core::event::{Event, KeyEvent};
use weft_core::geometry::{Position, Size};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::style::{
    Attribute, Attributes, Print, SetAttribute, SetAttributes, SetBackgroundColor,
    SetForegroundColor,
};
use crossterm::terminal::{
    BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen,
    LeaveAlternateScreen, SetSize, disable_raw_mode, enable_raw_mode,
};
use crossterm::{execute, queue};

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// The terminal surface changed shape since the last size read.
///
/// A transient, recoverable condition: the caller re-reads the size,
/// re-clips its remaining work, and continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceChanged;

impl fmt::Display for SurfaceChanged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "terminal surface changed shape during a write")
    }
}

impl std::error::Error for SurfaceChanged {}

/// The physical terminal boundary consumed by the compositor.
pub trait Console {
    /// The terminal's current window size.
    fn size(&self) -> Size;

    /// Request the terminal resize its window.
    fn set_size(&mut self, size: Size);

    /// Reset driver state (cursor, modes, visible contents). Called by the
    /// compositor at every re-initialization.
    fn initialize(&mut self);

    /// Check whether a key event is ready without blocking.
    fn key_available(&self) -> bool;

    /// Read the next available key event without blocking.
    ///
    /// Returns `None` when nothing is ready or the raw event has no
    /// canonical key representation.
    fn read_key(&mut self) -> Option<KeyEvent>;

    /// Draw one cell at an absolute position.
    ///
    /// # Errors
    ///
    /// [`SurfaceChanged`] if the terminal's shape changed since the last
    /// size read; the write did not happen.
    fn write(&mut self, position: Position, cell: &Cell) -> Result<(), SurfaceChanged>;

    /// A refresh cycle is starting; the driver may open a write batch.
    fn on_refresh_start(&mut self) {}

    /// The refresh cycle finished; the driver should close the batch and
    /// make the writes visible.
    fn on_refresh_end(&mut self) {}
}

/// Terminal mode configuration for [`CrosstermConsole`].
///
/// Raw mode is always entered; these options control the rest. All default
/// to `false` for maximum portability.
#[derive(Debug, Clone, Default)]
pub struct ConsoleOptions {
    /// Switch to the alternate screen buffer, preserving scrollback.
    pub alternate_screen: bool,

    /// Capture mouse events (SGR encoding).
    pub mouse_capture: bool,

    /// Hide the cursor while the console is alive.
    pub hide_cursor: bool,
}

impl ConsoleOptions {
    /// The usual full-screen application setup: alternate screen, mouse
    /// capture, hidden cursor.
    #[must_use]
    pub const fn fullscreen() -> Self {
        Self {
            alternate_screen: true,
            mouse_capture: true,
            hide_cursor: true,
        }
    }
}

/// Crossterm-backed console driver.
///
/// # Contract
///
/// Only one `CrosstermConsole` should exist at a time; it assumes exclusive
/// ownership of the controlling terminal.
#[derive(Debug)]
pub struct CrosstermConsole {
    options: ConsoleOptions,
    out: io::Stdout,
    /// Window size as of the last successful probe; the bound `write`
    /// checks against.
    size: StateCell<Size>,
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
    mouse_enabled: bool,
    cursor_hidden: bool,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl CrosstermConsole {
    /// Create a console over stdout.
    ///
    /// No terminal modes are touched until [`Console::initialize`] runs.
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal size cannot be read (no
    /// controlling tty).
    pub fn new(options: ConsoleOptions) -> io::Result<Self> {
        let (width, height) = crossterm::terminal::size()?;
        Ok(Self {
            options,
            out: io::stdout(),
            size: StateCell::new(Size::new(width, height)),
            raw_mode_enabled: false,
            alternate_screen_enabled: false,
            mouse_enabled: false,
            cursor_hidden: false,
            #[cfg(unix)]
            signal_guard: None,
        })
    }

    /// Re-read the window size from the terminal, falling back to the last
    /// known value when the probe fails.
    fn probe_size(&self) -> Size {
        match crossterm::terminal::size() {
            Ok((width, height)) => {
                let size = Size::new(width, height);
                self.size.set(size);
                size
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "terminal size probe failed");
                self.size.get()
            }
        }
    }

    fn try_initialize(&mut self) -> io::Result<()> {
        install_panic_hook();

        if !self.raw_mode_enabled {
            enable_raw_mode()?;
            self.raw_mode_enabled = true;
        }

        if self.options.alternate_screen && !self.alternate_screen_enabled {
            execute!(self.out, EnterAlternateScreen)?;
            self.alternate_screen_enabled = true;
        }

        if self.options.mouse_capture && !self.mouse_enabled {
            execute!(self.out, EnableMouseCapture)?;
            self.mouse_enabled = true;
        }

        if self.options.hide_cursor && !self.cursor_hidden {
            execute!(self.out, Hide)?;
            self.cursor_hidden = true;
        }

        #[cfg(unix)]
        if self.signal_guard.is_none() {
            self.signal_guard = Some(SignalGuard::new()?);
        }

        execute!(
            self.out,
            SetAttribute(Attribute::Reset),
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        self.probe_size();
        Ok(())
    }

    /// Cleanup helper (shared between drop and explicit cleanup).
    fn cleanup(&mut self) {
        #[cfg(unix)]
        let _ = self.signal_guard.take();

        // Disable features in reverse order of enabling
        if self.cursor_hidden {
            let _ = execute!(self.out, Show);
            self.cursor_hidden = false;
        }

        if self.mouse_enabled {
            let _ = execute!(self.out, DisableMouseCapture);
            self.mouse_enabled = false;
        }

        if self.alternate_screen_enabled {
            let _ = execute!(self.out, LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
        }

        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
            self.raw_mode_enabled = false;
        }

        let _ = self.out.flush();
    }
}

impl Console for CrosstermConsole {
    fn size(&self) -> Size {
        self.probe_size()
    }

    fn set_size(&mut self, size: Size) {
        if let Err(_err) = execute!(self.out, SetSize(size.width, size.height)) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "terminal resize request failed");
        }
        self.size.set(size);
    }

    fn initialize(&mut self) {
        if let Err(_err) = self.try_initialize() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "console initialization failed");
        }
    }

    fn key_available(&self) -> bool {
        crossterm::event::poll(Duration::ZERO).unwrap_or(false)
    }

    fn read_key(&mut self) -> Option<KeyEvent> {
        if !crossterm::event::poll(Duration::ZERO).unwrap_or(false) {
            return None;
        }
        let raw = crossterm::event::read().ok()?;
        match Event::from_crossterm(raw) {
            Some(Event::Key(key)) => Some(key),
            // Mouse motion and resizes are consumed here but routed by the
            // host loop, not the key path.
            _ => None,
        }
    }

    fn write(&mut self, position: Position, cell: &Cell) -> Result<(), SurfaceChanged> {
        if !self.size.get().contains(position) {
            self.probe_size();
            return Err(SurfaceChanged);
        }

        // Zero-width content still owns its cell on screen.
        let ch = if cell.width() == 0 { ' ' } else { cell.ch };

        let result = queue!(
            self.out,
            MoveTo(position.x, position.y),
            SetAttribute(Attribute::Reset),
            SetAttributes(style_attributes(cell.flags)),
            SetForegroundColor(style_color(cell.fg)),
            SetBackgroundColor(style_color(cell.bg)),
            Print(ch)
        );
        if let Err(_err) = result {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, x = position.x, y = position.y, "cell write failed");
        }
        Ok(())
    }

    fn on_refresh_start(&mut self) {
        self.probe_size();
        let _ = queue!(self.out, BeginSynchronizedUpdate);
    }

    fn on_refresh_end(&mut self) {
        let _ = queue!(self.out, EndSynchronizedUpdate);
        let _ = self.out.flush();
    }
}

impl Drop for CrosstermConsole {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn style_color(color: Color) -> crossterm::style::Color {
    match color {
        Color::Default => crossterm::style::Color::Reset,
        Color::Ansi(index) => crossterm::style::Color::AnsiValue(index),
        Color::Rgb(r, g, b) => crossterm::style::Color::Rgb { r, g, b },
    }
}

fn style_attributes(flags: StyleFlags) -> Attributes {
    let mut attrs = Attributes::default();
    if flags.contains(StyleFlags::BOLD) {
        attrs = attrs.with(Attribute::Bold);
    }
    if flags.contains(StyleFlags::DIM) {
        attrs = attrs.with(Attribute::Dim);
    }
    if flags.contains(StyleFlags::ITALIC) {
        attrs = attrs.with(Attribute::Italic);
    }
    if flags.contains(StyleFlags::UNDERLINE) {
        attrs = attrs.with(Attribute::Underlined);
    }
    if flags.contains(StyleFlags::REVERSE) {
        attrs = attrs.with(Attribute::Reverse);
    }
    if flags.contains(StyleFlags::STRIKETHROUGH) {
        attrs = attrs.with(Attribute::CrossedOut);
    }
    attrs
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();

    let _ = execute!(stdout, Show);
    let _ = execute!(stdout, DisableMouseCapture);
    let _ = execute!(stdout, LeaveAlternateScreen);
    let _ = disable_raw_mode();
    let _ = stdout.flush();
}

#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new() -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::spawn(move || {
            for signal in signals.forever() {
                if matches!(signal, SIGINT | SIGTERM) {
                    best_effort_cleanup();
                    std::process::exit(128 + signal);
                }
            }
        });
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
