#![forbid(unsafe_code)]

//! Headless console for deterministic tests.
//!
//! `VirtualConsole` is a minimal in-memory stand-in for a terminal: a cell
//! grid, a scripted key queue, and journals of every write and refresh the
//! compositor performs. It is NOT a terminal emulator; it understands
//! nothing but the [`Console`] contract.
//!
//! The console is a cheap clonable handle over shared state, so a test can
//! keep one clone for inspection after boxing another into the compositor:
//!
//! ```
//! use weft_core::geometry::Size;
//! use weft_render::headless::VirtualConsole;
//!
//! let console = VirtualConsole::new(Size::new(10, 4));
//! let probe = console.clone();
//! // box `console` into the orchestrator, inspect through `probe`
//! assert_eq!(probe.write_count(), 0);
//! ```

use crate::cell::Cell;
use crate::console::{Console, SurfaceChanged};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use weft_core::event::KeyEvent;
use weft_core::geometry::{Position, Size};

#[derive(Debug)]
struct VirtualState {
    size: Size,
    cells: Vec<Option<Cell>>,
    keys: VecDeque<KeyEvent>,
    writes: Vec<(Position, Cell)>,
    refreshes: u32,
    initializations: u32,
    /// Scripted mid-update shrink: once the write journal reaches the given
    /// length, the window snaps to the given size and the triggering write
    /// fails with `SurfaceChanged`.
    pending_shrink: Option<(usize, Size)>,
}

impl VirtualState {
    fn index(&self, position: Position) -> Option<usize> {
        if self.size.contains(position) {
            Some(position.y as usize * self.size.width as usize + position.x as usize)
        } else {
            None
        }
    }

    fn reallocate(&mut self, size: Size) {
        self.size = size;
        self.cells.clear();
        self.cells.resize(size.area() as usize, None);
    }
}

/// An in-memory console double with write/refresh journals.
#[derive(Debug, Clone)]
pub struct VirtualConsole {
    state: Rc<RefCell<VirtualState>>,
}

impl VirtualConsole {
    /// Create a console reporting the given window size.
    pub fn new(size: Size) -> Self {
        Self {
            state: Rc::new(RefCell::new(VirtualState {
                size,
                cells: vec![None; size.area() as usize],
                keys: VecDeque::new(),
                writes: Vec::new(),
                refreshes: 0,
                initializations: 0,
                pending_shrink: None,
            })),
        }
    }

    /// Queue a key for [`Console::read_key`] to drain.
    pub fn push_key(&self, key: KeyEvent) {
        self.state.borrow_mut().keys.push_back(key);
    }

    /// Number of cell writes since construction or the last
    /// [`take_writes`](Self::take_writes).
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes.len()
    }

    /// Drain and return the write journal.
    pub fn take_writes(&self) -> Vec<(Position, Cell)> {
        std::mem::take(&mut self.state.borrow_mut().writes)
    }

    /// Number of refresh cycles started.
    pub fn refresh_count(&self) -> u32 {
        self.state.borrow().refreshes
    }

    /// Number of driver initializations.
    pub fn initialization_count(&self) -> u32 {
        self.state.borrow().initializations
    }

    /// The cell currently visible at a position, if one was ever written.
    pub fn visible(&self, position: Position) -> Option<Cell> {
        let state = self.state.borrow();
        state.index(position).and_then(|i| state.cells[i])
    }

    /// Script a mid-update window shrink: when the write journal reaches
    /// `after_writes` entries, the window snaps to `size` and the write that
    /// would have landed next fails with [`SurfaceChanged`].
    pub fn shrink_at_write(&self, after_writes: usize, size: Size) {
        self.state.borrow_mut().pending_shrink = Some((after_writes, size));
    }
}

impl Console for VirtualConsole {
    fn size(&self) -> Size {
        self.state.borrow().size
    }

    fn set_size(&mut self, size: Size) {
        self.state.borrow_mut().reallocate(size);
    }

    fn initialize(&mut self) {
        let mut state = self.state.borrow_mut();
        state.cells.fill(None);
        state.initializations += 1;
    }

    fn key_available(&self) -> bool {
        !self.state.borrow().keys.is_empty()
    }

    fn read_key(&mut self) -> Option<KeyEvent> {
        self.state.borrow_mut().keys.pop_front()
    }

    fn write(&mut self, position: Position, cell: &Cell) -> Result<(), SurfaceChanged> {
        let mut state = self.state.borrow_mut();

        if let Some((after_writes, size)) = state.pending_shrink
            && state.writes.len() >= after_writes
        {
            state.pending_shrink = None;
            state.reallocate(size);
            return Err(SurfaceChanged);
        }

        let Some(index) = state.index(position) else {
            return Err(SurfaceChanged);
        };
        state.cells[index] = Some(*cell);
        state.writes.push((position, *cell));
        Ok(())
    }

    fn on_refresh_start(&mut self) {
        self.state.borrow_mut().refreshes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::event::{KeyCode, KeyEvent};

    #[test]
    fn records_writes_and_visible_cells() {
        let mut console = VirtualConsole::new(Size::new(4, 2));
        let probe = console.clone();

        console
            .write(Position::new(1, 0), &Cell::from_char('a'))
            .unwrap();
        console
            .write(Position::new(3, 1), &Cell::from_char('b'))
            .unwrap();

        assert_eq!(probe.write_count(), 2);
        assert_eq!(probe.visible(Position::new(1, 0)), Some(Cell::from_char('a')));
        assert_eq!(probe.visible(Position::new(0, 0)), None);

        let writes = probe.take_writes();
        assert_eq!(writes[0].0, Position::new(1, 0));
        assert_eq!(probe.write_count(), 0);
    }

    #[test]
    fn out_of_bounds_write_is_surface_changed() {
        let mut console = VirtualConsole::new(Size::new(2, 2));
        let err = console.write(Position::new(2, 0), &Cell::EMPTY);
        assert_eq!(err, Err(SurfaceChanged));
    }

    #[test]
    fn key_queue_drains_in_order() {
        let mut console = VirtualConsole::new(Size::new(2, 2));
        console.push_key(KeyEvent::new(KeyCode::Char('a')));
        console.push_key(KeyEvent::new(KeyCode::Char('b')));

        assert!(console.key_available());
        assert!(console.read_key().unwrap().is_char('a'));
        assert!(console.read_key().unwrap().is_char('b'));
        assert!(!console.key_available());
        assert_eq!(console.read_key(), None);
    }

    #[test]
    fn initialize_clears_visible_cells() {
        let mut console = VirtualConsole::new(Size::new(2, 2));
        console.write(Position::ORIGIN, &Cell::from_char('x')).unwrap();

        console.initialize();
        assert_eq!(console.visible(Position::ORIGIN), None);
        assert_eq!(console.initialization_count(), 1);
        // The journal deliberately survives: tests count writes across
        // re-initializations.
        assert_eq!(console.write_count(), 1);
    }

    #[test]
    fn set_size_reallocates() {
        let mut console = VirtualConsole::new(Size::new(2, 2));
        console.write(Position::ORIGIN, &Cell::from_char('x')).unwrap();

        console.set_size(Size::new(6, 3));
        assert_eq!(console.size(), Size::new(6, 3));
        assert_eq!(console.visible(Position::ORIGIN), None);
    }

    #[test]
    fn scripted_shrink_fails_one_write_then_clips() {
        let mut console = VirtualConsole::new(Size::new(4, 4));
        console.shrink_at_write(1, Size::new(2, 2));

        assert!(console.write(Position::new(0, 0), &Cell::EMPTY).is_ok());
        // Journal is at 1 entry: the shrink fires.
        assert_eq!(
            console.write(Position::new(1, 0), &Cell::EMPTY),
            Err(SurfaceChanged)
        );
        assert_eq!(console.size(), Size::new(2, 2));
        // Writes inside the shrunk window work again.
        assert!(console.write(Position::new(1, 1), &Cell::EMPTY).is_ok());
    }

    #[test]
    fn refresh_counter_increments() {
        let mut console = VirtualConsole::new(Size::new(2, 2));
        console.on_refresh_start();
        console.on_refresh_end();
        console.on_refresh_start();
        assert_eq!(console.refresh_count(), 2);
    }
}
