#![forbid(unsafe_code)]

//! Shadow buffer: the last-known-written state of every terminal cell.
//!
//! The shadow buffer is the authoritative record of what characters are
//! currently visible on the physical terminal. The update loop asks it
//! "did this cell change" via [`ShadowBuffer::update`], which both answers
//! and records, so a completed pass leaves the buffer mirroring the screen.
//!
//! # Layout
//!
//! Cells are stored in row-major order: `index = y * width + x`.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`
//! 2. `None` means "unknown": the next compare-and-update reports a change
//!    regardless of the incoming cell
//! 3. After `clear()`, every cell is unknown
//! 4. Out-of-bounds positions are never recorded and never report a change

use crate::cell::Cell;
use weft_core::geometry::{Position, Rect, Size};

/// A grid of last-written cells keyed by position.
#[derive(Debug, Clone)]
pub struct ShadowBuffer {
    width: u16,
    height: u16,
    cells: Vec<Option<Cell>>,
}

impl ShadowBuffer {
    /// Create a buffer of the given size with every cell unknown.
    pub fn new(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            cells: vec![None; size.area() as usize],
        }
    }

    /// Buffer size in cells.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounding rect of the entire buffer.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Re-allocate to a new size. All cells become unknown.
    pub fn resize(&mut self, size: Size) {
        self.width = size.width;
        self.height = size.height;
        self.cells.clear();
        self.cells.resize(size.area() as usize, None);
    }

    /// Mark every cell unknown, forcing the next update pass to treat all
    /// of them as changed.
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Convert a position to a linear index.
    ///
    /// Returns `None` if the position is out of bounds.
    #[inline]
    fn index(&self, position: Position) -> Option<usize> {
        if position.x < self.width && position.y < self.height {
            Some(position.y as usize * self.width as usize + position.x as usize)
        } else {
            None
        }
    }

    /// The last recorded cell at a position, if known.
    #[inline]
    pub fn recorded(&self, position: Position) -> Option<Cell> {
        self.index(position).and_then(|i| self.cells[i])
    }

    /// Compare-and-record: returns whether `cell` differs from the last
    /// recorded value at `position`, recording it if so.
    ///
    /// Unknown cells always report a change. Out-of-bounds positions report
    /// no change and record nothing.
    #[inline]
    pub fn update(&mut self, position: Position, cell: Cell) -> bool {
        let Some(index) = self.index(position) else {
            return false;
        };
        if self.cells[index] == Some(cell) {
            return false;
        }
        self.cells[index] = Some(cell);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Color, StyleFlags};

    #[test]
    fn new_buffer_is_all_unknown() {
        let buffer = ShadowBuffer::new(Size::new(4, 3));
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(buffer.recorded(Position::new(x, y)), None);
            }
        }
    }

    #[test]
    fn unknown_cell_always_reports_change() {
        let mut buffer = ShadowBuffer::new(Size::new(2, 2));
        assert!(buffer.update(Position::ORIGIN, Cell::EMPTY));
        // Recorded now, so the same cell is unchanged.
        assert!(!buffer.update(Position::ORIGIN, Cell::EMPTY));
    }

    #[test]
    fn update_detects_content_and_style_changes() {
        let mut buffer = ShadowBuffer::new(Size::new(2, 2));
        let pos = Position::new(1, 1);

        assert!(buffer.update(pos, Cell::from_char('a')));
        assert!(!buffer.update(pos, Cell::from_char('a')));
        assert!(buffer.update(pos, Cell::from_char('b')));
        assert!(buffer.update(pos, Cell::from_char('b').with_fg(Color::Ansi(1))));
        assert!(buffer.update(
            pos,
            Cell::from_char('b')
                .with_fg(Color::Ansi(1))
                .with_flags(StyleFlags::BOLD)
        ));
        assert_eq!(
            buffer.recorded(pos),
            Some(
                Cell::from_char('b')
                    .with_fg(Color::Ansi(1))
                    .with_flags(StyleFlags::BOLD)
            )
        );
    }

    #[test]
    fn clear_makes_everything_unknown_again() {
        let mut buffer = ShadowBuffer::new(Size::new(2, 1));
        assert!(buffer.update(Position::ORIGIN, Cell::from_char('x')));
        assert!(!buffer.update(Position::ORIGIN, Cell::from_char('x')));

        buffer.clear();
        assert_eq!(buffer.recorded(Position::ORIGIN), None);
        assert!(buffer.update(Position::ORIGIN, Cell::from_char('x')));
    }

    #[test]
    fn resize_reallocates_and_clears() {
        let mut buffer = ShadowBuffer::new(Size::new(2, 2));
        buffer.update(Position::ORIGIN, Cell::from_char('x'));

        buffer.resize(Size::new(5, 4));
        assert_eq!(buffer.size(), Size::new(5, 4));
        assert_eq!(buffer.bounds(), Rect::new(0, 0, 5, 4));
        assert_eq!(buffer.recorded(Position::ORIGIN), None);
        // New area is addressable.
        assert!(buffer.update(Position::new(4, 3), Cell::from_char('y')));
    }

    #[test]
    fn out_of_bounds_reports_no_change() {
        let mut buffer = ShadowBuffer::new(Size::new(2, 2));
        assert!(!buffer.update(Position::new(2, 0), Cell::from_char('x')));
        assert!(!buffer.update(Position::new(0, 2), Cell::from_char('x')));
        assert_eq!(buffer.recorded(Position::new(2, 0)), None);
    }

    #[test]
    fn zero_size_buffer_is_inert() {
        let mut buffer = ShadowBuffer::new(Size::ZERO);
        assert!(buffer.size().is_empty());
        assert!(!buffer.update(Position::ORIGIN, Cell::EMPTY));
    }
}
