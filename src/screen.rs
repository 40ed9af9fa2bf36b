//! Cell accounting and the screen-writer seam.
//!
//! The core never touches glyph storage; it asks a [`ScreenWriter`] to echo
//! characters and consumes the cell counts and scroll deltas that come back.
//! What it does own is the arithmetic: how many cells a character occupies at
//! a given column, and whether a full-width character would straddle the right
//! edge (a "bisect", resolved by advancing to the next row before drawing).

use crate::wchar::prelude::*;
use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

/// A screen cell coordinate. Negative values mean "not yet known".
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

impl Coord {
    pub fn new(x: i16, y: i16) -> Self {
        Coord { x, y }
    }
}

/// Tab stops are fixed every eight cells.
pub const TAB_SIZE: usize = 8;

pub fn spaces_in_tab(column: usize) -> usize {
    TAB_SIZE - (column % TAB_SIZE)
}

/// Whether the character occupies two cells (East Asian full width).
pub fn is_char_full_width(c: char) -> bool {
    c.width().unwrap_or(0) == 2
}

pub fn is_control_char(c: char) -> bool {
    (c as u32) < 0x20
}

/// Cells occupied by `c` when drawn at `column`. Control characters render as
/// `^X` and take two cells; tabs run to the next stop.
pub fn cells_for_char(c: char, column: usize) -> usize {
    if c == '\t' {
        spaces_in_tab(column)
    } else if is_control_char(c) || is_char_full_width(c) {
        2
    } else {
        1
    }
}

/// Total cells occupied by `line[..count]` when the line starts at
/// `start_column`. This is the running sum; tab widths depend on everything
/// drawn before them.
pub fn visible_cell_count(line: &wstr, count: usize, start_column: usize) -> usize {
    let mut column = start_column;
    let mut cells = 0;
    for &c in &line.as_char_slice()[..count] {
        let n = cells_for_char(c, column);
        column += n;
        cells += n;
    }
    cells
}

/// Cells occupied by the single character `line[index]`, accounting for the
/// columns taken by everything before it.
pub fn cells_for_char_at(line: &wstr, index: usize, start_column: usize) -> usize {
    let column = start_column + visible_cell_count(line, index, start_column);
    cells_for_char(line.as_char_slice()[index], column)
}

/// Whether drawing `line[..count]` into rows of `row_width` cells, starting
/// at `start_column`, would leave a full-width character straddling the right
/// edge. The writer resolves a bisect by padding to the next row first.
pub fn check_bisect(line: &wstr, count: usize, start_column: usize, row_width: usize) -> bool {
    let mut column = start_column;
    for &c in &line.as_char_slice()[..count.min(line.len())] {
        let n = cells_for_char(c, column % row_width);
        if is_char_full_width(c) && (column % row_width) + 1 == row_width {
            return true;
        }
        column += n;
    }
    false
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct WriteFlags: u32 {
        /// Backspace erases the previous glyph instead of merely moving.
        const DESTRUCTIVE_BACKSPACE = 1 << 0;
        /// Scroll if needed so the cursor stays on screen.
        const KEEP_CURSOR_VISIBLE = 1 << 1;
        /// This write is an echo of user input.
        const ECHO = 1 << 2;
    }
}

/// What a write did: cells drawn (excluding pure cursor motion) and how many
/// rows the screen scrolled (negative when content moved up).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WriteOutcome {
    pub cells: usize,
    pub scroll: i16,
}

/// The rendering collaborator.
///
/// `write_chars` draws `text` at the current cursor. `line[..offset]` is the
/// already-drawn part of the same logical line, needed for tab expansion and
/// destructive backspace; the line itself starts at `start_column`.
pub trait ScreenWriter {
    fn size(&self) -> Coord;
    fn cursor_position(&self) -> Coord;
    fn set_cursor_position(&mut self, pos: Coord);
    /// Grow or shrink the cursor glyph to signal overwrite mode.
    fn set_double_cursor(&mut self, double: bool);
    fn write_chars(
        &mut self,
        line: &wstr,
        offset: usize,
        text: &wstr,
        start_column: i16,
        flags: WriteFlags,
    ) -> WriteOutcome;
    /// Blank `cells` cells starting at `pos`, leaving the cursor alone.
    fn fill_with_blanks(&mut self, pos: Coord, cells: usize);
}

/// A deterministic in-memory screen. This is not a renderer; it exists so the
/// echo path, cursor math and scroll accounting can be exercised end to end.
pub struct VirtualScreen {
    width: usize,
    height: usize,
    cells: Vec<char>,
    cursor: Coord,
    double_cursor: bool,
}

/// Marks the second cell of a full-width glyph.
const TRAILING_CELL: char = '\0';

impl VirtualScreen {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width >= 2 && height >= 1);
        VirtualScreen {
            width,
            height,
            cells: vec![' '; width * height],
            cursor: Coord::default(),
            double_cursor: false,
        }
    }

    /// The text content of row `y`, trailing blanks trimmed.
    pub fn row_text(&self, y: usize) -> String {
        let row = &self.cells[y * self.width..(y + 1) * self.width];
        let mut s: String = row.iter().filter(|&&c| c != TRAILING_CELL).collect();
        while s.ends_with(' ') {
            s.pop();
        }
        s
    }

    pub fn double_cursor(&self) -> bool {
        self.double_cursor
    }

    fn scroll_up(&mut self) {
        self.cells.copy_within(self.width.., 0);
        let len = self.cells.len();
        self.cells[len - self.width..].fill(' ');
    }

    /// Write one cell at the cursor and advance, wrapping and scrolling.
    /// Returns the rows scrolled (0 or -1).
    fn put_cell(&mut self, c: char) -> i16 {
        let idx = self.cursor.y as usize * self.width + self.cursor.x as usize;
        self.cells[idx] = c;
        self.cursor.x += 1;
        if self.cursor.x as usize == self.width {
            self.cursor.x = 0;
            self.cursor.y += 1;
        }
        self.carriage_scroll()
    }

    fn carriage_scroll(&mut self) -> i16 {
        if self.cursor.y as usize == self.height {
            self.scroll_up();
            self.cursor.y -= 1;
            -1
        } else {
            0
        }
    }

    fn backspace_destructive(&mut self, line: &wstr, offset: usize, start_column: i16) {
        if offset == 0 {
            return;
        }
        let width = cells_for_char_at(line, offset - 1, start_column as usize);
        let mut x = i32::from(self.cursor.x) - width as i32;
        let mut y = self.cursor.y;
        while x < 0 {
            x += self.width as i32;
            y -= 1;
        }
        if y < 0 {
            return;
        }
        self.cursor = Coord::new(x as i16, y);
        let idx = y as usize * self.width + x as usize;
        let end = (idx + width).min(self.cells.len());
        for cell in &mut self.cells[idx..end] {
            *cell = ' ';
        }
    }
}

impl ScreenWriter for VirtualScreen {
    fn size(&self) -> Coord {
        Coord::new(self.width as i16, self.height as i16)
    }

    fn cursor_position(&self) -> Coord {
        self.cursor
    }

    fn set_cursor_position(&mut self, pos: Coord) {
        assert!((pos.x as usize) < self.width && (pos.y as usize) < self.height);
        self.cursor = pos;
    }

    fn set_double_cursor(&mut self, double: bool) {
        self.double_cursor = double;
    }

    fn write_chars(
        &mut self,
        line: &wstr,
        offset: usize,
        text: &wstr,
        start_column: i16,
        flags: WriteFlags,
    ) -> WriteOutcome {
        let mut outcome = WriteOutcome::default();
        let mut offset = offset;
        for &c in text.as_char_slice() {
            match c {
                '\u{8}' => {
                    if flags.contains(WriteFlags::DESTRUCTIVE_BACKSPACE) {
                        self.backspace_destructive(line, offset, start_column);
                    } else if self.cursor.x > 0 {
                        self.cursor.x -= 1;
                    }
                    offset = offset.saturating_sub(1);
                    continue;
                }
                '\r' => {
                    self.cursor.x = 0;
                }
                '\n' => {
                    self.cursor.y += 1;
                    outcome.scroll += self.carriage_scroll();
                }
                '\t' => {
                    for _ in 0..spaces_in_tab(self.cursor.x as usize) {
                        outcome.scroll += self.put_cell(' ');
                        outcome.cells += 1;
                    }
                }
                c if is_control_char(c) => {
                    outcome.scroll += self.put_cell('^');
                    outcome.scroll += self.put_cell(char::from_u32(c as u32 + 0x40).unwrap());
                    outcome.cells += 2;
                }
                c if is_char_full_width(c) => {
                    // Bisect: a full-width glyph cannot straddle the right edge.
                    if self.cursor.x as usize + 1 == self.width {
                        outcome.scroll += self.put_cell(' ');
                    }
                    outcome.scroll += self.put_cell(c);
                    outcome.scroll += self.put_cell(TRAILING_CELL);
                    outcome.cells += 2;
                }
                c => {
                    outcome.scroll += self.put_cell(c);
                    outcome.cells += 1;
                }
            }
            offset += 1;
        }
        outcome
    }

    fn fill_with_blanks(&mut self, pos: Coord, cells: usize) {
        if pos.x < 0 || pos.y < 0 {
            return;
        }
        let start = pos.y as usize * self.width + pos.x as usize;
        if start >= self.cells.len() {
            return;
        }
        let end = (start + cells).min(self.cells.len());
        self.cells[start..end].fill(' ');
    }
}
