//! The cooked (line-edit) read state machine.
//!
//! A cooked read owns a scratch line of wide characters and consumes one
//! character-plus-modifier tick at a time. Ticks either edit the line (echoing
//! through the screen writer, with insert/overwrite, destructive backspace,
//! word-granularity erase and full-width bisect handling) or complete the
//! read (carriage return, or a control character named by the wakeup mask).
//! Completion runs alias expansion and history recording, then squeezes the
//! result into the client's buffer, spilling any excess into the handle's
//! carry for the next read.

use crate::handle::HandleId;
use crate::input_buffer::InputBufferId;
use crate::key::{
    Modifiers, EXTKEY_ERASE_PREV_WORD, UNICODE_BACKSPACE, UNICODE_BACKSPACE2,
    UNICODE_CARRIAGERETURN,
};
use crate::screen::{
    cells_for_char_at, check_bisect, visible_cell_count, Coord, ScreenWriter, WriteFlags,
};
use crate::wchar::prelude::*;
use crate::FLOG;

/// Scratch lines are at least this many characters, no matter how small the
/// client's buffer is.
pub const LINE_INPUT_BUFFER_CHARS: usize = 256;

/// What one tick of the state machine decided.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tick {
    Continue,
    Complete,
}

/// The character class that bounds erase-previous-word.
pub fn is_word_delim(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '&' | '('
                | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | '<'
                | '>'
                | '|'
                | '^'
                | '='
                | ';'
                | '!'
                | '\''
                | '+'
                | ','
                | '`'
                | '~'
                | '?'
                | '@'
                | '*'
                | '\\'
                | '"'
                | '#'
                | '$'
                | '%'
                | '.'
                | ':'
                | '/'
        )
}

/// An interactive popup riding on top of a cooked read, intercepting input
/// while it is open.
pub struct Popup {
    pub kind: PopupKind,
    /// Selected entry for list-shaped popups.
    pub selection: usize,
}

pub enum PopupKind {
    /// The history recall list.
    History,
}

/// One line-input read in flight. Owned exclusively for the read's duration;
/// parked in a wait block whenever the event queue runs dry.
pub struct CookedReadSession {
    pub handle: HandleId,
    pub buffer: InputBufferId,

    /// The scratch line, pre-filled with spaces so cursor movement over
    /// untyped cells stays well-defined.
    pub storage: WString,
    /// Characters of user content in `storage`.
    pub units_used: usize,
    /// Insertion index; trails `units_used` when editing mid-line.
    pub write_cursor: usize,
    /// Screen cell where the line starts; set lazily on the first event so a
    /// prompt written after the read begins still anchors correctly.
    pub anchor: Option<Coord>,
    /// Screen cells the echoed line occupies.
    pub visible_cells: usize,

    pub echo: bool,
    pub processed: bool,
    pub line_mode: bool,
    pub insert_mode: bool,

    /// Bit k set means control character k completes the read immediately.
    pub ctrl_wakeup_mask: u32,
    pub control_key_state: Modifiers,

    pub exe_name: WString,
    /// Client buffer capacity, in characters.
    pub user_capacity_units: usize,

    pub popups: Vec<Popup>,
}

impl CookedReadSession {
    pub fn capacity_units(&self) -> usize {
        self.storage.len()
    }

    pub fn line(&self) -> &wstr {
        self.storage.slice_to(self.units_used)
    }

    fn at_end_of_line(&self) -> bool {
        self.write_cursor == self.units_used
    }

    fn set_char(&mut self, index: usize, c: char) {
        self.storage.as_char_slice_mut()[index] = c;
    }

    /// Anchor column, valid once the anchor is set.
    fn anchor_column(&self) -> usize {
        self.anchor.map(|a| a.x as usize).unwrap_or(0)
    }

    fn recount_visible_cells(&mut self) {
        if self.anchor.is_some() {
            self.visible_cells =
                visible_cell_count(self.line(), self.units_used, self.anchor_column());
        }
    }

    /// Clear the echoed line from the screen and home the cursor to the
    /// anchor. With `reset_line`, also empty the stored content.
    pub fn delete_command_line(&mut self, screen: &mut dyn ScreenWriter, reset_line: bool) {
        if self.echo {
            if let Some(anchor) = self.anchor {
                screen.fill_with_blanks(anchor, self.visible_cells);
                screen.set_cursor_position(anchor);
            }
        }
        if reset_line {
            let spaces = self.storage.len();
            self.storage = WString::from_iter(std::iter::repeat(' ').take(spaces));
            self.units_used = 0;
            self.write_cursor = 0;
            self.visible_cells = 0;
        }
    }

    /// Replace the whole line with `text`, echoing it, cursor at the end.
    pub fn replace_line(&mut self, screen: &mut dyn ScreenWriter, text: &wstr) {
        self.delete_command_line(screen, true);
        let n = text.len().min(self.capacity_units().saturating_sub(2));
        for (i, &c) in text.as_char_slice()[..n].iter().enumerate() {
            self.set_char(i, c);
        }
        self.units_used = n;
        self.write_cursor = n;
        if self.echo {
            if let Some(anchor) = self.anchor {
                let line = self.storage.slice_to(n).to_owned();
                let outcome = screen.write_chars(
                    &line,
                    0,
                    &line,
                    anchor.x,
                    WriteFlags::DESTRUCTIVE_BACKSPACE
                        | WriteFlags::KEEP_CURSOR_VISIBLE
                        | WriteFlags::ECHO,
                );
                if let Some(a) = &mut self.anchor {
                    a.y += outcome.scroll;
                }
            }
        }
        self.recount_visible_cells();
    }

    /// Feed one character tick through the state machine.
    ///
    /// `insert_toggle` is the console-wide insert default, consulted when a
    /// carriage return completes the read.
    pub fn process_input(
        &mut self,
        wch_in: u16,
        key_state: Modifiers,
        screen: &mut dyn ScreenWriter,
        insert_toggle: bool,
    ) -> Tick {
        let wch_orig = wch_in;
        let mut wch = wch_in;

        // Two slots stay reserved for the CR LF terminator.
        if self.units_used >= self.capacity_units() - 2
            && wch != UNICODE_CARRIAGERETURN
            && wch != UNICODE_BACKSPACE
        {
            return Tick::Continue;
        }

        if self.ctrl_wakeup_mask != 0 && wch < 0x20 && (self.ctrl_wakeup_mask >> wch) & 1 != 0 {
            self.set_char(self.write_cursor, wchar(wch));
            self.units_used += 1;
            self.write_cursor += 1;
            self.control_key_state = key_state;
            FLOG!(cooked_read, "wakeup mask completion on", wch);
            return Tick::Complete;
        }

        if wch == EXTKEY_ERASE_PREV_WORD {
            wch = UNICODE_BACKSPACE;
        }

        if self.at_end_of_line() {
            self.process_at_end_of_line(wch, wch_orig, screen);
        } else {
            self.process_mid_line(wch, wch_orig, screen);
        }
        self.recount_visible_cells();

        // Carriage return completes the line: append a linefeed when
        // processed, and put the insert toggle back if an edit key flipped it.
        if wch == UNICODE_CARRIAGERETURN {
            if self.processed && self.units_used < self.capacity_units() {
                self.set_char(self.units_used, '\n');
                if self.echo {
                    if let Some(anchor) = self.anchor {
                        let line = self.storage.slice_to(self.units_used + 1).to_owned();
                        screen.write_chars(
                            &line,
                            self.units_used,
                            L!("\n"),
                            anchor.x,
                            WriteFlags::DESTRUCTIVE_BACKSPACE
                                | WriteFlags::KEEP_CURSOR_VISIBLE
                                | WriteFlags::ECHO,
                        );
                    }
                }
                self.units_used += 1;
                self.write_cursor += 1;
            }
            if self.line_mode {
                if self.insert_mode != insert_toggle {
                    // Undo the in-read toggle, restoring the cursor shape.
                    self.toggle_insert_mode(screen, insert_toggle);
                }
                return Tick::Complete;
            }
        }

        Tick::Continue
    }

    pub fn toggle_insert_mode(&mut self, screen: &mut dyn ScreenWriter, insert_toggle: bool) {
        self.insert_mode = !self.insert_mode;
        screen.set_double_cursor(self.insert_mode != insert_toggle);
    }

    /// Simple case: the cursor sits at the end of the content.
    fn process_at_end_of_line(
        &mut self,
        mut wch: u16,
        wch_orig: u16,
        screen: &mut dyn ScreenWriter,
    ) {
        if wch == UNICODE_BACKSPACE2 {
            wch = UNICODE_BACKSPACE;
        }

        // Backspace with nothing to erase is a no-op.
        if wch == UNICODE_BACKSPACE && self.write_cursor == 0 {
            return;
        }

        let started_on_delim =
            self.write_cursor > 0 && is_word_delim(self.storage.char_at(self.write_cursor - 1));

        loop {
            if self.echo {
                if let Some(anchor) = self.anchor {
                    let line = self.storage.slice_to(self.units_used).to_owned();
                    let text = WString::from_iter([wchar(wch)]);
                    let outcome = screen.write_chars(
                        &line,
                        self.write_cursor,
                        &text,
                        anchor.x,
                        WriteFlags::DESTRUCTIVE_BACKSPACE
                            | WriteFlags::KEEP_CURSOR_VISIBLE
                            | WriteFlags::ECHO,
                    );
                    if let Some(a) = &mut self.anchor {
                        a.y += outcome.scroll;
                    }
                }
            }
            if wch == UNICODE_BACKSPACE && self.processed {
                self.units_used -= 1;
                self.write_cursor -= 1;
                self.set_char(self.write_cursor, ' ');
                // Erase-previous-word repeats until the delimiter boundary flips.
                if wch_orig == EXTKEY_ERASE_PREV_WORD
                    && self.write_cursor != 0
                    && (started_on_delim ^ !is_word_delim(self.storage.char_at(self.write_cursor - 1)))
                {
                    continue;
                }
            } else {
                self.set_char(self.write_cursor, wchar(wch));
                self.units_used += 1;
                self.write_cursor += 1;
            }
            break;
        }
    }

    /// Editing in the middle of the line: mutate the stored line, then clear
    /// and repaint the whole displayed extent and reposition the cursor.
    fn process_mid_line(&mut self, wch: u16, wch_orig: u16, screen: &mut dyn ScreenWriter) {
        let mut call_write = true;
        let mut num_spaces = 0usize;
        let row_width = screen.size().x as usize;

        if wch == UNICODE_BACKSPACE && self.processed {
            if self.write_cursor == 0 {
                call_write = false;
            } else {
                let started_on_delim = is_word_delim(self.storage.char_at(self.write_cursor - 1));
                loop {
                    if self.echo {
                        if let Some(anchor) = self.anchor {
                            let line = self.storage.slice_to(self.units_used).to_owned();
                            screen.write_chars(
                                &line,
                                self.write_cursor,
                                L!("\u{8}"),
                                anchor.x,
                                WriteFlags::DESTRUCTIVE_BACKSPACE
                                    | WriteFlags::KEEP_CURSOR_VISIBLE
                                    | WriteFlags::ECHO,
                            );
                        }
                    }
                    self.units_used -= 1;
                    self.write_cursor -= 1;
                    let slice = self.storage.as_char_slice_mut();
                    slice.copy_within(self.write_cursor + 1..self.units_used + 1, self.write_cursor);
                    slice[self.units_used] = ' ';
                    if wch_orig == EXTKEY_ERASE_PREV_WORD
                        && self.write_cursor != 0
                        && (started_on_delim
                            ^ !is_word_delim(self.storage.char_at(self.write_cursor - 1)))
                    {
                        continue;
                    }
                    break;
                }
            }
        } else if wch == UNICODE_CARRIAGERETURN {
            // Carriage return always lands at the end of the content.
            self.write_cursor = self.units_used;
            self.set_char(self.write_cursor, '\r');
            self.units_used += 1;
            self.write_cursor += 1;
        } else {
            let bisect = self.echo
                && check_bisect(
                    self.line(),
                    self.write_cursor + 1,
                    self.anchor_column(),
                    row_width,
                );
            if self.insert_mode {
                let used = self.units_used;
                let slice = self.storage.as_char_slice_mut();
                slice.copy_within(self.write_cursor..used, self.write_cursor + 1);
                self.units_used += 1;
            }
            self.set_char(self.write_cursor, wchar(wch));
            self.write_cursor += 1;
            if self.echo {
                num_spaces =
                    cells_for_char_at(self.line(), self.write_cursor - 1, self.anchor_column());
                if num_spaces > 0 && bisect {
                    num_spaces -= 1;
                }
            }
        }

        if self.echo && call_write {
            let Some(_) = self.anchor else { return };
            let mut cursor = screen.cursor_position();
            cursor.x += num_spaces as i16;

            self.delete_command_line(screen, false);

            let mut flags = WriteFlags::DESTRUCTIVE_BACKSPACE | WriteFlags::ECHO;
            if wch == UNICODE_CARRIAGERETURN {
                flags |= WriteFlags::KEEP_CURSOR_VISIBLE;
            }
            let anchor = self.anchor.unwrap();
            let line = self.storage.slice_to(self.units_used).to_owned();
            let outcome = screen.write_chars(&line, 0, &line, anchor.x, flags);
            self.visible_cells = outcome.cells;

            if wch != UNICODE_CARRIAGERETURN {
                if check_bisect(
                    self.line(),
                    self.write_cursor + 1,
                    self.anchor_column(),
                    row_width,
                ) && cursor.x as usize == row_width - 1
                {
                    cursor.x += 1;
                }
                if let Some(a) = &mut self.anchor {
                    a.y += outcome.scroll;
                }
                cursor.y += outcome.scroll;
                clamp_cursor(&mut cursor, screen.size());
                screen.set_cursor_position(cursor);
            }
        }
    }

    /// Move the screen cursor to mirror `write_cursor`.
    pub fn sync_cursor(&self, screen: &mut dyn ScreenWriter) {
        if !self.echo {
            return;
        }
        let Some(anchor) = self.anchor else { return };
        let cells = visible_cell_count(self.line(), self.write_cursor, anchor.x as usize);
        let row_width = screen.size().x as usize;
        let linear = anchor.x as usize + cells;
        let mut pos = Coord::new(
            (linear % row_width) as i16,
            anchor.y + (linear / row_width) as i16,
        );
        clamp_cursor(&mut pos, screen.size());
        screen.set_cursor_position(pos);
    }
}

fn clamp_cursor(pos: &mut Coord, size: Coord) {
    pos.x = pos.x.clamp(0, size.x - 1);
    pos.y = pos.y.clamp(0, size.y - 1);
}
