//! Command-line editing keys and popups for cooked reads.
//!
//! When the extractor classifies a key as an editing key it hands the virtual
//! key code here instead of feeding the line buffer. Popups sit on the
//! session's popup stack and intercept everything until dismissed.

use crate::cooked::{is_word_delim, CookedReadSession, Popup, PopupKind, Tick};
use crate::history::{CommandHistory, RecallDirection};
use crate::key::{
    Modifiers, VirtualKey, UNICODE_CARRIAGERETURN, VK_DELETE, VK_DOWN, VK_END, VK_ESCAPE, VK_F1,
    VK_F3, VK_F5, VK_F7, VK_F8, VK_HOME, VK_INSERT, VK_LEFT, VK_NEXT, VK_PRIOR, VK_RIGHT, VK_UP,
};
use crate::screen::{ScreenWriter, WriteFlags};
use crate::wchar::prelude::*;

/// What the edit-key dispatcher decided.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmdAction {
    Continue,
    /// A popup selection (or equivalent) finished the read.
    ReadComplete,
}

/// Redraw the whole line and put the cursor back at `write_cursor`.
/// Used after structural edits that do not flow through the tick machine.
fn repaint(session: &mut CookedReadSession, screen: &mut dyn ScreenWriter) {
    if session.echo {
        if let Some(anchor) = session.anchor {
            session.delete_command_line(screen, false);
            let line = session.line().to_owned();
            let outcome = screen.write_chars(
                &line,
                0,
                &line,
                anchor.x,
                WriteFlags::DESTRUCTIVE_BACKSPACE | WriteFlags::ECHO,
            );
            session.visible_cells = outcome.cells;
            if let Some(a) = &mut session.anchor {
                a.y += outcome.scroll;
            }
        }
    }
    session.sync_cursor(screen);
}

fn word_start_left(session: &CookedReadSession) -> usize {
    let line = session.line();
    let mut pos = session.write_cursor;
    while pos > 0 && is_word_delim(line.char_at(pos - 1)) {
        pos -= 1;
    }
    while pos > 0 && !is_word_delim(line.char_at(pos - 1)) {
        pos -= 1;
    }
    pos
}

fn word_start_right(session: &CookedReadSession) -> usize {
    let line = session.line();
    let end = session.units_used;
    let mut pos = session.write_cursor;
    while pos < end && !is_word_delim(line.char_at(pos)) {
        pos += 1;
    }
    while pos < end && is_word_delim(line.char_at(pos)) {
        pos += 1;
    }
    pos
}

/// Handle one command-line editing key for an active cooked read.
pub fn process_command_line(
    session: &mut CookedReadSession,
    screen: &mut dyn ScreenWriter,
    history: &mut CommandHistory,
    insert_toggle: bool,
    vk: VirtualKey,
    key_state: Modifiers,
) -> CmdAction {
    match vk {
        VK_ESCAPE => {
            session.delete_command_line(screen, true);
        }
        VK_HOME => {
            session.write_cursor = 0;
            session.sync_cursor(screen);
        }
        VK_END => {
            session.write_cursor = session.units_used;
            session.sync_cursor(screen);
        }
        VK_LEFT => {
            session.write_cursor = if key_state.ctrl() {
                word_start_left(session)
            } else {
                session.write_cursor.saturating_sub(1)
            };
            session.sync_cursor(screen);
        }
        VK_RIGHT => {
            session.write_cursor = if key_state.ctrl() {
                word_start_right(session)
            } else {
                (session.write_cursor + 1).min(session.units_used)
            };
            session.sync_cursor(screen);
        }
        VK_UP | VK_F5 => {
            if let Some(line) = history.recall(RecallDirection::Previous) {
                let line = line.to_owned();
                session.replace_line(screen, &line);
            }
        }
        VK_DOWN => {
            if let Some(line) = history.recall(RecallDirection::Next) {
                let line = line.to_owned();
                session.replace_line(screen, &line);
            }
        }
        VK_PRIOR => {
            if let Some(line) = history.recall_oldest() {
                let line = line.to_owned();
                session.replace_line(screen, &line);
            }
        }
        VK_NEXT => {
            if let Some(line) = history.recall_newest() {
                let line = line.to_owned();
                session.replace_line(screen, &line);
            }
        }
        VK_INSERT => {
            session.toggle_insert_mode(screen, insert_toggle);
        }
        VK_DELETE => {
            if session.write_cursor < session.units_used {
                let cursor = session.write_cursor;
                let used = session.units_used;
                let slice = session.storage.as_char_slice_mut();
                slice.copy_within(cursor + 1..used, cursor);
                slice[used - 1] = ' ';
                session.units_used -= 1;
                repaint(session, screen);
            }
        }
        VK_F1 => {
            // Copy the next character of the previous command, as if typed.
            if let Some(last) = history.newest() {
                if session.write_cursor < last.len() {
                    let c = last.char_at(session.write_cursor);
                    session.process_input(c as u16, key_state, screen, insert_toggle);
                }
            }
        }
        VK_F3 => {
            // Copy the tail of the previous command from the cursor on.
            if let Some(last) = history.newest() {
                let tail: WString = last
                    .as_char_slice()
                    .get(session.write_cursor..)
                    .unwrap_or(&[])
                    .iter()
                    .copied()
                    .collect();
                for &c in tail.as_char_slice() {
                    session.process_input(c as u16, key_state, screen, insert_toggle);
                }
            }
        }
        VK_F7 => {
            if !key_state.alt() && !history.is_empty() {
                session.popups.push(Popup {
                    kind: PopupKind::History,
                    selection: history.len() - 1,
                });
            }
        }
        VK_F8 => {
            let prefix = session.storage.slice_to(session.write_cursor).to_owned();
            if let Some(found) = history.search_backward(&prefix) {
                let found = found.to_owned();
                session.replace_line(screen, &found);
                session.write_cursor = prefix.len();
                session.sync_cursor(screen);
            }
        }
        _ => {}
    }
    CmdAction::Continue
}

/// Feed one unit of input to the topmost popup.
///
/// Arrows move the selection, escape dismisses, and return replaces the line
/// with the selection and completes the read through the normal tick path.
pub fn process_popup_input(
    session: &mut CookedReadSession,
    screen: &mut dyn ScreenWriter,
    history: &mut CommandHistory,
    insert_toggle: bool,
    popup_key: bool,
    wch: u16,
) -> CmdAction {
    let entries = history.len();
    let Some(popup) = session.popups.last_mut() else {
        return CmdAction::Continue;
    };
    debug_assert!(matches!(popup.kind, PopupKind::History));

    if popup_key {
        match wch as VirtualKey {
            VK_ESCAPE | VK_F7 => {
                session.popups.pop();
            }
            VK_UP => popup.selection = popup.selection.saturating_sub(1),
            VK_DOWN => {
                if popup.selection + 1 < entries {
                    popup.selection += 1;
                }
            }
            VK_PRIOR => popup.selection = 0,
            VK_NEXT => popup.selection = entries.saturating_sub(1),
            _ => {}
        }
        return CmdAction::Continue;
    }

    if wch == UNICODE_CARRIAGERETURN {
        let selection = popup.selection;
        session.popups.pop();
        if let Some(line) = history.at(selection) {
            let line = line.to_owned();
            session.replace_line(screen, &line);
        }
        if session.process_input(
            UNICODE_CARRIAGERETURN,
            Modifiers::empty(),
            screen,
            insert_toggle,
        ) == Tick::Complete
        {
            return CmdAction::ReadComplete;
        }
    }
    CmdAction::Continue
}
