use crate::cmdline::{process_command_line, process_popup_input, CmdAction};
use crate::cooked::{is_word_delim, CookedReadSession, Tick};
use crate::handle::HandleId;
use crate::history::{DedupMode, HistorySet};
use crate::input_buffer::InputBufferId;
use crate::key::{
    Modifiers, EXTKEY_ERASE_PREV_WORD, UNICODE_BACKSPACE, UNICODE_BACKSPACE2,
    UNICODE_CARRIAGERETURN, VK_DELETE, VK_END, VK_ESCAPE, VK_F7, VK_HOME, VK_LEFT, VK_RIGHT,
    VK_UP,
};
use crate::screen::{Coord, ScreenWriter, VirtualScreen};
use crate::wchar::prelude::*;

fn make_session(echo: bool, processed: bool, insert: bool) -> CookedReadSession {
    CookedReadSession {
        handle: HandleId(0),
        buffer: InputBufferId(0),
        storage: std::iter::repeat(' ').take(256).collect(),
        units_used: 0,
        write_cursor: 0,
        anchor: Some(Coord::new(0, 0)),
        visible_cells: 0,
        echo,
        processed,
        line_mode: true,
        insert_mode: insert,
        ctrl_wakeup_mask: 0,
        control_key_state: Modifiers::empty(),
        exe_name: WString::new(),
        user_capacity_units: 128,
        popups: Vec::new(),
    }
}

fn feed(session: &mut CookedReadSession, screen: &mut VirtualScreen, text: &str) -> Tick {
    let mut last = Tick::Continue;
    for c in text.chars() {
        last = session.process_input(c as u16, Modifiers::empty(), screen, false);
    }
    last
}

#[test]
fn test_word_delimiters() {
    for c in [' ', '\t', '&', '(', ')', '|', '.', '/', '\\', '"'] {
        assert!(is_word_delim(c), "{c:?} should delimit");
    }
    for c in ['a', 'Z', '0', '-', '_'] {
        assert!(!is_word_delim(c), "{c:?} should not delimit");
    }
}

#[test]
fn test_typing_echoes_and_stores() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    assert_eq!(feed(&mut session, &mut screen, "abc"), Tick::Continue);
    assert_eq!(session.line(), L!("abc"));
    assert_eq!(session.write_cursor, 3);
    assert_eq!(session.visible_cells, 3);
    assert_eq!(screen.row_text(0), "abc");
    assert_eq!(screen.cursor_position(), Coord::new(3, 0));
}

#[test]
fn test_carriage_return_completes_with_crlf() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    assert_eq!(feed(&mut session, &mut screen, "abc\r"), Tick::Complete);
    assert_eq!(session.line(), L!("abc\r\n"));
    assert_eq!(session.units_used, 5);
    // The echo ends on the next row.
    assert_eq!(screen.row_text(0), "abc");
    assert_eq!(screen.cursor_position(), Coord::new(0, 1));
}

#[test]
fn test_unprocessed_read_keeps_cr_bare() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(false, false, false);
    assert_eq!(feed(&mut session, &mut screen, "hi\r"), Tick::Complete);
    // No linefeed is appended without processed input.
    assert_eq!(session.line(), L!("hi\r"));
}

#[test]
fn test_ctrl_wakeup_mask_completes_immediately() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    session.ctrl_wakeup_mask = 1 << 0x07;
    feed(&mut session, &mut screen, "xy");
    let tick = session.process_input(0x07, Modifiers::SHIFT_PRESSED, &mut screen, false);
    assert_eq!(tick, Tick::Complete);
    assert_eq!(session.line(), L!("xy\u{7}"));
    assert_eq!(session.control_key_state, Modifiers::SHIFT_PRESSED);
    // Mask completion does not echo the control character.
    assert_eq!(screen.row_text(0), "xy");
}

#[test]
fn test_backspace_at_end_of_line() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    feed(&mut session, &mut screen, "ab");
    session.process_input(UNICODE_BACKSPACE, Modifiers::empty(), &mut screen, false);
    assert_eq!(session.line(), L!("a"));
    assert_eq!(screen.row_text(0), "a");
    assert_eq!(screen.cursor_position(), Coord::new(1, 0));

    // Backspace on an empty line is a no-op.
    session.process_input(UNICODE_BACKSPACE, Modifiers::empty(), &mut screen, false);
    session.process_input(UNICODE_BACKSPACE, Modifiers::empty(), &mut screen, false);
    assert_eq!(session.units_used, 0);
    assert_eq!(session.write_cursor, 0);
}

#[test]
fn test_delete_doubles_as_backspace_when_processed() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    feed(&mut session, &mut screen, "ab");
    session.process_input(UNICODE_BACKSPACE2, Modifiers::empty(), &mut screen, false);
    assert_eq!(session.line(), L!("a"));
}

#[test]
fn test_erase_previous_word() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    feed(&mut session, &mut screen, "foo bar");
    session.process_input(
        EXTKEY_ERASE_PREV_WORD,
        Modifiers::empty(),
        &mut screen,
        false,
    );
    assert_eq!(session.line(), L!("foo "));
    assert_eq!(session.write_cursor, 4);
    assert_eq!(screen.row_text(0), "foo");

    // Typing continues from there.
    feed(&mut session, &mut screen, "qux");
    assert_eq!(session.line(), L!("foo qux"));
}

#[test]
fn test_erase_previous_word_over_delimiter_run() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    feed(&mut session, &mut screen, "foo   ");
    session.process_input(
        EXTKEY_ERASE_PREV_WORD,
        Modifiers::empty(),
        &mut screen,
        false,
    );
    // Starting on a delimiter, the erase stops at the word behind it.
    assert_eq!(session.line(), L!("foo"));
}

#[test]
fn test_mid_line_insert() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, true);
    feed(&mut session, &mut screen, "abc");
    session.write_cursor = 1;
    session.sync_cursor(&mut screen);
    session.process_input('X' as u16, Modifiers::empty(), &mut screen, false);
    assert_eq!(session.line(), L!("aXbc"));
    assert_eq!(session.write_cursor, 2);
    assert_eq!(screen.row_text(0), "aXbc");
    assert_eq!(screen.cursor_position(), Coord::new(2, 0));
}

#[test]
fn test_mid_line_overwrite() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    feed(&mut session, &mut screen, "abc");
    session.write_cursor = 1;
    session.sync_cursor(&mut screen);
    session.process_input('X' as u16, Modifiers::empty(), &mut screen, false);
    assert_eq!(session.line(), L!("aXc"));
    assert_eq!(session.units_used, 3);
    assert_eq!(screen.row_text(0), "aXc");
}

#[test]
fn test_mid_line_backspace_closes_gap() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    feed(&mut session, &mut screen, "abc");
    session.write_cursor = 2;
    session.sync_cursor(&mut screen);
    session.process_input(UNICODE_BACKSPACE, Modifiers::empty(), &mut screen, false);
    assert_eq!(session.line(), L!("ac"));
    assert_eq!(session.write_cursor, 1);
    assert_eq!(screen.row_text(0), "ac");
    assert_eq!(screen.cursor_position(), Coord::new(1, 0));
}

#[test]
fn test_buffer_full_rejects_ordinary_chars() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(false, true, false);
    session.units_used = 254;
    session.write_cursor = 254;
    session.process_input('z' as u16, Modifiers::empty(), &mut screen, false);
    assert_eq!(session.units_used, 254, "no room for ordinary characters");
    // But a return still completes.
    let tick = session.process_input(
        UNICODE_CARRIAGERETURN,
        Modifiers::empty(),
        &mut screen,
        false,
    );
    assert_eq!(tick, Tick::Complete);
}

#[test]
fn test_reference_edit_semantics() {
    // A mixed sequence of typing, cursor moves and erases ends with the
    // line the reference editor would produce.
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, true);
    let mut history = HistorySet::new(10);
    let list = history.for_exe(L!("test.exe"));

    feed(&mut session, &mut screen, "hello wrld");
    process_command_line(&mut session, &mut screen, list, false, VK_LEFT, Modifiers::empty());
    process_command_line(&mut session, &mut screen, list, false, VK_LEFT, Modifiers::empty());
    process_command_line(&mut session, &mut screen, list, false, VK_LEFT, Modifiers::empty());
    session.process_input('o' as u16, Modifiers::empty(), &mut screen, false);
    process_command_line(&mut session, &mut screen, list, false, VK_END, Modifiers::empty());
    let tick = feed(&mut session, &mut screen, "!\r");
    assert_eq!(tick, Tick::Complete);
    assert_eq!(session.line(), L!("hello world!\r\n"));
    assert_eq!(screen.row_text(0), "hello world!");
}

#[test]
fn test_edit_keys_home_end_delete_escape() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    let mut history = HistorySet::new(10);
    let list = history.for_exe(L!("test.exe"));

    feed(&mut session, &mut screen, "abcd");
    process_command_line(&mut session, &mut screen, list, false, VK_HOME, Modifiers::empty());
    assert_eq!(session.write_cursor, 0);
    assert_eq!(screen.cursor_position(), Coord::new(0, 0));

    process_command_line(&mut session, &mut screen, list, false, VK_DELETE, Modifiers::empty());
    assert_eq!(session.line(), L!("bcd"));

    process_command_line(&mut session, &mut screen, list, false, VK_RIGHT, Modifiers::empty());
    assert_eq!(session.write_cursor, 1);

    process_command_line(&mut session, &mut screen, list, false, VK_END, Modifiers::empty());
    assert_eq!(session.write_cursor, 3);

    process_command_line(&mut session, &mut screen, list, false, VK_ESCAPE, Modifiers::empty());
    assert_eq!(session.units_used, 0);
    assert_eq!(screen.row_text(0), "");
}

#[test]
fn test_ctrl_arrows_jump_words() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    let mut history = HistorySet::new(10);
    let list = history.for_exe(L!("test.exe"));

    feed(&mut session, &mut screen, "one two three");
    let ctrl = Modifiers::LEFT_CTRL_PRESSED;
    process_command_line(&mut session, &mut screen, list, false, VK_LEFT, ctrl);
    assert_eq!(session.write_cursor, 8); // start of "three"
    process_command_line(&mut session, &mut screen, list, false, VK_LEFT, ctrl);
    assert_eq!(session.write_cursor, 4); // start of "two"
    process_command_line(&mut session, &mut screen, list, false, VK_RIGHT, ctrl);
    assert_eq!(session.write_cursor, 8);
}

#[test]
fn test_history_recall_replaces_line() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    let mut history = HistorySet::new(10);
    let list = history.for_exe(L!("test.exe"));
    list.append(L!("older"), DedupMode::KeepDuplicates);
    list.append(L!("newer"), DedupMode::KeepDuplicates);

    feed(&mut session, &mut screen, "typed");
    process_command_line(&mut session, &mut screen, list, false, VK_UP, Modifiers::empty());
    assert_eq!(session.line(), L!("newer"));
    assert_eq!(screen.row_text(0), "newer");
    process_command_line(&mut session, &mut screen, list, false, VK_UP, Modifiers::empty());
    assert_eq!(session.line(), L!("older"));
}

#[test]
fn test_history_popup_selection_completes_read() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    let mut history = HistorySet::new(10);
    let list = history.for_exe(L!("test.exe"));
    list.append(L!("first"), DedupMode::KeepDuplicates);
    list.append(L!("second"), DedupMode::KeepDuplicates);

    process_command_line(&mut session, &mut screen, list, false, VK_F7, Modifiers::empty());
    assert_eq!(session.popups.len(), 1);

    // Move from the newest entry up to the older one, then select it.
    let action = process_popup_input(&mut session, &mut screen, list, false, true, VK_UP);
    assert_eq!(action, CmdAction::Continue);
    let action = process_popup_input(
        &mut session,
        &mut screen,
        list,
        false,
        false,
        UNICODE_CARRIAGERETURN,
    );
    assert_eq!(action, CmdAction::ReadComplete);
    assert!(session.popups.is_empty());
    assert_eq!(session.line(), L!("first\r\n"));
}

#[test]
fn test_popup_escape_dismisses() {
    let mut screen = VirtualScreen::new(40, 8);
    let mut session = make_session(true, true, false);
    let mut history = HistorySet::new(10);
    let list = history.for_exe(L!("test.exe"));
    list.append(L!("entry"), DedupMode::KeepDuplicates);

    process_command_line(&mut session, &mut screen, list, false, VK_F7, Modifiers::empty());
    let action = process_popup_input(&mut session, &mut screen, list, false, true, VK_ESCAPE);
    assert_eq!(action, CmdAction::Continue);
    assert!(session.popups.is_empty());
}

#[test]
fn test_insert_toggle_restored_on_completion() {
    let mut screen = VirtualScreen::new(40, 8);
    // Console default is overwrite; the user flips to insert mid-read.
    let mut session = make_session(true, true, false);
    session.toggle_insert_mode(&mut screen, false);
    assert!(session.insert_mode);
    assert!(screen.double_cursor());

    let tick = feed(&mut session, &mut screen, "ok\r");
    assert_eq!(tick, Tick::Complete);
    // Completion re-issues the toggle so the next read starts from the
    // console default, with the cursor shape reset.
    assert!(!session.insert_mode);
    assert!(!screen.double_cursor());
}
