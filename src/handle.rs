//! Per-client input handle state.
//!
//! A handle is a client's view of an input buffer: the mode word it reads
//! back, close/pending flags, and the carry buffer holding line-read content
//! that did not fit the client's buffer or that contained a multi-line alias
//! expansion. Carried content is served by the next read before any event is
//! consumed.

use crate::input_buffer::InputBufferId;
use crate::wchar::prelude::*;
use bitflags::bitflags;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct HandleId(pub usize);

bitflags! {
    /// The input mode word, in its wire layout.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct InputMode: u32 {
        const PROCESSED_INPUT = 0x0001;
        const LINE_INPUT = 0x0002;
        const ECHO_INPUT = 0x0004;
        const WINDOW_INPUT = 0x0008;
        const MOUSE_INPUT = 0x0010;
        const INSERT_MODE = 0x0020;
        const QUICK_EDIT_MODE = 0x0040;
        const EXTENDED_FLAGS = 0x0080;
        const AUTO_POSITION = 0x0100;
        const VIRTUAL_TERMINAL_INPUT = 0x0200;
    }
}

impl InputMode {
    /// The bits that live console-side and need EXTENDED_FLAGS to clear.
    pub const EXTENDED_SET: InputMode = InputMode::INSERT_MODE
        .union(InputMode::QUICK_EDIT_MODE)
        .union(InputMode::AUTO_POSITION);
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct HandleFlags: u32 {
        /// The handle is being closed; pending reads must complete alerted.
        const CLOSE_PENDING = 1 << 0;
        /// The carry buffer holds unread content from a prior line read.
        const INPUT_PENDING = 1 << 1;
        /// The carried content contains an embedded line terminator.
        const MULTI_LINE_INPUT = 1 << 2;
    }
}

pub struct Handle {
    pub buffer: InputBufferId,
    pub flags: HandleFlags,
    /// Line-read leftover; `carry_cursor` is the next unread character.
    pub carry: WString,
    pub carry_cursor: usize,
    /// Outstanding suspended reads through this handle.
    pub read_count: usize,
}

impl Handle {
    pub fn new(buffer: InputBufferId) -> Self {
        Handle {
            buffer,
            flags: HandleFlags::empty(),
            carry: WString::new(),
            carry_cursor: 0,
            read_count: 0,
        }
    }

    pub fn input_pending(&self) -> bool {
        self.flags.contains(HandleFlags::INPUT_PENDING)
    }

    pub fn carry_remaining(&self) -> usize {
        self.carry.len() - self.carry_cursor
    }

    /// Park leftover line content on the handle.
    pub fn set_carry(&mut self, content: WString, cursor: usize, multi_line: bool) {
        debug_assert!(cursor < content.len());
        self.carry = content;
        self.carry_cursor = cursor;
        self.flags.insert(HandleFlags::INPUT_PENDING);
        self.flags.set(HandleFlags::MULTI_LINE_INPUT, multi_line);
    }

    /// Consume `count` carried characters, releasing the buffer when drained.
    pub fn advance_carry(&mut self, count: usize) {
        self.carry_cursor += count;
        debug_assert!(self.carry_cursor <= self.carry.len());
        if self.carry_cursor >= self.carry.len() {
            self.clear_carry();
        }
    }

    pub fn clear_carry(&mut self) {
        self.carry = WString::new();
        self.carry_cursor = 0;
        self.flags
            .remove(HandleFlags::INPUT_PENDING | HandleFlags::MULTI_LINE_INPUT);
    }
}
