//! The input event buffer.
//!
//! An ordered queue of typed input records, consumed FIFO. Stream reads (the
//! character extractor) see a filtered view: non-character key-ups are
//! skipped, key-down repeats expand to one event per repetition, and non-key
//! records are discarded. Raw event reads see everything, unchanged.
//!
//! The buffer also owns the cross-read state that has to survive between
//! calls: the one-slot DBCS lead-byte carry, the ctrl-seen latch, and the
//! queue of suspended reads waiting for data.

use crate::handle::InputMode;
use crate::key::{InputEvent, KeyRecord, VK_MENU};
use crate::status::{Failure, Result};
use crate::wait::WaitBlock;
use crate::FLOG;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct InputBufferId(pub usize);

#[derive(Default)]
pub struct InputBuffer {
    events: VecDeque<InputEvent>,
    pub mode: InputMode,
    /// Trail byte of a double-byte OEM character split by the end of the
    /// previous non-Unicode read.
    pub lead_byte_carry: Option<u8>,
    /// Set when ctrl-C fires; the next stream read observes it and alerts.
    pub ctrl_seen: bool,
    /// Swallow the key-up of the return that completed a cooked read.
    pub ignore_next_keyup: bool,
    /// Suspended reads, revived in order by the wait registry.
    pub waiters: VecDeque<WaitBlock>,
    /// Open handles onto this buffer.
    pub handle_count: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        InputBuffer {
            mode: InputMode::PROCESSED_INPUT
                | InputMode::LINE_INPUT
                | InputMode::ECHO_INPUT
                | InputMode::MOUSE_INPUT,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append events in arrival order. The caller is responsible for waking
    /// the wait registry afterwards.
    pub fn append(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        let before = self.events.len();
        self.events.extend(events);
        FLOG!(input, "appended", self.events.len() - before, "events");
    }

    /// Push events back in front of everything queued.
    pub fn prepend(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        let mut incoming: Vec<InputEvent> = events.into_iter().collect();
        while let Some(ev) = incoming.pop() {
            self.events.push_front(ev);
        }
    }

    /// Discard all queued events and the DBCS carry.
    pub fn flush(&mut self) {
        self.events.clear();
        self.lead_byte_carry = None;
        self.ctrl_seen = false;
    }

    /// Raw event read: up to `count` records, FIFO, non-destructive if
    /// `peek`. An empty buffer yields `Wait` when `blocking`, else no events.
    pub fn read_events(
        &mut self,
        count: usize,
        peek: bool,
        blocking: bool,
    ) -> Result<Vec<InputEvent>> {
        if self.events.is_empty() {
            if blocking {
                return Err(Failure::Wait);
            }
            return Ok(Vec::new());
        }
        let n = count.min(self.events.len());
        if peek {
            Ok(self.events.iter().take(n).copied().collect())
        } else {
            Ok(self.events.drain(..n).collect())
        }
    }

    /// Stream read: the next key record the character extractor should see.
    ///
    /// Skips non-key records and non-character key-ups, expands repeat
    /// counts, and honors the ignore-next-keyup mark left by a completed
    /// cooked read. Returns `Wait` when `blocking` and nothing is queued,
    /// `Unsuccessful` when not blocking, and — for readers that asked to be
    /// alerted — `Alerted` when a ctrl signal is pending.
    pub fn next_stream_key(&mut self, blocking: bool, alert_on_ctrl: bool) -> Result<KeyRecord> {
        if alert_on_ctrl && self.ctrl_seen {
            self.ctrl_seen = false;
            return Err(Failure::Alerted);
        }
        loop {
            let Some(front) = self.events.front_mut() else {
                return Err(if blocking {
                    Failure::Wait
                } else {
                    Failure::Unsuccessful
                });
            };
            let InputEvent::Key(key) = front else {
                self.events.pop_front();
                continue;
            };
            if !key.key_down {
                if self.ignore_next_keyup {
                    self.ignore_next_keyup = false;
                    self.events.pop_front();
                    continue;
                }
                // The alt+numpad carrier is the only key-up the extractor wants.
                if key.char_code == 0 || key.virtual_key != VK_MENU {
                    self.events.pop_front();
                    continue;
                }
            }
            if key.key_down && key.repeat_count > 1 {
                key.repeat_count -= 1;
                let mut one = *key;
                one.repeat_count = 1;
                return Ok(one);
            }
            let key = *key;
            self.events.pop_front();
            return Ok(key);
        }
    }

    /// Reset to the post-construction state, keeping nothing.
    pub fn reinitialize(&mut self) {
        let handle_count = self.handle_count;
        *self = InputBuffer::new();
        self.handle_count = handle_count;
    }
}
