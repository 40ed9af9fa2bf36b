//! The console context and its entry points.
//!
//! Everything the core touches hangs off an explicit [`Console`] value:
//! arenas of input buffers and handles keyed by integer ids, the screen and
//! codepage collaborators, the alias table, history, and the console-wide
//! mode side-fields. Callers serialize access; a suspended read parks its
//! context in the owning buffer's wait queue and is revived on this console's
//! call stack by whichever writer wakes it.

use crate::alias::AliasTable;
use crate::cmdline::{self, CmdAction};
use crate::cooked::{CookedReadSession, Tick, LINE_INPUT_BUFFER_CHARS};
use crate::dbcs::{translate_unicode_to_oem, Codepage};
use crate::handle::{Handle, HandleFlags, HandleId, InputMode};
use crate::history::{DedupMode, HistorySet};
use crate::input_buffer::{InputBuffer, InputBufferId};
use crate::key::InputEvent;
use crate::screen::ScreenWriter;
use crate::status::{Failure, Result, Status};
use crate::stream::{
    self, drain_carry, finish_raw_read, get_char, raw_read_run, CharOut, EditKeyInterest,
    RawReadContext,
};
use crate::wait::{CompletedRead, PendingReply, ReadPayload, WaitBlock, WaitKind, WakeReason};
use crate::wchar::prelude::*;
use crate::FLOG;

/// A client read request.
#[derive(Clone, Debug)]
pub struct ReadRequest {
    /// Correlation token echoed back in the completion.
    pub tag: u64,
    pub handle: HandleId,
    /// Client buffer capacity in bytes.
    pub capacity: usize,
    /// Pre-seeded line content (line-mode reads only).
    pub initial: WString,
    /// Bit k set: control character k completes a cooked read immediately.
    pub ctrl_wakeup_mask: u32,
    /// Client executable, the alias/history namespace.
    pub exe_name: WString,
    /// Wide delivery when true, active-codepage bytes when false.
    pub unicode: bool,
    /// Report zero bytes when the payload leads with a ctrl-Z.
    pub process_ctrl_z: bool,
    /// Owning thread, for teardown when it dies.
    pub thread: u64,
}

impl ReadRequest {
    pub fn new(handle: HandleId, capacity: usize) -> Self {
        ReadRequest {
            tag: 0,
            handle,
            capacity,
            initial: WString::new(),
            ctrl_wakeup_mask: 0,
            exe_name: WString::new(),
            unicode: true,
            process_ctrl_z: false,
            thread: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CtrlEvent {
    CtrlC,
    CtrlBreak,
}

/// How far a read got before returning to the dispatcher.
enum Progress {
    Done(CompletedRead),
    Wait(WaitKind),
}

/// What reviving one wait block produced.
enum Resumed {
    Done(CompletedRead),
    Requeue(WaitBlock),
}

pub struct Console {
    pub(crate) input_buffers: Vec<Option<InputBuffer>>,
    pub(crate) handles: Vec<Option<Handle>>,
    pub(crate) screen: Box<dyn ScreenWriter>,
    pub(crate) codepage: Box<dyn Codepage>,
    pub(crate) alias: AliasTable,
    pub(crate) history: HistorySet,

    /// Console-side mode fields, hoisted out of the mode word.
    insert_mode: bool,
    quick_edit: bool,
    auto_position: bool,

    /// Enables the extended edit-key substitutions (ctrl+backspace).
    extended_edit_keys: bool,
    /// Suppress history entries equal to the most recent one.
    history_nodup: bool,

    /// At most one cooked read may exist per console.
    cooked_active: bool,
}

impl Console {
    pub fn new(screen: Box<dyn ScreenWriter>, codepage: Box<dyn Codepage>) -> Self {
        Console {
            input_buffers: Vec::new(),
            handles: Vec::new(),
            screen,
            codepage,
            alias: AliasTable::new(),
            history: HistorySet::default(),
            insert_mode: false,
            quick_edit: false,
            auto_position: false,
            extended_edit_keys: false,
            history_nodup: false,
            cooked_active: false,
        }
    }

    pub fn create_input_buffer(&mut self) -> InputBufferId {
        self.input_buffers.push(Some(InputBuffer::new()));
        InputBufferId(self.input_buffers.len() - 1)
    }

    pub fn open_input_handle(&mut self, buffer: InputBufferId) -> Result<HandleId> {
        let buf = self.buffer_mut(buffer)?;
        buf.handle_count += 1;
        self.handles.push(Some(Handle::new(buffer)));
        Ok(HandleId(self.handles.len() - 1))
    }

    pub fn alias_table_mut(&mut self) -> &mut AliasTable {
        &mut self.alias
    }

    pub fn history_mut(&mut self) -> &mut HistorySet {
        &mut self.history
    }

    pub fn screen(&self) -> &dyn ScreenWriter {
        &*self.screen
    }

    pub fn insert_mode(&self) -> bool {
        self.insert_mode
    }

    pub fn quick_edit_mode(&self) -> bool {
        self.quick_edit
    }

    pub fn auto_position(&self) -> bool {
        self.auto_position
    }

    pub fn set_extended_edit_keys(&mut self, on: bool) {
        self.extended_edit_keys = on;
    }

    pub fn set_history_nodup(&mut self, on: bool) {
        self.history_nodup = on;
    }

    fn buffer_mut(&mut self, id: InputBufferId) -> Result<&mut InputBuffer> {
        self.input_buffers
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Failure::InvalidParameter)
    }

    fn handle_ref(&self, id: HandleId) -> Result<&Handle> {
        self.handles
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(Failure::InvalidParameter)
    }

    fn handle_mut(&mut self, id: HandleId) -> Result<&mut Handle> {
        self.handles
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Failure::InvalidParameter)
    }

    // ------------------------------------------------------------------
    // Input mode

    /// Store the mode word. The insert/quick-edit/auto-position bits live
    /// console-side and may only be rewritten when EXTENDED_FLAGS accompanies
    /// them (setting any of the three implies it). Echo without line input is
    /// invalid but committed anyway, a compatibility wart callers depend on.
    pub fn set_input_mode(&mut self, handle: HandleId, mode: InputMode) -> Result<()> {
        let buffer = self.handle_ref(handle)?.buffer;
        if mode.contains(InputMode::EXTENDED_FLAGS) || mode.intersects(InputMode::EXTENDED_SET) {
            self.insert_mode = mode.contains(InputMode::INSERT_MODE);
            self.quick_edit = mode.contains(InputMode::QUICK_EDIT_MODE);
            self.auto_position = mode.contains(InputMode::AUTO_POSITION);
        }
        self.buffer_mut(buffer)?.mode = mode;
        if mode.contains(InputMode::ECHO_INPUT) && !mode.contains(InputMode::LINE_INPUT) {
            return Err(Failure::InvalidParameter);
        }
        Ok(())
    }

    pub fn input_mode(&self, handle: HandleId) -> Result<InputMode> {
        let buffer = self.handle_ref(handle)?.buffer;
        Ok(self
            .input_buffers
            .get(buffer.0)
            .and_then(Option::as_ref)
            .ok_or(Failure::InvalidParameter)?
            .mode)
    }

    // ------------------------------------------------------------------
    // Event-write surface

    /// Append events and wake one waiter. Returns any completions produced
    /// by revived reads.
    pub fn write_input(
        &mut self,
        buffer: InputBufferId,
        events: &[InputEvent],
        prepend: bool,
    ) -> Result<Vec<CompletedRead>> {
        let buf = self.buffer_mut(buffer)?;
        if prepend {
            buf.prepend(events.iter().copied());
        } else {
            buf.append(events.iter().copied());
        }
        Ok(self.notify_waiters(buffer, WakeReason::None, false))
    }

    /// Raw event read; never blocks. `peek` is non-destructive.
    pub fn read_input(
        &mut self,
        buffer: InputBufferId,
        count: usize,
        peek: bool,
    ) -> Result<Vec<InputEvent>> {
        self.buffer_mut(buffer)?.read_events(count, peek, false)
    }

    pub fn pending_input_count(&self, buffer: InputBufferId) -> Result<usize> {
        Ok(self
            .input_buffers
            .get(buffer.0)
            .and_then(Option::as_ref)
            .ok_or(Failure::InvalidParameter)?
            .len())
    }

    pub fn flush_input(&mut self, buffer: InputBufferId) -> Result<()> {
        self.buffer_mut(buffer)?.flush();
        Ok(())
    }

    /// Deliver a control signal. Cooked reads complete alerted; raw reads
    /// ignore ctrl-C and keep waiting.
    pub fn send_signal(&mut self, buffer: InputBufferId, event: CtrlEvent) -> Vec<CompletedRead> {
        let reason = match event {
            CtrlEvent::CtrlC => {
                if let Ok(buf) = self.buffer_mut(buffer) {
                    buf.ctrl_seen = true;
                }
                WakeReason::CtrlC
            }
            CtrlEvent::CtrlBreak => WakeReason::CtrlBreak,
        };
        self.notify_waiters(buffer, reason, true)
    }

    /// Close an input handle, completing any of its suspended reads first.
    pub fn close_handle(&mut self, handle: HandleId) -> Result<Vec<CompletedRead>> {
        let buffer = {
            let h = self.handle_mut(handle)?;
            h.clear_carry();
            h.buffer
        };
        let mut completed = Vec::new();
        if self.handle_ref(handle)?.read_count > 0 {
            self.handle_mut(handle)?.flags.insert(HandleFlags::CLOSE_PENDING);
            completed = self.notify_waiters(buffer, WakeReason::HandleClosing, true);
        }
        debug_assert_eq!(self.handle_ref(handle)?.read_count, 0);
        self.handles[handle.0] = None;
        if let Ok(buf) = self.buffer_mut(buffer) {
            buf.handle_count -= 1;
            if buf.handle_count == 0 {
                buf.reinitialize();
            }
        }
        Ok(completed)
    }

    /// Tear down every suspended read owned by a dying thread.
    pub fn notify_thread_dying(&mut self, thread: u64) -> Vec<CompletedRead> {
        let mut completed = Vec::new();
        for id in 0..self.input_buffers.len() {
            loop {
                let Some(buf) = self.input_buffers[id].as_mut() else {
                    break;
                };
                let Some(pos) = buf.waiters.iter().position(|b| b.thread == thread) else {
                    break;
                };
                let block = buf.waiters.remove(pos).unwrap();
                if let Ok(h) = self.handle_mut(block.reply.handle) {
                    h.read_count -= 1;
                }
                if matches!(block.kind, WaitKind::Cooked(_)) {
                    self.cooked_active = false;
                }
                completed.push(CompletedRead::error(
                    &block.reply,
                    Status::ThreadTerminating,
                ));
            }
        }
        completed
    }

    // ------------------------------------------------------------------
    // The read dispatcher

    /// Read characters. `Ok` carries the completion (whose status may still
    /// be a failure); `Err(Wait)` means the read was parked and its
    /// completion will come out of a later wake-up.
    pub fn read_console(&mut self, req: ReadRequest) -> Result<CompletedRead> {
        let handle = self.handle_ref(req.handle)?;
        let buffer_id = handle.buffer;
        if req.capacity < 2 {
            return Err(Failure::BufferOverflow);
        }
        if req.initial.len() * 2 > req.capacity {
            return Err(Failure::InvalidParameter);
        }
        let reply = PendingReply {
            tag: req.tag,
            handle: req.handle,
            unicode: req.unicode,
            process_ctrl_z: req.process_ctrl_z,
        };

        // Leftover from a prior line read is served before any event.
        if handle.input_pending() {
            return self.read_from_carry(&reply, buffer_id, req.capacity);
        }

        let mode = self.input_mode(req.handle)?;
        let progress = if mode.contains(InputMode::LINE_INPUT) {
            if self.cooked_active {
                debug_assert!(false, "a cooked read is already active");
                return Err(Failure::Unsuccessful);
            }
            let session = self.build_cooked_session(&req, buffer_id, mode)?;
            self.cooked_active = true;
            self.cooked_read_loop(&reply, session)
        } else {
            let ctx = self.build_raw_context(&req, buffer_id)?;
            self.raw_read_loop(&reply, ctx)
        };

        match progress {
            Progress::Done(completed) => Ok(completed),
            Progress::Wait(kind) => {
                self.park(reply, kind, req.thread, false);
                Err(Failure::Wait)
            }
        }
    }

    /// Take ownership of a suspended read. `prepend` jumps the queue, for
    /// revivals that must run again before anyone else.
    fn park(&mut self, reply: PendingReply, kind: WaitKind, thread: u64, prepend: bool) {
        FLOG!(wait, "parking read on handle", reply.handle.0);
        if let Ok(h) = self.handle_mut(reply.handle) {
            h.read_count += 1;
        }
        let buffer = kind.buffer();
        if let Some(buf) = self.input_buffers.get_mut(buffer.0).and_then(Option::as_mut) {
            let block = WaitBlock {
                reply,
                kind,
                thread,
            };
            if prepend {
                buf.waiters.push_front(block);
            } else {
                buf.waiters.push_back(block);
            }
        }
    }

    // ------------------------------------------------------------------
    // Carry-first path

    fn read_from_carry(
        &mut self,
        reply: &PendingReply,
        buffer_id: InputBufferId,
        capacity: usize,
    ) -> Result<CompletedRead> {
        let Console {
            handles,
            input_buffers,
            codepage,
            ..
        } = self;
        let handle = handles
            .get_mut(reply.handle.0)
            .and_then(Option::as_mut)
            .ok_or(Failure::InvalidParameter)?;
        let buffer = input_buffers
            .get_mut(buffer_id.0)
            .and_then(Option::as_mut)
            .ok_or(Failure::InvalidParameter)?;

        let injected = if reply.unicode {
            None
        } else {
            buffer.lead_byte_carry.take()
        };
        if injected.is_some() && (capacity == 1 || handle.carry_remaining() == 0) {
            handle.clear_carry();
            return Ok(CompletedRead {
                tag: reply.tag,
                status: Status::Success,
                payload: ReadPayload::Oem(vec![injected.unwrap()]),
                bytes: 1,
                control_key_state: 0,
            });
        }

        let multi_line = handle.flags.contains(HandleFlags::MULTI_LINE_INPUT);
        let remaining = handle.carry.slice_from(handle.carry_cursor).to_owned();
        let (payload, bytes, consumed) = drain_carry(
            &remaining,
            multi_line,
            reply.unicode,
            capacity,
            injected,
            &**codepage,
            &mut buffer.lead_byte_carry,
        );
        handle.advance_carry(consumed);
        Ok(CompletedRead {
            tag: reply.tag,
            status: Status::Success,
            payload,
            bytes,
            control_key_state: 0,
        })
    }

    // ------------------------------------------------------------------
    // Raw path

    fn build_raw_context(
        &mut self,
        req: &ReadRequest,
        buffer_id: InputBufferId,
    ) -> Result<RawReadContext> {
        let buffer = self.buffer_mut(buffer_id)?;
        let injected_lead = if req.unicode {
            None
        } else {
            buffer.lead_byte_carry.take()
        };
        Ok(RawReadContext {
            handle: req.handle,
            buffer: buffer_id,
            unicode: req.unicode,
            capacity_bytes: req.capacity,
            acc: WString::new(),
            oem_len: 0,
            // A stashed lead byte satisfies the "block for the first
            // character" obligation; the read must not wait.
            started: injected_lead.is_some(),
            injected_lead,
        })
    }

    fn raw_read_loop(&mut self, reply: &PendingReply, mut ctx: RawReadContext) -> Progress {
        let extended = self.extended_edit_keys;
        let Console {
            input_buffers,
            codepage,
            ..
        } = self;
        let Some(buffer) = input_buffers.get_mut(ctx.buffer.0).and_then(Option::as_mut) else {
            return Progress::Done(CompletedRead::error(reply, Status::Unsuccessful));
        };
        match raw_read_run(buffer, &**codepage, extended, &mut ctx) {
            Ok(()) => Progress::Done(finish_raw_read(buffer, &**codepage, reply, ctx)),
            Err(Failure::Wait) => Progress::Wait(WaitKind::Raw(ctx)),
            Err(f) => Progress::Done(CompletedRead::error(reply, f.status())),
        }
    }

    // ------------------------------------------------------------------
    // Cooked path

    fn build_cooked_session(
        &mut self,
        req: &ReadRequest,
        buffer_id: InputBufferId,
        mode: InputMode,
    ) -> Result<Box<CookedReadSession>> {
        let user_capacity_units = if req.unicode {
            req.capacity / 2
        } else {
            req.capacity
        };
        let capacity_units = LINE_INPUT_BUFFER_CHARS.max(user_capacity_units);
        let mut storage: WString = std::iter::repeat(' ').take(capacity_units).collect();

        let seed = req.initial.len().min(capacity_units.saturating_sub(2));
        storage.as_char_slice_mut()[..seed]
            .copy_from_slice(&req.initial.as_char_slice()[..seed]);

        // With a pre-seeded line the prompt and seed are already on screen;
        // back the anchor up over the seed, borrowing rows as needed.
        let anchor = if seed > 0 {
            let size = self.screen.size();
            let mut pos = self.screen.cursor_position();
            pos.x -= seed as i16;
            while pos.x < 0 {
                pos.x += size.x;
                pos.y -= 1;
            }
            Some(pos)
        } else {
            None
        };

        Ok(Box::new(CookedReadSession {
            handle: req.handle,
            buffer: buffer_id,
            storage,
            units_used: seed,
            write_cursor: seed,
            anchor,
            visible_cells: seed,
            echo: mode.contains(InputMode::ECHO_INPUT),
            processed: mode.contains(InputMode::PROCESSED_INPUT),
            line_mode: mode.contains(InputMode::LINE_INPUT),
            insert_mode: self.insert_mode,
            ctrl_wakeup_mask: req.ctrl_wakeup_mask,
            control_key_state: Default::default(),
            exe_name: req.exe_name.clone(),
            user_capacity_units,
            popups: Vec::new(),
        }))
    }

    fn cooked_read_loop(
        &mut self,
        reply: &PendingReply,
        mut session: Box<CookedReadSession>,
    ) -> Progress {
        loop {
            if session.units_used >= session.capacity_units() {
                return self.finish_cooked_read(reply, session, Status::Success);
            }

            let extended = self.extended_edit_keys;
            let insert_toggle = self.insert_mode;
            let Console {
                input_buffers,
                screen,
                codepage,
                history,
                ..
            } = self;
            let Some(buffer) = input_buffers
                .get_mut(session.buffer.0)
                .and_then(Option::as_mut)
            else {
                return self.finish_cooked_read(reply, session, Status::Unsuccessful);
            };

            let interest = if session.popups.is_empty() {
                EditKeyInterest::Editing
            } else {
                EditKeyInterest::Popup
            };
            let out: CharOut =
                match get_char(buffer, &**codepage, true, interest, extended, true) {
                    Ok(out) => out,
                    Err(Failure::Wait) => return Progress::Wait(WaitKind::Cooked(session)),
                    Err(f) => {
                        session.units_used = 0;
                        return self.finish_cooked_read(reply, session, f.status());
                    }
                };

            // The prompt may have been written after the read began; anchor
            // at the first event.
            if session.anchor.is_none() {
                session.anchor = Some(screen.cursor_position());
            }

            let exe = session.exe_name.clone();
            let history_list = history.for_exe(&exe);

            if !session.popups.is_empty() {
                match cmdline::process_popup_input(
                    &mut session,
                    &mut **screen,
                    history_list,
                    insert_toggle,
                    out.popup_key,
                    out.wch,
                ) {
                    CmdAction::ReadComplete => {
                        buffer.ignore_next_keyup = true;
                        return self.finish_cooked_read(reply, session, Status::Success);
                    }
                    CmdAction::Continue => continue,
                }
            }

            if out.edit_key {
                cmdline::process_command_line(
                    &mut session,
                    &mut **screen,
                    history_list,
                    insert_toggle,
                    out.wch,
                    out.key_state,
                );
                continue;
            }

            match session.process_input(out.wch, out.key_state, &mut **screen, insert_toggle) {
                Tick::Complete => {
                    buffer.ignore_next_keyup = true;
                    return self.finish_cooked_read(reply, session, Status::Success);
                }
                Tick::Continue => {}
            }
        }
    }

    /// Completion: history, alias expansion, fitting into the client buffer,
    /// and the overflow / multi-line carry.
    fn finish_cooked_read(
        &mut self,
        reply: &PendingReply,
        mut session: Box<CookedReadSession>,
        status: Status,
    ) -> Progress {
        self.cooked_active = false;
        if status != Status::Success {
            FLOG!(cooked_read, "completing with", format!("{:?}", status));
            let mut completed = CompletedRead::error(reply, status);
            completed.control_key_state = session.control_key_state.bits();
            return Progress::Done(completed);
        }

        let mut line_count = 1;
        if session.echo {
            if let Some(cr) = session.line().find_char('\r') {
                let line = session.storage.slice_to(cr).to_owned();
                let dedup = if self.history_nodup {
                    DedupMode::SuppressRepeated
                } else {
                    DedupMode::KeepDuplicates
                };
                self.history.for_exe(&session.exe_name).append(&line, dedup);
                if let Some((expansion, lines)) = self.alias.match_and_copy(
                    &session.exe_name,
                    &line,
                    session.capacity_units(),
                ) {
                    FLOG!(cooked_read, "alias expansion,", lines, "lines");
                    let n = expansion.len();
                    let slice = session.storage.as_char_slice_mut();
                    slice[..n].copy_from_slice(expansion.as_char_slice());
                    for cell in &mut slice[n..] {
                        *cell = ' ';
                    }
                    session.units_used = n;
                    line_count = lines;
                }
            }
        }

        let user_units = session.user_capacity_units;
        let multi_line = line_count > 1;
        let mut delivered_units = session.units_used;
        if session.units_used > user_units || multi_line {
            delivered_units = if multi_line {
                session
                    .line()
                    .find_char('\n')
                    .map(|i| i + 1)
                    .unwrap_or(session.units_used)
                    .min(user_units)
            } else {
                user_units
            };
        }

        let buffer = self
            .input_buffers
            .get_mut(session.buffer.0)
            .and_then(Option::as_mut);
        let (payload, mut bytes) = if reply.unicode {
            let content = session.storage.slice_to(delivered_units).to_owned();
            let bytes = content.len() * 2;
            (ReadPayload::Unicode(content), bytes)
        } else {
            let mut capacity = user_units;
            let mut out = Vec::new();
            let mut lead_carry = buffer.as_ref().and_then(|b| b.lead_byte_carry);
            if let Some(lead) = lead_carry.take() {
                out.push(lead);
                capacity -= 1;
            }
            delivered_units = delivered_units.min(stream::oem_fit_units(
                session.storage.slice_to(session.units_used),
                capacity,
            ));
            let (translated, _) = translate_unicode_to_oem(
                &*self.codepage,
                session.storage.slice_to(delivered_units),
                capacity,
                &mut lead_carry,
            );
            out.extend(translated);
            let bytes = out.len();
            if let Some(buf) = self
                .input_buffers
                .get_mut(session.buffer.0)
                .and_then(Option::as_mut)
            {
                buf.lead_byte_carry = lead_carry;
            }
            (ReadPayload::Oem(out), bytes)
        };

        if delivered_units < session.units_used {
            let content = session.line().to_owned();
            if let Ok(h) = self.handle_mut(reply.handle) {
                h.set_carry(content, delivered_units, multi_line);
            }
        }

        if reply.process_ctrl_z {
            let leads_with_sub = match &payload {
                ReadPayload::Unicode(s) => s.as_char_slice().first() == Some(&'\u{1a}'),
                ReadPayload::Oem(b) => b.first() == Some(&0x1A),
            };
            if leads_with_sub {
                bytes = 0;
            }
        }

        Progress::Done(CompletedRead {
            tag: reply.tag,
            status,
            payload,
            bytes,
            control_key_state: session.control_key_state.bits(),
        })
    }

    // ------------------------------------------------------------------
    // Wait revival

    /// Revive suspended reads on `buffer` in queue order. Stops after the
    /// first consumed block unless `wake_all`.
    pub fn notify_waiters(
        &mut self,
        buffer: InputBufferId,
        reason: WakeReason,
        wake_all: bool,
    ) -> Vec<CompletedRead> {
        let mut completed = Vec::new();
        let Some(n) = self
            .input_buffers
            .get(buffer.0)
            .and_then(Option::as_ref)
            .map(|b| b.waiters.len())
        else {
            return completed;
        };
        for _ in 0..n {
            let block = {
                let Some(buf) = self.input_buffers.get_mut(buffer.0).and_then(Option::as_mut)
                else {
                    break;
                };
                let Some(block) = buf.waiters.pop_front() else {
                    break;
                };
                block
            };
            if let Ok(h) = self.handle_mut(block.reply.handle) {
                h.read_count -= 1;
            }
            match self.resume_block(block, reason) {
                Resumed::Done(c) => {
                    completed.push(c);
                    if !wake_all {
                        break;
                    }
                }
                Resumed::Requeue(block) => {
                    if let Ok(h) = self.handle_mut(block.reply.handle) {
                        h.read_count += 1;
                    }
                    if let Some(buf) =
                        self.input_buffers.get_mut(buffer.0).and_then(Option::as_mut)
                    {
                        buf.waiters.push_back(block);
                    }
                }
            }
        }
        completed
    }

    fn resume_block(&mut self, block: WaitBlock, reason: WakeReason) -> Resumed {
        let closing = self
            .handle_ref(block.reply.handle)
            .map(|h| h.flags.contains(HandleFlags::CLOSE_PENDING))
            .unwrap_or(true);

        match reason {
            WakeReason::CtrlC => match block.kind {
                // A raw read rides out ctrl-C and keeps waiting.
                WaitKind::Raw(_) => Resumed::Requeue(block),
                WaitKind::Cooked(session) => {
                    self.cooked_active = false;
                    if let Ok(buf) = self.buffer_mut(session.buffer) {
                        buf.ctrl_seen = false;
                    }
                    Resumed::Done(CompletedRead::error(&block.reply, Status::Alerted))
                }
            },
            WakeReason::CtrlBreak => {
                if matches!(block.kind, WaitKind::Cooked(_)) {
                    self.cooked_active = false;
                }
                Resumed::Done(CompletedRead::error(&block.reply, Status::Alerted))
            }
            WakeReason::HandleClosing | WakeReason::None => {
                if closing {
                    if matches!(block.kind, WaitKind::Cooked(_)) {
                        self.cooked_active = false;
                    }
                    return Resumed::Done(CompletedRead::error(&block.reply, Status::Alerted));
                }
                let WaitBlock {
                    reply,
                    kind,
                    thread,
                } = block;
                let progress = match kind {
                    WaitKind::Raw(ctx) => self.raw_read_loop(&reply, ctx),
                    WaitKind::Cooked(session) => self.cooked_read_loop(&reply, session),
                };
                match progress {
                    Progress::Done(c) => Resumed::Done(c),
                    Progress::Wait(kind) => Resumed::Requeue(WaitBlock {
                        reply,
                        kind,
                        thread,
                    }),
                }
            }
        }
    }
}

impl WaitKind {
    fn buffer(&self) -> InputBufferId {
        match self {
            WaitKind::Raw(ctx) => ctx.buffer,
            WaitKind::Cooked(session) => session.buffer,
        }
    }
}
