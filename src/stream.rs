//! The stream character extractor and the raw read path.
//!
//! `get_char` turns the event queue into a lazy sequence of UCS-2 code units,
//! one per call, applying the console's key policy: key-ups are mute except
//! the alt+numpad carrier, escape and linefeed stay inside unless the handle
//! is in VT input mode, editing keys surface as virtual key codes when the
//! caller opted in, and the literal NUL comes through only on its dedicated
//! layout chord. The sequence restarts cleanly after a wait: a suspended read
//! resumes exactly where it left off.

use crate::dbcs::{translate_unicode_to_oem, Codepage};
use crate::handle::{HandleId, InputMode};
use crate::input_buffer::{InputBuffer, InputBufferId};
use crate::key::{
    is_command_line_editing_key, is_command_line_popup_key, key_state_matches_winmods, Modifiers,
    EXTKEY_ERASE_PREV_WORD, NUL_VIRTUAL_KEY, NUL_WINMODS, UNICODE_LINEFEED, VK_BACK, VK_ESCAPE,
    VK_MENU,
};
use crate::status::{Result, Status};
use crate::wait::{CompletedRead, PendingReply, ReadPayload};
use crate::wchar::prelude::*;
use crate::FLOG;

/// Whether the caller wants editing or popup keys surfaced as key codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EditKeyInterest {
    None,
    Editing,
    Popup,
}

/// One extracted unit, plus what it was.
#[derive(Clone, Copy, Debug)]
pub struct CharOut {
    pub wch: u16,
    pub key_state: Modifiers,
    pub edit_key: bool,
    pub popup_key: bool,
}

/// Extract the next code unit from the buffer's event stream.
///
/// `blocking` empty reads return `Wait`; non-blocking empty reads return
/// `Unsuccessful`. `alert_on_ctrl` is set by cooked readers, which a pending
/// ctrl signal terminates; raw readers ride it out.
pub fn get_char(
    buffer: &mut InputBuffer,
    codepage: &dyn Codepage,
    blocking: bool,
    interest: EditKeyInterest,
    extended_edit_keys: bool,
    alert_on_ctrl: bool,
) -> Result<CharOut> {
    loop {
        let mut key = buffer.next_stream_key(blocking, alert_on_ctrl)?;

        // The extended erase-previous-word chord substitutes its private
        // code point before any other classification sees the key.
        if extended_edit_keys
            && key.key_down
            && key.virtual_key == VK_BACK
            && key.modifiers.ctrl()
            && !key.modifiers.alt()
        {
            key.char_code = EXTKEY_ERASE_PREV_WORD;
        }

        let edit_key = match interest {
            EditKeyInterest::Editing => is_command_line_editing_key(&key),
            EditKeyInterest::Popup => is_command_line_popup_key(&key),
            EditKeyInterest::None => false,
        };
        let key_state = key.modifiers;

        if key.char_code != 0 && !edit_key {
            // Characters accumulated with alt+numpad arrive on the menu
            // key-up. A two-byte accumulation is an OEM pair.
            if !key.key_down && key.virtual_key == VK_MENU {
                let wch = if key.modifiers.contains(Modifiers::ALTNUMPAD_BIT) {
                    let hi = (key.char_code >> 8) as u8;
                    let lo = key.char_code as u8;
                    let c = if hi != 0 {
                        codepage.oem_to_unicode(hi, Some(lo))
                    } else {
                        codepage.oem_to_unicode(lo, None)
                    };
                    c as u16
                } else {
                    key.char_code
                };
                return Ok(CharOut {
                    wch,
                    key_state,
                    edit_key: false,
                    popup_key: false,
                });
            }
            // Escape and linefeed never escape the extractor, unless the
            // handle asked for raw VT input.
            if key.key_down
                && (buffer.mode.contains(InputMode::VIRTUAL_TERMINAL_INPUT)
                    || (key.virtual_key != VK_ESCAPE && key.char_code != UNICODE_LINEFEED))
            {
                return Ok(CharOut {
                    wch: key.char_code,
                    key_state,
                    edit_key: false,
                    popup_key: false,
                });
            }
        }

        if key.key_down {
            if edit_key {
                return Ok(CharOut {
                    wch: key.virtual_key,
                    key_state,
                    edit_key: interest == EditKeyInterest::Editing,
                    popup_key: interest == EditKeyInterest::Popup,
                });
            }
            // This really is the character U+0000.
            if key.virtual_key == NUL_VIRTUAL_KEY
                && key_state_matches_winmods(key.modifiers, NUL_WINMODS)
            {
                return Ok(CharOut {
                    wch: 0,
                    key_state,
                    edit_key: false,
                    popup_key: false,
                });
            }
        }
    }
}

/// A raw (character-mode) read in flight.
pub struct RawReadContext {
    pub handle: HandleId,
    pub buffer: InputBufferId,
    pub unicode: bool,
    /// Client capacity in bytes; characters for Unicode delivery are capped
    /// at half this.
    pub capacity_bytes: usize,
    /// Characters accumulated so far.
    pub acc: WString,
    /// OEM byte length of `acc`, maintained as characters arrive.
    pub oem_len: usize,
    /// A trail byte stashed by the previous non-Unicode read, emitted first.
    pub injected_lead: Option<u8>,
    /// The first (blocking) character has been obtained.
    pub started: bool,
}

impl RawReadContext {
    fn capacity_left(&self) -> bool {
        let injected = usize::from(self.injected_lead.is_some());
        if self.unicode {
            self.acc.len() < self.capacity_bytes / 2
        } else {
            self.oem_len + injected < self.capacity_bytes
        }
    }
}

/// Pull characters for a raw read: block for the first, then drain whatever
/// is immediately available. Propagates `Wait` only while `acc` is empty.
pub fn raw_read_run(
    buffer: &mut InputBuffer,
    codepage: &dyn Codepage,
    extended_edit_keys: bool,
    ctx: &mut RawReadContext,
) -> Result<()> {
    if !ctx.started {
        let out = get_char(
            buffer,
            codepage,
            true,
            EditKeyInterest::None,
            extended_edit_keys,
            false,
        )?;
        push_raw_char(ctx, out.wch);
        ctx.started = true;
    }
    while ctx.capacity_left() {
        match get_char(
            buffer,
            codepage,
            false,
            EditKeyInterest::None,
            extended_edit_keys,
            false,
        ) {
            Ok(out) => push_raw_char(ctx, out.wch),
            Err(_) => break,
        }
    }
    FLOG!(raw_read, "raw read accumulated", ctx.acc.len(), "chars");
    Ok(())
}

fn push_raw_char(ctx: &mut RawReadContext, wch: u16) {
    let c = wchar(wch);
    ctx.oem_len += if crate::screen::is_char_full_width(c) { 2 } else { 1 };
    ctx.acc.push(c);
}

/// Assemble the completion for a finished raw read.
pub fn finish_raw_read(
    buffer: &mut InputBuffer,
    codepage: &dyn Codepage,
    reply: &PendingReply,
    ctx: RawReadContext,
) -> CompletedRead {
    if ctx.unicode {
        let bytes = ctx.acc.len() * 2;
        return CompletedRead {
            tag: reply.tag,
            status: Status::Success,
            payload: ReadPayload::Unicode(ctx.acc),
            bytes,
            control_key_state: 0,
        };
    }
    let mut out = Vec::new();
    let mut capacity = ctx.capacity_bytes;
    if let Some(lead) = ctx.injected_lead {
        out.push(lead);
        capacity -= 1;
    }
    let (translated, _) =
        translate_unicode_to_oem(codepage, &ctx.acc, capacity, &mut buffer.lead_byte_carry);
    out.extend(translated);
    let bytes = out.len();
    CompletedRead {
        tag: reply.tag,
        status: Status::Success,
        payload: ReadPayload::Oem(out),
        bytes,
        control_key_state: 0,
    }
}

/// Serve a read from the handle's carry, the leftover of a prior line read.
///
/// Returns the payload, the byte count, and how many carried characters were
/// consumed. Multi-line carry delivers one embedded line at a time.
pub fn drain_carry(
    carry: &wstr,
    multi_line: bool,
    unicode: bool,
    capacity_bytes: usize,
    injected_lead: Option<u8>,
    codepage: &dyn Codepage,
    lead_byte_carry: &mut Option<u8>,
) -> (ReadPayload, usize, usize) {
    let mut capacity = capacity_bytes;
    let mut prefix = Vec::new();
    if let Some(lead) = injected_lead {
        prefix.push(lead);
        capacity -= 1;
    }

    // A multi-line carry stops after (and includes) the first linefeed.
    let line_limit = if multi_line {
        carry.find_char('\n').map(|i| i + 1).unwrap_or(carry.len())
    } else {
        carry.len()
    };

    if unicode {
        debug_assert!(prefix.is_empty());
        let units = line_limit.min(capacity / 2);
        let payload: WString = carry.slice_to(units).to_owned();
        let bytes = units * 2;
        (ReadPayload::Unicode(payload), bytes, units)
    } else {
        let (translated, consumed) = translate_unicode_to_oem(
            codepage,
            carry.slice_to(line_limit),
            capacity,
            lead_byte_carry,
        );
        prefix.extend(translated);
        let bytes = prefix.len();
        (ReadPayload::Oem(prefix), bytes, consumed)
    }
}

/// OEM sizing cover used by the cooked completion path.
pub fn oem_fit_units(src: &wstr, capacity_bytes: usize) -> usize {
    let mut bytes = 0;
    for (i, &c) in src.as_char_slice().iter().enumerate() {
        bytes += if crate::screen::is_char_full_width(c) { 2 } else { 1 };
        if bytes > capacity_bytes {
            return i;
        }
    }
    src.len()
}
