//! Virtual keys, modifier state, and input event records.
//!
//! Events arrive in the console's wire shape: a tagged record whose key
//! variant carries a virtual key code, a scan code, a UCS-2 code unit and the
//! modifier bitmask. Only key events ever turn into characters; the other
//! kinds pass through the raw event API unchanged.

use crate::screen::Coord;
use bitflags::bitflags;

pub type VirtualKey = u16;

pub const VK_BACK: VirtualKey = 0x08;
pub const VK_TAB: VirtualKey = 0x09;
pub const VK_RETURN: VirtualKey = 0x0D;
pub const VK_SHIFT: VirtualKey = 0x10;
pub const VK_CONTROL: VirtualKey = 0x11;
pub const VK_MENU: VirtualKey = 0x12;
pub const VK_ESCAPE: VirtualKey = 0x1B;
pub const VK_PRIOR: VirtualKey = 0x21;
pub const VK_NEXT: VirtualKey = 0x22;
pub const VK_END: VirtualKey = 0x23;
pub const VK_HOME: VirtualKey = 0x24;
pub const VK_LEFT: VirtualKey = 0x25;
pub const VK_UP: VirtualKey = 0x26;
pub const VK_RIGHT: VirtualKey = 0x27;
pub const VK_DOWN: VirtualKey = 0x28;
pub const VK_INSERT: VirtualKey = 0x2D;
pub const VK_DELETE: VirtualKey = 0x2E;
pub const VK_F1: VirtualKey = 0x70;
pub const VK_F2: VirtualKey = 0x71;
pub const VK_F3: VirtualKey = 0x72;
pub const VK_F4: VirtualKey = 0x73;
pub const VK_F5: VirtualKey = 0x74;
pub const VK_F6: VirtualKey = 0x75;
pub const VK_F7: VirtualKey = 0x76;
pub const VK_F8: VirtualKey = 0x77;
pub const VK_F9: VirtualKey = 0x78;

pub const UNICODE_NUL: u16 = 0x00;
pub const UNICODE_BACKSPACE: u16 = 0x08;
pub const UNICODE_TAB: u16 = 0x09;
pub const UNICODE_LINEFEED: u16 = 0x0A;
pub const UNICODE_CARRIAGERETURN: u16 = 0x0D;
pub const UNICODE_ESCAPE: u16 = 0x1B;
pub const UNICODE_CTRL_Z: u16 = 0x1A;
/// DEL doubles as backspace when processed input is on.
pub const UNICODE_BACKSPACE2: u16 = 0x7F;

/// Erase-previous-word, produced by the extended ctrl+backspace substitution.
/// Parked in the private use area so it can never collide with typed text.
pub const EXTKEY_ERASE_PREV_WORD: u16 = 0xF4FF;

bitflags! {
    /// The control-key state carried by every key and mouse record.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct Modifiers: u32 {
        const RIGHT_ALT_PRESSED = 0x0001;
        const LEFT_ALT_PRESSED = 0x0002;
        const RIGHT_CTRL_PRESSED = 0x0004;
        const LEFT_CTRL_PRESSED = 0x0008;
        const SHIFT_PRESSED = 0x0010;
        const NUMLOCK_ON = 0x0020;
        const SCROLLLOCK_ON = 0x0040;
        const CAPSLOCK_ON = 0x0080;
        const ENHANCED_KEY = 0x0100;
        /// Set on the VK_MENU key-up that delivers an alt+numpad accumulation.
        const ALTNUMPAD_BIT = 0x0400_0000;
    }
}

impl Modifiers {
    pub const EITHER_CTRL: Modifiers = Modifiers::LEFT_CTRL_PRESSED.union(Modifiers::RIGHT_CTRL_PRESSED);
    pub const EITHER_ALT: Modifiers = Modifiers::LEFT_ALT_PRESSED.union(Modifiers::RIGHT_ALT_PRESSED);
    pub const MOD_PRESSED: Modifiers = Modifiers::SHIFT_PRESSED
        .union(Modifiers::EITHER_CTRL)
        .union(Modifiers::EITHER_ALT);

    pub fn ctrl(&self) -> bool {
        self.intersects(Modifiers::EITHER_CTRL)
    }
    pub fn alt(&self) -> bool {
        self.intersects(Modifiers::EITHER_ALT)
    }
    pub fn shift(&self) -> bool {
        self.contains(Modifiers::SHIFT_PRESSED)
    }
}

/// The keyboard-layout modifier patterns, indexed by the high byte of a
/// layout scan result: shift is bit 0, ctrl bit 1, alt bit 2.
pub const CONS_KBD_STATE: [Modifiers; 8] = [
    Modifiers::empty(),
    Modifiers::SHIFT_PRESSED,
    Modifiers::EITHER_CTRL,
    Modifiers::SHIFT_PRESSED.union(Modifiers::EITHER_CTRL),
    Modifiers::EITHER_ALT,
    Modifiers::SHIFT_PRESSED.union(Modifiers::EITHER_ALT),
    Modifiers::EITHER_CTRL.union(Modifiers::EITHER_ALT),
    Modifiers::SHIFT_PRESSED
        .union(Modifiers::EITHER_CTRL)
        .union(Modifiers::EITHER_ALT),
];

/// The layout binding that yields the literal NUL character: ctrl+shift+2 on
/// the US layout (the low byte of a layout scan for U+0000, modifiers in the
/// high byte).
pub const NUL_VIRTUAL_KEY: VirtualKey = 0x32;
pub const NUL_WINMODS: usize = 3;

/// True when the event's pressed modifiers land inside the given layout
/// pattern and no pressed modifier falls outside it.
pub fn key_state_matches_winmods(modifiers: Modifiers, winmods: usize) -> bool {
    let pattern = CONS_KBD_STATE[winmods];
    modifiers.intersects(pattern) && !modifiers.intersects(Modifiers::MOD_PRESSED.difference(pattern))
}

/// A single keystroke, down or up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyRecord {
    pub key_down: bool,
    pub repeat_count: u16,
    pub virtual_key: VirtualKey,
    pub scan_code: u16,
    pub char_code: u16,
    pub modifiers: Modifiers,
}

impl KeyRecord {
    /// A key-down carrying a character, as the common test inputs need.
    pub fn from_char(c: char) -> Self {
        KeyRecord {
            key_down: true,
            repeat_count: 1,
            virtual_key: 0,
            scan_code: 0,
            char_code: c as u16,
            modifiers: Modifiers::empty(),
        }
    }

    /// A characterless key-down for the given virtual key.
    pub fn from_vk(vk: VirtualKey) -> Self {
        KeyRecord {
            key_down: true,
            repeat_count: 1,
            virtual_key: vk,
            scan_code: 0,
            char_code: 0,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn released(mut self) -> Self {
        self.key_down = false;
        self
    }
}

/// An input record as appended to the event queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputEvent {
    Key(KeyRecord),
    Mouse {
        position: Coord,
        buttons: u32,
        flags: u32,
    },
    FocusChange {
        focused: bool,
    },
    WindowBufferSize {
        size: Coord,
    },
    Menu {
        command_id: u32,
    },
}

impl InputEvent {
    pub fn as_key(&self) -> Option<&KeyRecord> {
        match self {
            InputEvent::Key(k) => Some(k),
            _ => None,
        }
    }
}

/// Keys the cooked read routes to the command-line editor rather than the
/// line buffer. Plain (no alt, no ctrl): escape, paging, end/home, arrows,
/// insert, delete and F1 through F9. With ctrl held: end/home/left/right.
pub fn is_command_line_editing_key(key: &KeyRecord) -> bool {
    if !key.modifiers.intersects(Modifiers::EITHER_ALT | Modifiers::EITHER_CTRL) {
        match key.virtual_key {
            VK_ESCAPE | VK_PRIOR | VK_NEXT | VK_END | VK_HOME | VK_LEFT | VK_UP | VK_RIGHT
            | VK_DOWN | VK_INSERT | VK_DELETE => return true,
            vk if (VK_F1..=VK_F9).contains(&vk) => return true,
            _ => {}
        }
    }
    if key.modifiers.intersects(Modifiers::EITHER_CTRL) {
        match key.virtual_key {
            VK_END | VK_HOME | VK_LEFT | VK_RIGHT => return true,
            _ => {}
        }
    }
    false
}

/// Keys an active popup intercepts. Plain: escape, paging, end/home, arrows,
/// F2, F4, F7 and F9.
pub fn is_command_line_popup_key(key: &KeyRecord) -> bool {
    if !key.modifiers.intersects(Modifiers::EITHER_ALT | Modifiers::EITHER_CTRL) {
        match key.virtual_key {
            VK_ESCAPE | VK_PRIOR | VK_NEXT | VK_END | VK_HOME | VK_LEFT | VK_UP | VK_RIGHT
            | VK_DOWN | VK_F2 | VK_F4 | VK_F7 | VK_F9 => return true,
            _ => {}
        }
    }
    false
}
