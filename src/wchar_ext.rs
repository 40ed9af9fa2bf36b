//! Convenience methods on wide strings.

use crate::wchar::{wstr, WString};

pub trait WExt {
    /// Access the chars of a WString or wstr.
    fn as_char_slice(&self) -> &[char];

    /// Return a char slice from a *char index*.
    fn slice_from(&self, start: usize) -> &wstr {
        let chars = self.as_char_slice();
        wstr::from_char_slice(&chars[start..])
    }

    /// Return a char slice up to a *char index*.
    fn slice_to(&self, end: usize) -> &wstr {
        let chars = self.as_char_slice();
        wstr::from_char_slice(&chars[..end])
    }

    /// Return the char at an index.
    /// If the index is equal to the length, return '\0'.
    /// If the index exceeds the length, then panic.
    fn char_at(&self, index: usize) -> char {
        let chars = self.as_char_slice();
        if index == chars.len() {
            '\0'
        } else {
            chars[index]
        }
    }

    fn starts_with(&self, prefix: &wstr) -> bool {
        let chars = self.as_char_slice();
        let prefix = prefix.as_char_slice();
        chars.len() >= prefix.len() && &chars[..prefix.len()] == prefix
    }

    /// Position of the first occurrence of `c`, if any.
    fn find_char(&self, c: char) -> Option<usize> {
        self.as_char_slice().iter().position(|&x| x == c)
    }
}

impl WExt for WString {
    fn as_char_slice(&self) -> &[char] {
        self.as_ref()
    }
}

impl WExt for wstr {
    fn as_char_slice(&self) -> &[char] {
        self.as_ref()
    }
}
