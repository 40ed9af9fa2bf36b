//! Support for wide strings.
//!
//! The console wire format is UCS-2, so the whole core speaks wide characters:
//!   - `wstr`: a wide string slice without a nul terminator, like `&str`.
//!   - `WString`: an owning wide string without a nul terminator, like `String`.

pub use widestring::{Utf32Str as wstr, Utf32String as WString};

pub mod prelude {
    pub use crate::wchar::{wchar, wstr, WString, L};
    pub use crate::wchar_ext::WExt;
}

/// Creates a wstr string slice, like the "L" prefix of C++.
/// The result is of type wstr. It is NOT nul-terminated.
#[macro_export]
macro_rules! L {
    ($string:expr) => {
        widestring::utf32str!($string)
    };
}
pub use L;

/// Widen a single UTF-16 code unit into a char.
/// The queue never carries unpaired surrogates; tolerate them anyway.
pub fn wchar(unit: u16) -> char {
    char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER)
}
