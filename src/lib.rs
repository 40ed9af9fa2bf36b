//! Console host input core.
//!
//! This crate brokers character-level input between client reads and a
//! terminal input queue: an ordered event buffer, a stream character
//! extractor, a cooked (line-edit) read state machine, a raw read path, the
//! wait/resume protocol that suspends empty reads, and the OEM/DBCS
//! translation seam for clients on a legacy codepage. Rendering, transport
//! and process management stay behind collaborator traits.

#![allow(clippy::collapsible_if)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::uninlined_format_args)]

pub mod alias;
pub mod cmdline;
pub mod console;
pub mod cooked;
pub mod dbcs;
pub mod flog;
pub mod handle;
pub mod history;
pub mod input_buffer;
pub mod key;
pub mod screen;
pub mod status;
pub mod stream;
pub mod wait;
pub mod wchar;
pub mod wchar_ext;

pub use console::{Console, CtrlEvent, ReadRequest};
pub use handle::{HandleId, InputMode};
pub use input_buffer::InputBufferId;
pub use status::{Failure, Result, Status};
pub use wait::{CompletedRead, ReadPayload};

#[cfg(test)]
mod tests;
