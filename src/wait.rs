//! Suspended reads and their revival.
//!
//! A read that finds the event queue empty returns `Wait` up through the
//! state machines; the dispatcher packages the in-flight read context into a
//! [`WaitBlock`] and parks it on the input buffer. Writers, control signals,
//! handle closes and thread exits revive blocks in queue order; a revival
//! consumes the block exactly once or puts it back.

use crate::cooked::CookedReadSession;
use crate::handle::HandleId;
use crate::status::Status;
use crate::stream::RawReadContext;
use crate::wchar::prelude::*;

/// Why the registry is waking a block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WakeReason {
    /// Data may have arrived; retry the read.
    None,
    CtrlC,
    CtrlBreak,
    HandleClosing,
}

/// The saved read context, one variant per read shape.
pub enum WaitKind {
    Raw(RawReadContext),
    Cooked(Box<CookedReadSession>),
}

impl WaitKind {
    pub fn handle(&self) -> HandleId {
        match self {
            WaitKind::Raw(ctx) => ctx.handle,
            WaitKind::Cooked(session) => session.handle,
        }
    }
}

/// The reply envelope for a read whose completion is deferred.
#[derive(Clone, Debug)]
pub struct PendingReply {
    /// Caller's correlation token, echoed back in the completion.
    pub tag: u64,
    pub handle: HandleId,
    pub unicode: bool,
    /// Report zero bytes when the payload leads with a ctrl-Z.
    pub process_ctrl_z: bool,
}

/// A suspended read: reply envelope, resume context, owning thread.
pub struct WaitBlock {
    pub reply: PendingReply,
    pub kind: WaitKind,
    pub thread: u64,
}

/// Completion payload delivered to the transport.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadPayload {
    Unicode(WString),
    Oem(Vec<u8>),
}

impl ReadPayload {
    pub fn empty(unicode: bool) -> Self {
        if unicode {
            ReadPayload::Unicode(WString::new())
        } else {
            ReadPayload::Oem(Vec::new())
        }
    }

    /// The wide content, for callers that know they asked for Unicode.
    pub fn as_unicode(&self) -> &wstr {
        match self {
            ReadPayload::Unicode(s) => s,
            ReadPayload::Oem(_) => panic!("payload is OEM"),
        }
    }

    pub fn as_oem(&self) -> &[u8] {
        match self {
            ReadPayload::Oem(b) => b,
            ReadPayload::Unicode(_) => panic!("payload is Unicode"),
        }
    }
}

/// A finished read, delivered synchronously or via a revived wait block.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedRead {
    pub tag: u64,
    pub status: Status,
    pub payload: ReadPayload,
    /// Bytes of payload; the transport's size field. Zeroed on most errors.
    pub bytes: usize,
    /// Modifier state at the instant the read completed.
    pub control_key_state: u32,
}

impl CompletedRead {
    /// An empty completion with the given status.
    pub fn error(reply: &PendingReply, status: Status) -> Self {
        CompletedRead {
            tag: reply.tag,
            status,
            payload: ReadPayload::empty(reply.unicode),
            bytes: 0,
            control_key_state: 0,
        }
    }
}
