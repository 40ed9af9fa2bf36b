//! Completion statuses and the failure taxonomy.
//!
//! A read that cannot complete right now is not an error: `Wait` propagates up
//! through the state machines with `?` until the dispatcher parks the read in
//! the wait registry. Everything else terminates the read.

/// Status surfaced to the transport when a read (or mode change) completes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Success,
    /// The read is pending; the reply will be completed asynchronously.
    Wait,
    /// A control signal fired or the handle is going away.
    Alerted,
    BufferOverflow,
    InvalidParameter,
    NoMemory,
    ThreadTerminating,
    /// Catch-all for internal failures that have no richer classification.
    Unsuccessful,
}

/// The non-success outcome of a core operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Failure {
    Wait,
    Alerted,
    BufferOverflow,
    InvalidParameter,
    NoMemory,
    ThreadTerminating,
    Unsuccessful,
}

impl Failure {
    pub fn status(self) -> Status {
        match self {
            Failure::Wait => Status::Wait,
            Failure::Alerted => Status::Alerted,
            Failure::BufferOverflow => Status::BufferOverflow,
            Failure::InvalidParameter => Status::InvalidParameter,
            Failure::NoMemory => Status::NoMemory,
            Failure::ThreadTerminating => Status::ThreadTerminating,
            Failure::Unsuccessful => Status::Unsuccessful,
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Failure>;
