//! Error types surfaced to the host.
//!
//! Only programming and configuration mistakes become errors. Edits that have
//! no valid target (a motion with nothing to move to, `dd` on an empty line)
//! are reported through [`DispatchResult::Alert`](crate::core::dispatcher::DispatchResult)
//! instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// `delete`/`replace` arguments outside `[0, len]`
    #[error("range start {start} length {length} is outside a buffer of length {buffer_len}")]
    OutOfRange {
        start: isize,
        length: isize,
        buffer_len: usize,
    },

    #[error("invalid key chord: {0}")]
    InvalidChord(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid value for setting `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// A read-line call was started while another one is still running
    #[error("a read-line call is already in progress")]
    Busy,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EditError>;
