//! Error types for the logging subsystem

use thiserror_no_std::Error;

/// Session lifecycle and write-path failures.
///
/// Medium-specific errors are logged where they happen and collapse into
/// one of these variants.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    /// The medium could not be mounted (card absent, no volume, bad filesystem)
    #[error("Storage medium unavailable")]
    MediumUnavailable,

    /// The session file could not be created
    #[error("Failed to create session file")]
    FileCreate,

    /// Every name in the counter space is taken
    #[error("No free session file name (max: {max})")]
    NoFreeFileName {
        /// Highest counter value tried
        max: u32,
    },

    /// The configured prefix and extension do not form a valid file name
    #[error("Invalid session file name")]
    InvalidFileName,

    /// A block write to the open file failed
    #[error("Write to session file failed")]
    Write,

    /// The medium refused to make prior writes durable
    #[error("Sync of session file failed")]
    Sync,

    /// Releasing the file handle failed
    #[error("Close of session file failed")]
    Close,

    /// A single record is larger than the whole write buffer
    #[error("Record of {len} bytes exceeds buffer capacity ({capacity})")]
    RecordTooLarge {
        /// Record length in bytes
        len: usize,
        /// Write buffer capacity in bytes
        capacity: usize,
    },

    /// The header line does not fit the header buffer
    #[error("Header exceeds {capacity} bytes")]
    HeaderTooLong {
        /// Header buffer capacity in bytes
        capacity: usize,
    },

    /// The header override does not name one column per record field
    #[error("Header has {found} columns, records have {expected}")]
    HeaderMismatch {
        /// Columns in a data line, timestamp included
        expected: usize,
        /// Columns in the header override
        found: usize,
    },

    /// No session is open
    #[error("Logger is not recording")]
    NotRecording,

    /// `open` was called on a logger that already left the idle state
    #[error("Logger was already opened")]
    AlreadyOpen,
}

/// Record rendering failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// The rendered line would not fit the line buffer; the record is dropped
    #[error("Rendered line exceeds {capacity} bytes")]
    LineOverflow {
        /// Line buffer capacity in bytes
        capacity: usize,
    },
}
