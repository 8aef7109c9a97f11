pub mod arena;
pub mod buffer;
pub mod log_file;
pub mod sd_card;

#[cfg(test)]
pub(crate) mod mock;

pub use arena::{ArenaFull, ByteArena};
pub use buffer::WriteBuffer;
pub use log_file::{PersistentLog, session_file_name};
pub use sd_card::SdCardMedium;

use crate::error::LogError;

/// Block storage that holds session files.
///
/// All calls block until the medium is done. Implementations decide what a
/// file handle is; the logger only ever holds one at a time.
pub trait StorageMedium {
    /// Handle of an open file
    type File;
    /// Medium-specific failure, logged at the session boundary
    type Error: core::fmt::Debug;

    /// Bring the medium up (card init, volume and root directory).
    fn mount(&mut self) -> Result<(), Self::Error>;

    /// Whether a file with this name already exists.
    fn exists(&mut self, name: &str) -> Result<bool, Self::Error>;

    /// Create a new empty file for appending. Fails if the name is taken.
    fn create(&mut self, name: &str) -> Result<Self::File, Self::Error>;

    /// Append bytes to the file. Does not make them durable.
    fn write(&mut self, file: &mut Self::File, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Make every prior write to the file durable.
    fn sync(&mut self, file: &mut Self::File) -> Result<(), Self::Error>;

    /// Release the handle.
    fn close(&mut self, file: Self::File) -> Result<(), Self::Error>;
}

/// Destination of write buffer flushes.
pub trait BlockSink {
    /// Write one contiguous block, in order, after everything written before.
    fn write_block(&mut self, bytes: &[u8]) -> Result<(), LogError>;

    /// Request that written blocks survive a power loss.
    fn sync(&mut self) -> Result<(), LogError>;
}
