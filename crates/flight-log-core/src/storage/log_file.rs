use core::fmt::Write;

use heapless::String;
use log::{debug, error, info, warn};

use super::{BlockSink, StorageMedium};
use crate::config::{FILE_COUNTER_DIGITS, FILE_NAME_CAPACITY, HEADER_CAPACITY, LoggerConfig};
use crate::error::LogError;
use crate::format::render_header;

/// Highest session counter that fits the fixed-width suffix
const MAX_SESSION_NUMBER: u32 = 10u32.pow(FILE_COUNTER_DIGITS as u32) - 1;

/// Format a session file name: `LOG_` + `0002` + `.CSV` is `LOG_0002.CSV`.
///
/// The result must be a valid 8.3 short name, so the prefix is limited to
/// four characters and the extension to three.
pub fn session_file_name(
    prefix: &str,
    extension: &str,
    number: u32,
) -> Result<String<FILE_NAME_CAPACITY>, LogError> {
    if prefix.is_empty()
        || prefix.len() + FILE_COUNTER_DIGITS > 8
        || extension.is_empty()
        || extension.len() > 3
        || number > MAX_SESSION_NUMBER
    {
        return Err(LogError::InvalidFileName);
    }

    let mut name = String::new();
    write!(
        name,
        "{}{:0width$}.{}",
        prefix,
        number,
        extension,
        width = FILE_COUNTER_DIGITS
    )
    .map_err(|_| LogError::InvalidFileName)?;

    Ok(name)
}

/// The open session file on the storage medium.
///
/// Created by [`PersistentLog::open`], which picks a fresh file name and
/// makes the header durable before anything else is written. Blocks are
/// appended in call order and only become durable on [`BlockSink::sync`].
pub struct PersistentLog<M: StorageMedium> {
    medium: M,
    file: Option<M::File>,
    name: String<FILE_NAME_CAPACITY>,
    bytes_written: u64,
}

impl<M: StorageMedium> PersistentLog<M> {
    /// Mount the medium, create the next unused session file and write the
    /// header line, synced.
    ///
    /// Every failure is final: nothing is retried.
    pub fn open(mut medium: M, config: &LoggerConfig) -> Result<Self, LogError> {
        let mut header: String<HEADER_CAPACITY> = String::new();
        render_header(config.channels, config.header, &mut header)?;

        medium.mount().map_err(|e| {
            error!("Failed to mount storage medium: {:?}", e);
            LogError::MediumUnavailable
        })?;

        let name = Self::next_free_name(&mut medium, config)?;

        let mut file = medium.create(&name).map_err(|e| {
            error!("Failed to create session file {}: {:?}", name.as_str(), e);
            LogError::FileCreate
        })?;

        let header_written = medium
            .write(&mut file, header.as_bytes())
            .map_err(|e| {
                error!("Failed to write header to {}: {:?}", name.as_str(), e);
                LogError::Write
            })
            .and_then(|_| {
                medium.sync(&mut file).map_err(|e| {
                    error!("Failed to sync header of {}: {:?}", name.as_str(), e);
                    LogError::Sync
                })
            });

        if let Err(e) = header_written {
            if let Err(close_err) = medium.close(file) {
                warn!(
                    "Failed to close {} after header error: {:?}",
                    name.as_str(),
                    close_err
                );
            }
            return Err(e);
        }

        info!("Recording to {}", name.as_str());

        Ok(Self {
            medium,
            file: Some(file),
            name,
            bytes_written: header.len() as u64,
        })
    }

    /// Try `prefix0000.ext`, `prefix0001.ext`, ... and return the first
    /// name not present on the medium.
    fn next_free_name(
        medium: &mut M,
        config: &LoggerConfig,
    ) -> Result<String<FILE_NAME_CAPACITY>, LogError> {
        for number in 0..=MAX_SESSION_NUMBER {
            let name = session_file_name(config.file_prefix, config.file_extension, number)?;

            let taken = medium.exists(&name).map_err(|e| {
                error!("Failed to look up {}: {:?}", name.as_str(), e);
                LogError::MediumUnavailable
            })?;

            if !taken {
                return Ok(name);
            }
        }

        error!("Every session file name is taken");
        Err(LogError::NoFreeFileName {
            max: MAX_SESSION_NUMBER,
        })
    }

    /// Name of the session file, e.g. `LOG_0002.CSV`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes written to the file so far, header included.
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Sync and release the file handle. Later writes fail with
    /// [`LogError::NotRecording`].
    pub fn close(&mut self) -> Result<(), LogError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        let synced = self.medium.sync(&mut file).map_err(|e| {
            error!("Failed to sync {} on close: {:?}", self.name.as_str(), e);
            LogError::Sync
        });

        self.medium.close(file).map_err(|e| {
            error!("Failed to close {}: {:?}", self.name.as_str(), e);
            LogError::Close
        })?;

        synced?;
        info!("Closed {} ({} bytes)", self.name.as_str(), self.bytes_written);
        Ok(())
    }

    /// Give the medium back, closing the file first if still open.
    pub fn into_medium(mut self) -> M {
        if let Err(e) = self.close() {
            warn!("Session file not closed cleanly: {}", e);
        }
        self.medium
    }
}

impl<M: StorageMedium> BlockSink for PersistentLog<M> {
    fn write_block(&mut self, bytes: &[u8]) -> Result<(), LogError> {
        let file = self.file.as_mut().ok_or(LogError::NotRecording)?;

        self.medium.write(file, bytes).map_err(|e| {
            error!("SD write error on {}: {:?}", self.name.as_str(), e);
            LogError::Write
        })?;

        self.bytes_written += bytes.len() as u64;
        debug!("Wrote {} bytes to {}", bytes.len(), self.name.as_str());
        Ok(())
    }

    fn sync(&mut self) -> Result<(), LogError> {
        let file = self.file.as_mut().ok_or(LogError::NotRecording)?;

        self.medium.sync(file).map_err(|e| {
            error!("Sync error on {}: {:?}", self.name.as_str(), e);
            LogError::Sync
        })
    }
}
