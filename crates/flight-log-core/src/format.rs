//! CSV rendering of combined records.
//!
//! Lines are rendered into a caller-owned [`heapless::String`], so rendering
//! never allocates. A line that would not fit is cleared and reported instead
//! of being cut short.
//!
//! Floats go through `core::fmt`, which rounds the exact binary value to the
//! nearest decimal at the requested precision: `1.23456` at 4 places is
//! `1.2346`, never the truncated `1.2345`.

use core::fmt::{self, Write};

use heapless::String;

use crate::aggregator::CombinedRecord;
use crate::channel::ChannelSet;
use crate::config::Precision;
use crate::error::{FormatError, LogError};

/// Column name of the leading timestamp field
pub const TIMESTAMP_COLUMN: &str = "timestamp_us";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFormatter {
    precision: Precision,
}

impl RecordFormatter {
    pub const fn new(precision: Precision) -> Self {
        Self { precision }
    }

    pub const fn precision(&self) -> &Precision {
        &self.precision
    }

    /// Render one record as `timestamp,field,...,field\n`.
    ///
    /// On overflow `line` is left empty.
    pub fn render<const N: usize>(
        &self,
        record: &CombinedRecord,
        line: &mut String<N>,
    ) -> Result<usize, FormatError> {
        line.clear();

        if self.write_record(record, line).is_err() {
            line.clear();
            return Err(FormatError::LineOverflow { capacity: N });
        }

        Ok(line.len())
    }

    fn write_record<const N: usize>(
        &self,
        record: &CombinedRecord,
        line: &mut String<N>,
    ) -> fmt::Result {
        write!(line, "{}", record.timestamp)?;
        for field in &record.fields {
            let places = self.precision.places(field.quantity);
            write!(line, ",{:.*}", places, field.value)?;
        }
        line.push_str("\n").map_err(|_| fmt::Error)
    }
}

/// Render the header line for the tracked channels, or the configured override.
///
/// A trailing newline is appended to the override if it lacks one. The
/// override must name one column per record field, timestamp included.
pub fn render_header<const N: usize>(
    channels: ChannelSet,
    custom: Option<&str>,
    header: &mut String<N>,
) -> Result<usize, LogError> {
    header.clear();

    if let Some(text) = custom {
        let expected = channels.field_count() + 1;
        let found = text.trim_end_matches('\n').split(',').count();
        if found != expected {
            return Err(LogError::HeaderMismatch { expected, found });
        }
    }

    let written = match custom {
        Some(text) => write_custom_header(text, header),
        None => write_column_header(channels, header),
    };

    if written.is_err() {
        header.clear();
        return Err(LogError::HeaderTooLong { capacity: N });
    }

    Ok(header.len())
}

fn write_custom_header<const N: usize>(text: &str, header: &mut String<N>) -> fmt::Result {
    header.push_str(text).map_err(|_| fmt::Error)?;
    if !text.ends_with('\n') {
        header.push_str("\n").map_err(|_| fmt::Error)?;
    }
    Ok(())
}

fn write_column_header<const N: usize>(
    channels: ChannelSet,
    header: &mut String<N>,
) -> fmt::Result {
    header.write_str(TIMESTAMP_COLUMN)?;
    for channel in channels.iter() {
        for column in channel.columns() {
            write!(header, ",{}", column)?;
        }
    }
    header.write_str("\n")
}
