//! Configuration for the flight data logger

use crate::Tick;
use crate::aggregator::EmitPolicy;
use crate::channel::{ChannelSet, Quantity};

/// Default write buffer size in bytes (flushed when full or on the interval)
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Rendered line capacity. A record that does not fit is dropped.
pub const LINE_CAPACITY: usize = 192;

/// Header line capacity, including the trailing newline
pub const HEADER_CAPACITY: usize = 256;

/// Flush the write buffer at least this often (one second of microsecond ticks)
pub const DEFAULT_FLUSH_INTERVAL_TICKS: Tick = 1_000_000;

/// Session file prefix, at most 4 characters to stay inside an 8.3 base name
pub const DEFAULT_FILE_PREFIX: &str = "LOG_";

/// Session file extension
pub const DEFAULT_FILE_EXTENSION: &str = "CSV";

/// Digits in the session counter. `LOG_0000.CSV` through `LOG_9999.CSV`.
pub const FILE_COUNTER_DIGITS: usize = 4;

/// Capacity of a rendered session file name
pub const FILE_NAME_CAPACITY: usize = 12;

/// Decimal places per physical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub acceleration: u8,
    pub angular_rate: u8,
    pub magnetic_field: u8,
    pub temperature: u8,
    pub pressure: u8,
    pub altitude: u8,
}

impl Precision {
    pub const fn places(&self, quantity: Quantity) -> usize {
        let places = match quantity {
            Quantity::Acceleration => self.acceleration,
            Quantity::AngularRate => self.angular_rate,
            Quantity::MagneticField => self.magnetic_field,
            Quantity::Temperature => self.temperature,
            Quantity::Pressure => self.pressure,
            Quantity::Altitude => self.altitude,
        };
        places as usize
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            acceleration: 4,
            angular_rate: 4,
            magnetic_field: 2,
            temperature: 2,
            pressure: 1,
            altitude: 2,
        }
    }
}

/// Runtime-tunable logger settings.
///
/// The write buffer capacity is not here: it sizes a fixed array and is a
/// const parameter of [`FlightLogger`](crate::FlightLogger).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoggerConfig {
    /// Channels that appear in each record and, under [`EmitPolicy::Gate`],
    /// must all be fresh before a record is emitted.
    pub channels: ChannelSet,
    pub policy: EmitPolicy,
    pub precision: Precision,
    pub flush_interval_ticks: Tick,
    /// Sync the file after every interval flush, not only on `force_flush`.
    pub sync_on_interval: bool,
    /// Replaces the generated header line. Must name one column per record
    /// field, timestamp included, or `open` fails with
    /// [`LogError::HeaderMismatch`](crate::LogError::HeaderMismatch).
    pub header: Option<&'static str>,
    pub file_prefix: &'static str,
    pub file_extension: &'static str,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            channels: ChannelSet::ALL,
            policy: EmitPolicy::AlwaysEmit,
            precision: Precision::default(),
            flush_interval_ticks: DEFAULT_FLUSH_INTERVAL_TICKS,
            sync_on_interval: true,
            header: None,
            file_prefix: DEFAULT_FILE_PREFIX,
            file_extension: DEFAULT_FILE_EXTENSION,
        }
    }
}

impl LoggerConfig {
    pub fn with_channels(mut self, channels: ChannelSet) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_policy(mut self, policy: EmitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_flush_interval(mut self, ticks: Tick) -> Self {
        self.flush_interval_ticks = ticks;
        self
    }

    pub fn with_sync_on_interval(mut self, sync: bool) -> Self {
        self.sync_on_interval = sync;
        self
    }

    pub fn with_header(mut self, header: &'static str) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_file_name(mut self, prefix: &'static str, extension: &'static str) -> Self {
        self.file_prefix = prefix;
        self.file_extension = extension;
        self
    }
}
