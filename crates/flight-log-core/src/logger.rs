//! The flight logger: aggregation, rendering, buffering and the session file
//! behind one owner.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --open ok--> Recording --close--> Closed
//!   |                   |
//!   +--open failed--> Disabled(cause) <--write/sync fault--+
//! ```
//!
//! `Disabled` is sticky. Every logging call made outside `Recording` returns
//! `false` without touching any state or the medium, so the caller's loop
//! keeps running when the card is missing or dies mid-flight.

use heapless::String;
use log::{debug, error, info, warn};

use crate::Tick;
use crate::aggregator::SampleAggregator;
use crate::channel::{Channel, Reading};
use crate::config::{DEFAULT_BUFFER_CAPACITY, FILE_NAME_CAPACITY, LINE_CAPACITY, LoggerConfig};
use crate::error::LogError;
use crate::format::RecordFormatter;
use crate::storage::{BlockSink, PersistentLog, StorageMedium, WriteBuffer};

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerStatus {
    /// Not opened yet
    Idle,
    /// A session file is open and records are being written
    Recording,
    /// Logging stopped for good after the given failure
    Disabled(LogError),
    /// Closed cleanly
    Closed,
}

/// Running counters, readable at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    /// Records rendered and accepted by the write buffer
    pub records_emitted: u64,
    /// Records that could not be rendered or buffered
    pub records_dropped: u64,
    /// Bytes handed to the medium by buffer flushes (header excluded)
    pub bytes_flushed: u64,
    /// Buffer flushes that wrote at least one byte
    pub flushes: u64,
    /// Durability syncs requested after the header
    pub syncs: u64,
}

enum State<M: StorageMedium> {
    Idle,
    Recording(PersistentLog<M>),
    Disabled(LogError),
    Closed,
}

/// Sensor data logger writing CSV records to a session file.
///
/// `CAP` is the write buffer size in bytes. Everything lives inline, so the
/// logger can sit in a `static` cell or on the stack of the logging task.
pub struct FlightLogger<M: StorageMedium, const CAP: usize = DEFAULT_BUFFER_CAPACITY> {
    config: LoggerConfig,
    aggregator: SampleAggregator,
    formatter: RecordFormatter,
    buffer: WriteBuffer<CAP>,
    state: State<M>,
    session_name: Option<String<FILE_NAME_CAPACITY>>,
    /// Bytes written since the last sync
    dirty: bool,
    /// The flush interval starts at the first `tick` of the session
    interval_started: bool,
    stats: LoggerStats,
}

impl<M: StorageMedium, const CAP: usize> FlightLogger<M, CAP> {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            aggregator: SampleAggregator::new(config.channels, config.policy),
            formatter: RecordFormatter::new(config.precision),
            buffer: WriteBuffer::new(config.flush_interval_ticks),
            state: State::Idle,
            session_name: None,
            dirty: false,
            interval_started: false,
            stats: LoggerStats::default(),
            config,
        }
    }

    /// Start a session on `medium`.
    ///
    /// On failure the logger is disabled for good and the error is returned
    /// once; it stays visible through [`status`](Self::status).
    pub fn open(&mut self, medium: M) -> Result<(), LogError> {
        if !matches!(self.state, State::Idle) {
            warn!("Logger already opened, ignoring open()");
            return Err(LogError::AlreadyOpen);
        }

        match PersistentLog::open(medium, &self.config) {
            Ok(log) => {
                self.session_name = String::try_from(log.name()).ok();
                self.state = State::Recording(log);
                Ok(())
            }
            Err(e) => {
                error!("Logging disabled: {}", e);
                self.state = State::Disabled(e);
                Err(e)
            }
        }
    }

    /// Record the latest value of a channel.
    pub fn observe(&mut self, channel: Channel, value: impl Into<Reading>) -> bool {
        if !self.is_recording() {
            return false;
        }

        self.aggregator.observe(channel, value);
        true
    }

    /// Emit a record stamped `now` if the emit policy allows it.
    ///
    /// Returns whether a record was buffered.
    pub fn try_emit(&mut self, now: Tick) -> bool {
        if !self.is_recording() {
            return false;
        }

        let Some(record) = self.aggregator.try_emit(now) else {
            return false;
        };

        let mut line: String<LINE_CAPACITY> = String::new();
        if let Err(e) = self.formatter.render(&record, &mut line) {
            warn!("Dropping record at {}: {}", now, e);
            self.stats.records_dropped = self.stats.records_dropped.saturating_add(1);
            return false;
        }

        let buffered = self.append(line.as_bytes());
        if buffered {
            self.stats.records_emitted = self.stats.records_emitted.saturating_add(1);
        }
        buffered
    }

    /// Buffer an already rendered line, flushing first if the buffer is full.
    pub fn append(&mut self, bytes: &[u8]) -> bool {
        let State::Recording(log) = &mut self.state else {
            return false;
        };

        let pending = self.buffer.len();
        match self.buffer.append(bytes, log) {
            Ok(flushed) => {
                if flushed {
                    self.record_flush(pending);
                }
                true
            }
            Err(LogError::RecordTooLarge { len, capacity }) => {
                warn!("Dropping {} byte record, buffer holds {}", len, capacity);
                self.stats.records_dropped = self.stats.records_dropped.saturating_add(1);
                false
            }
            Err(e) => {
                self.fault(e);
                false
            }
        }
    }

    /// Drive the time-based flush. Call once per loop iteration.
    ///
    /// The first call after `open` only starts the interval, so a session
    /// opened long after boot does not flush on its first tick.
    ///
    /// Returns `false` only when not recording or when the flush failed.
    pub fn tick(&mut self, now: Tick) -> bool {
        let State::Recording(log) = &mut self.state else {
            return false;
        };

        if !self.interval_started {
            self.buffer.restart_interval(now);
            self.interval_started = true;
            return true;
        }

        let flushed = match self.buffer.tick(now, log) {
            Ok(None) => return true,
            Ok(Some(bytes)) => bytes,
            Err(e) => {
                self.fault(e);
                return false;
            }
        };

        // Nothing new since the last sync means nothing to make durable
        let wants_sync = self.config.sync_on_interval && (self.dirty || flushed > 0);
        let synced = if wants_sync {
            log.sync().map(|_| true)
        } else {
            Ok(false)
        };
        self.record_flush(flushed);

        match synced {
            Ok(true) => {
                self.record_sync();
                debug!("Interval flush of {} bytes synced", flushed);
                true
            }
            Ok(false) => true,
            Err(e) => {
                self.fault(e);
                false
            }
        }
    }

    /// Write out everything buffered and make it durable.
    pub fn force_flush(&mut self) -> bool {
        let State::Recording(log) = &mut self.state else {
            return false;
        };

        match self.buffer.force_flush(log) {
            Ok(bytes) => {
                self.record_flush(bytes);
                self.record_sync();
                true
            }
            Err(e) => {
                self.fault(e);
                false
            }
        }
    }

    /// Flush, sync and release the session file.
    ///
    /// A no-op outside `Recording`. A failure disables the logger and is
    /// returned.
    pub fn close(&mut self) -> Result<(), LogError> {
        if matches!(self.state, State::Idle) {
            self.state = State::Closed;
        }
        let State::Recording(log) = &mut self.state else {
            return Ok(());
        };

        let flushed = self.buffer.flush(log);
        let result = flushed.and_then(|bytes| log.close().map(|_| bytes));

        match result {
            Ok(bytes) => {
                self.record_flush(bytes);
                self.record_sync();
                self.state = State::Closed;
                Ok(())
            }
            Err(e) => {
                self.fault(e);
                Err(e)
            }
        }
    }

    pub fn status(&self) -> LoggerStatus {
        match self.state {
            State::Idle => LoggerStatus::Idle,
            State::Recording(_) => LoggerStatus::Recording,
            State::Disabled(cause) => LoggerStatus::Disabled(cause),
            State::Closed => LoggerStatus::Closed,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording(_))
    }

    /// Whether logging failed and the operator should be told.
    pub fn is_degraded(&self) -> bool {
        matches!(self.state, State::Disabled(_))
    }

    pub const fn stats(&self) -> LoggerStats {
        self.stats
    }

    /// Name of the session file, once one was created.
    pub fn session_name(&self) -> Option<&str> {
        self.session_name.as_deref()
    }

    /// Bytes waiting in the write buffer.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub const fn config(&self) -> &LoggerConfig {
        &self.config
    }

    fn record_flush(&mut self, bytes: usize) {
        if bytes > 0 {
            self.stats.flushes = self.stats.flushes.saturating_add(1);
            self.stats.bytes_flushed = self.stats.bytes_flushed.saturating_add(bytes as u64);
            self.dirty = true;
        }
    }

    fn record_sync(&mut self) {
        self.stats.syncs = self.stats.syncs.saturating_add(1);
        self.dirty = false;
    }

    /// Stop logging after a mid-session failure. Buffered bytes are lost.
    fn fault(&mut self, cause: LogError) {
        let dropped = self.buffer.discard();
        error!(
            "Logging disabled after {}, {} buffered bytes discarded",
            cause, dropped
        );

        let previous = core::mem::replace(&mut self.state, State::Disabled(cause));
        if let State::Recording(mut log) = previous
            && let Err(e) = log.close()
        {
            warn!("Session file not closed after fault: {}", e);
        }
    }
}

impl<M: StorageMedium, const CAP: usize> Drop for FlightLogger<M, CAP> {
    fn drop(&mut self) {
        if self.is_recording() {
            info!("Logger dropped while recording, closing session");
            let _ = self.close();
        }
    }
}
