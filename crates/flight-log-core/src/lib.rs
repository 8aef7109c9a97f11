//! Hardware-independent data logging core for the flight computer
//!
//! This crate contains the platform-agnostic pieces of the sensor logger:
//! channel aggregation, CSV record rendering, the fixed-capacity write buffer
//! with its flush policy, and the session file lifecycle on a storage medium.
//!
//! It is `#![no_std]` and never allocates, so it runs unchanged on the flight
//! target and on desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod aggregator;
pub mod channel;
pub mod config;
pub mod error;
pub mod format;
pub mod logger;
pub mod storage;

pub use aggregator::{CombinedRecord, EmitPolicy, Field, SampleAggregator};
pub use channel::{Channel, ChannelSet, Quantity, Reading, Vec3};
pub use config::{LoggerConfig, Precision};
pub use error::{FormatError, LogError};
pub use format::RecordFormatter;
pub use logger::{FlightLogger, LoggerStats, LoggerStatus};
pub use storage::{BlockSink, ByteArena, PersistentLog, StorageMedium, WriteBuffer};

/// Device tick count in microseconds since boot
pub type Tick = u64;
