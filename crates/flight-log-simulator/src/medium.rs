//! Host directory standing in for the SD card.

use std::cell::Cell;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use flight_log_core::StorageMedium;

/// Blocking time spent inside the medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
    pub writes: u32,
    pub syncs: u32,
    pub worst_write: Duration,
    pub worst_sync: Duration,
    pub total: Duration,
}

/// Shared view of a medium's [`Latency`], readable after the medium has
/// been handed to the logger.
#[derive(Debug, Clone, Default)]
pub struct LatencyMonitor(Rc<Cell<Latency>>);

impl LatencyMonitor {
    pub fn get(&self) -> Latency {
        self.0.get()
    }

    fn record_write(&self, elapsed: Duration) {
        let mut latency = self.0.get();
        latency.writes += 1;
        latency.worst_write = latency.worst_write.max(elapsed);
        latency.total += elapsed;
        self.0.set(latency);
    }

    fn record_sync(&self, elapsed: Duration) {
        let mut latency = self.0.get();
        latency.syncs += 1;
        latency.worst_sync = latency.worst_sync.max(elapsed);
        latency.total += elapsed;
        self.0.set(latency);
    }
}

/// Session files as plain files in one directory.
pub struct FsMedium {
    root: PathBuf,
    monitor: LatencyMonitor,
}

impl FsMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            monitor: LatencyMonitor::default(),
        }
    }

    pub fn latency_monitor(&self) -> LatencyMonitor {
        self.monitor.clone()
    }
}

impl StorageMedium for FsMedium {
    type File = File;
    type Error = io::Error;

    fn mount(&mut self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", self.root.display()),
            ));
        }
        Ok(())
    }

    fn exists(&mut self, name: &str) -> io::Result<bool> {
        self.root.join(name).try_exists()
    }

    fn create(&mut self, name: &str) -> io::Result<File> {
        OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(self.root.join(name))
    }

    fn write(&mut self, file: &mut File, bytes: &[u8]) -> io::Result<()> {
        let start = Instant::now();
        file.write_all(bytes)?;
        self.monitor.record_write(start.elapsed());
        Ok(())
    }

    fn sync(&mut self, file: &mut File) -> io::Result<()> {
        let start = Instant::now();
        file.sync_data()?;
        self.monitor.record_sync(start.elapsed());
        Ok(())
    }

    fn close(&mut self, file: File) -> io::Result<()> {
        drop(file);
        Ok(())
    }
}
