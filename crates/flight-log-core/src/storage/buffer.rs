use log::debug;

use super::BlockSink;
use super::arena::ByteArena;
use crate::Tick;
use crate::error::LogError;

/// Write buffer with flush-on-full and flush-on-interval semantics.
///
/// Records are batched in a [`ByteArena`] and handed to a [`BlockSink`] as one
/// block. A time-based flush bounds the unsaved data to one interval's worth
/// of records; the overflow flush means the arena never has to hold more
/// than its capacity.
///
/// Flushes block the caller for as long as the sink takes.
pub struct WriteBuffer<const N: usize> {
    arena: ByteArena<N>,
    flush_interval: Tick,
    last_flush: Tick,
}

impl<const N: usize> WriteBuffer<N> {
    pub const fn new(flush_interval: Tick) -> Self {
        Self {
            arena: ByteArena::new(),
            flush_interval,
            last_flush: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn remaining_capacity(&self) -> usize {
        self.arena.remaining_capacity()
    }

    pub const fn last_flush(&self) -> Tick {
        self.last_flush
    }

    /// Buffer one whole record, flushing first if it would not fit.
    ///
    /// Returns whether an overflow flush happened. A record larger than the
    /// whole buffer is rejected without flushing.
    pub fn append<S: BlockSink + ?Sized>(
        &mut self,
        record: &[u8],
        sink: &mut S,
    ) -> Result<bool, LogError> {
        if record.len() > N {
            return Err(LogError::RecordTooLarge {
                len: record.len(),
                capacity: N,
            });
        }

        let mut flushed = false;
        if !self.arena.fits(record.len()) {
            let bytes = self.flush(sink)?;
            debug!("Write buffer full, flushed {} bytes", bytes);
            flushed = true;
        }

        self.arena
            .append(record)
            .map_err(|_| LogError::RecordTooLarge {
                len: record.len(),
                capacity: N,
            })?;

        Ok(flushed)
    }

    /// Flush if a full interval has passed since the last timed flush.
    ///
    /// Returns `Some(bytes)` when the interval elapsed, even if nothing was
    /// pending, and `None` otherwise.
    pub fn tick<S: BlockSink + ?Sized>(
        &mut self,
        now: Tick,
        sink: &mut S,
    ) -> Result<Option<usize>, LogError> {
        if now.wrapping_sub(self.last_flush) < self.flush_interval {
            return Ok(None);
        }

        self.last_flush = now;
        self.flush(sink).map(Some)
    }

    /// Start a new flush interval at `now` without flushing.
    pub fn restart_interval(&mut self, now: Tick) {
        self.last_flush = now;
    }

    /// Flush unconditionally and ask the sink to make it durable.
    pub fn force_flush<S: BlockSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize, LogError> {
        let bytes = self.flush(sink)?;
        sink.sync()?;
        Ok(bytes)
    }

    /// Hand every buffered byte to the sink as one block.
    pub fn flush<S: BlockSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize, LogError> {
        self.arena.drain_for_flush(|bytes| sink.write_block(bytes))
    }

    /// Drop buffered bytes without writing them.
    pub fn discard(&mut self) -> usize {
        let dropped = self.arena.len();
        self.arena.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that keeps every block it receives.
    #[derive(Default)]
    struct RecordingSink {
        blocks: Vec<Vec<u8>>,
        syncs: usize,
        fail: bool,
    }

    impl RecordingSink {
        fn contents(&self) -> Vec<u8> {
            self.blocks.concat()
        }
    }

    impl BlockSink for RecordingSink {
        fn write_block(&mut self, bytes: &[u8]) -> Result<(), LogError> {
            if self.fail {
                return Err(LogError::Write);
            }
            self.blocks.push(bytes.to_vec());
            Ok(())
        }

        fn sync(&mut self) -> Result<(), LogError> {
            if self.fail {
                return Err(LogError::Sync);
            }
            self.syncs += 1;
            Ok(())
        }
    }

    fn fixed_record(index: usize, len: usize) -> Vec<u8> {
        let mut record = format!("{:06},", index).into_bytes();
        record.resize(len - 1, b'7');
        record.push(b'\n');
        record
    }

    #[test]
    fn test_overflow_flushes_exactly_once() {
        let mut buffer = WriteBuffer::<4096>::new(1_000_000);
        let mut sink = RecordingSink::default();

        let mut expected = Vec::new();
        let mut overflow_flushes = 0;
        for i in 0..70 {
            let record = fixed_record(i, 60);
            expected.extend_from_slice(&record);
            if buffer.append(&record, &mut sink).unwrap() {
                overflow_flushes += 1;
            }
        }

        assert_eq!(overflow_flushes, 1);
        assert_eq!(sink.blocks.len(), 1);
        // 68 records fill 4080 of 4096 bytes, the 69th forces the flush
        assert_eq!(sink.blocks[0].len(), 68 * 60);
        assert_eq!(buffer.len(), 2 * 60);

        buffer.flush(&mut sink).unwrap();
        assert_eq!(sink.contents(), expected);
    }

    #[test]
    fn test_interval_flush() {
        let mut buffer = WriteBuffer::<4096>::new(1_000_000);
        let mut sink = RecordingSink::default();

        for (tick, record) in [(100, "100,1\n"), (200, "200,2\n"), (900_000, "900000,3\n")] {
            buffer.append(record.as_bytes(), &mut sink).unwrap();
            assert_eq!(buffer.tick(tick, &mut sink).unwrap(), None);
        }
        assert!(sink.blocks.is_empty());

        assert_eq!(buffer.tick(1_000_050, &mut sink).unwrap(), Some(21));
        assert_eq!(sink.blocks.len(), 1);
        assert_eq!(sink.blocks[0], b"100,1\n200,2\n900000,3\n");
        assert_eq!(buffer.last_flush(), 1_000_050);
        assert!(buffer.is_empty());

        // The interval restarts from the flush
        assert_eq!(buffer.tick(1_999_000, &mut sink).unwrap(), None);
    }

    #[test]
    fn test_restart_interval_moves_the_deadline() {
        let mut buffer = WriteBuffer::<64>::new(1_000);
        let mut sink = RecordingSink::default();

        buffer.restart_interval(7_000);
        buffer.append(b"7000,1\n", &mut sink).unwrap();
        assert_eq!(buffer.tick(7_999, &mut sink).unwrap(), None);
        assert!(sink.blocks.is_empty());

        assert_eq!(buffer.tick(8_000, &mut sink).unwrap(), Some(7));
        assert_eq!(buffer.last_flush(), 8_000);
    }

    #[test]
    fn test_interval_elapses_without_pending_data() {
        let mut buffer = WriteBuffer::<64>::new(1_000);
        let mut sink = RecordingSink::default();

        assert_eq!(buffer.tick(1_000, &mut sink).unwrap(), Some(0));
        assert_eq!(buffer.last_flush(), 1_000);
        assert!(
            sink.blocks.is_empty(),
            "empty flush must not reach the medium"
        );
    }

    #[test]
    fn test_length_never_exceeds_capacity_and_order_is_kept() {
        const CAPACITY: usize = 256;
        let mut buffer = WriteBuffer::<CAPACITY>::new(5_000);
        let mut sink = RecordingSink::default();
        let mut expected = Vec::new();

        // Deterministic pseudo-random record lengths and tick spacing
        let mut seed: u32 = 0x2545_f491;
        let mut now: Tick = 0;
        for i in 0..2_000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;

            let len = 8 + (seed % 120) as usize;
            let record = fixed_record(i, len);
            expected.extend_from_slice(&record);

            let flushed_before = sink.contents().len();
            buffer.append(&record, &mut sink).unwrap();
            assert!(buffer.len() <= CAPACITY);

            now += (seed % 700) as Tick;
            buffer.tick(now, &mut sink).unwrap();
            assert!(buffer.len() <= CAPACITY);

            // What reached the sink is always a prefix of the full stream
            let written = sink.contents();
            assert!(written.len() >= flushed_before);
            assert_eq!(written[..], expected[..written.len()]);
        }

        buffer.force_flush(&mut sink).unwrap();
        assert_eq!(sink.contents(), expected);
    }

    #[test]
    fn test_record_larger_than_buffer_is_rejected() {
        let mut buffer = WriteBuffer::<16>::new(1_000);
        let mut sink = RecordingSink::default();

        buffer.append(b"0123456789\n", &mut sink).unwrap();
        let err = buffer.append(&[b'x'; 17], &mut sink).unwrap_err();

        assert_eq!(
            err,
            LogError::RecordTooLarge {
                len: 17,
                capacity: 16
            }
        );
        assert!(
            sink.blocks.is_empty(),
            "rejected record must not trigger a flush"
        );
        assert_eq!(buffer.len(), 11);
    }

    #[test]
    fn test_force_flush_syncs() {
        let mut buffer = WriteBuffer::<64>::new(1_000_000);
        let mut sink = RecordingSink::default();

        buffer.append(b"1,2,3\n", &mut sink).unwrap();
        assert_eq!(buffer.force_flush(&mut sink).unwrap(), 6);
        assert_eq!(sink.syncs, 1);

        // Syncs even with nothing pending
        assert_eq!(buffer.force_flush(&mut sink).unwrap(), 0);
        assert_eq!(sink.syncs, 2);
        assert_eq!(sink.blocks.len(), 1);
    }

    #[test]
    fn test_failed_overflow_flush_does_not_append() {
        let mut buffer = WriteBuffer::<8>::new(1_000_000);
        let mut sink = RecordingSink::default();

        buffer.append(b"abcdef", &mut sink).unwrap();
        sink.fail = true;

        assert_eq!(buffer.append(b"ghi", &mut sink), Err(LogError::Write));
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.discard(), 6);
        assert!(buffer.is_empty());
    }
}
