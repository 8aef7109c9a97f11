use heapless::Vec;

/// Not enough room left in the arena for the whole slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaFull {
    pub needed: usize,
    pub remaining: usize,
}

/// Fixed-capacity byte arena.
///
/// Appends are all-or-nothing: a slice either lands whole or the arena is
/// left untouched. `len() <= N` always holds.
pub struct ByteArena<const N: usize> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> Default for ByteArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteArena<N> {
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        N - self.bytes.len()
    }

    pub fn fits(&self, len: usize) -> bool {
        len <= self.remaining_capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn append(&mut self, data: &[u8]) -> Result<(), ArenaFull> {
        if !self.fits(data.len()) {
            return Err(ArenaFull {
                needed: data.len(),
                remaining: self.remaining_capacity(),
            });
        }

        self.bytes.extend_from_slice(data).map_err(|_| ArenaFull {
            needed: data.len(),
            remaining: self.remaining_capacity(),
        })
    }

    /// Hand the buffered bytes to `write` and empty the arena if it succeeds.
    ///
    /// An empty arena never calls `write`. On failure the bytes stay put.
    pub fn drain_for_flush<E>(
        &mut self,
        write: impl FnOnce(&[u8]) -> Result<(), E>,
    ) -> Result<usize, E> {
        if self.bytes.is_empty() {
            return Ok(0);
        }

        write(&self.bytes)?;

        let drained = self.bytes.len();
        self.bytes.clear();
        Ok(drained)
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
