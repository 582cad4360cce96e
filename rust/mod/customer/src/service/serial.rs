//! Display identifier allocation.
//!
//! The next serial number is always the current maximum plus one, or 1 for
//! an empty collection. Gaps left by deletions are never refilled.

/// Next serial number given the serials currently stored.
pub fn next_serial<I: IntoIterator<Item = u64>>(existing: I) -> u64 {
    existing.into_iter().max().map_or(1, |max| max + 1)
}

/// Hands out serial numbers across a sequence of inserts.
///
/// Seeded once from the stored maximum; a number is consumed only when the
/// caller reports that the record carrying it was stored, so a failed insert
/// does not leave a gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialAllocator {
    max: Option<u64>,
}

impl SerialAllocator {
    pub fn seeded<I: IntoIterator<Item = u64>>(existing: I) -> Self {
        Self { max: existing.into_iter().max() }
    }

    /// Serial number the next stored record should carry.
    pub fn peek(&self) -> u64 {
        self.max.map_or(1, |max| max + 1)
    }

    /// Record that `serial` is now in the store.
    pub fn commit(&mut self, serial: u64) {
        self.max = Some(self.max.map_or(serial, |max| max.max(serial)));
    }
}
