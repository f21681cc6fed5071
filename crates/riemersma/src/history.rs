//! Fixed-capacity ring of the most recent quantization errors.

use crate::color::ColorError;

/// Circular buffer of [`ColorError`]s, addressed most-recent-first.
///
/// Slots that were never written read as [`ColorError::ZERO`].
#[derive(Debug, Clone)]
pub struct ErrorHistory {
    slots: Vec<ColorError>,
    // next slot to overwrite, which is also the oldest entry
    head: usize,
}

impl ErrorHistory {
    /// Creates a history with `capacity` zeroed slots.
    ///
    /// # Panics
    /// Panics if `capacity` is zero. [`crate::Riemersma`] validates the
    /// length before building a history.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "error history needs at least one slot");
        Self {
            slots: vec![ColorError::ZERO; capacity],
            head: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the `i`-th most recent entry; `get(0)` is the last one rotated
    /// in and `get(capacity - 1)` the oldest still remembered.
    ///
    /// # Panics
    /// Panics if `i >= capacity`.
    #[inline]
    pub fn get(&self, i: usize) -> &ColorError {
        let len = self.slots.len();
        assert!(i < len, "history index {i} out of range for capacity {len}");
        &self.slots[(self.head + len - 1 - i) % len]
    }

    /// Overwrites the oldest entry with `error`.
    #[inline]
    pub fn rotate(&mut self, error: ColorError) {
        self.slots[self.head] = error;
        self.head += 1;
        if self.head == self.slots.len() {
            self.head = 0;
        }
    }

    /// Iterates entries from the oldest to the newest.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &ColorError> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }
}
