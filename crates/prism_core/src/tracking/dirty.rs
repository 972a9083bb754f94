//! # Dirty Range
//!
//! A single contiguous `[offset, offset + count)` window of modified slots.
//!
//! Spawning writes contiguous runs, so a range is enough: two runs marked
//! before an upload collapse into the smallest window covering both.

/// Contiguous range of modified slots awaiting upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyRange {
    /// First dirty slot.
    start: usize,
    /// One past the last dirty slot. `start == end` means clean.
    end: usize,
}

impl DirtyRange {
    /// Creates a clean range.
    #[must_use]
    pub const fn new() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Marks `count` slots starting at `offset` as dirty.
    ///
    /// # Performance
    ///
    /// O(1) - only the bounds move.
    #[inline]
    pub fn mark(&mut self, offset: usize, count: usize) {
        if count == 0 {
            return;
        }
        let end = offset + count;
        if self.is_dirty() {
            self.start = self.start.min(offset);
            self.end = self.end.max(end);
        } else {
            self.start = offset;
            self.end = end;
        }
    }

    /// Whether anything awaits upload.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.end > self.start
    }

    /// First dirty slot (0 when clean).
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.start
    }

    /// Number of dirty slots.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> usize {
        self.end - self.start
    }

    /// Whether `index` lies inside the range.
    #[inline]
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// The range expressed in scalar elements for items of `item_size`.
    ///
    /// Returns `(offset, count)`.
    #[inline]
    #[must_use]
    pub const fn scaled(&self, item_size: usize) -> (usize, usize) {
        (self.start * item_size, self.count() * item_size)
    }

    /// Acknowledges an upload.
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_clean() {
        let range = DirtyRange::new();
        assert!(!range.is_dirty());
        assert_eq!(range.count(), 0);
    }

    #[test]
    fn test_mark_and_scale() {
        let mut range = DirtyRange::new();
        range.mark(10, 5);
        assert!(range.is_dirty());
        assert_eq!(range.offset(), 10);
        assert_eq!(range.count(), 5);
        assert_eq!(range.scaled(3), (30, 15));
        assert!(range.contains(14));
        assert!(!range.contains(15));
    }

    #[test]
    fn test_merge_covers_both_runs() {
        let mut range = DirtyRange::new();
        range.mark(90, 10);
        range.mark(0, 4);
        assert_eq!(range.offset(), 0);
        assert_eq!(range.count(), 100);
    }

    #[test]
    fn test_zero_count_is_ignored() {
        let mut range = DirtyRange::new();
        range.mark(42, 0);
        assert!(!range.is_dirty());
    }

    #[test]
    fn test_clear() {
        let mut range = DirtyRange::new();
        range.mark(1, 1);
        range.clear();
        assert!(!range.is_dirty());
    }
}
