//! Closed physical address intervals.

use core::cmp::Ordering;
use core::fmt;

/// Physical address.
pub type PhysAddr = u64;

/// A closed range `[start, end]` of physical addresses.
///
/// Both bounds are inclusive and `start <= end` always holds, so every
/// interval covers at least one byte. An interval spanning the whole address
/// space covers 2^64 bytes, which is why [`size`](Self::size) is a `u128`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Interval {
    start: PhysAddr,
    end: PhysAddr,
}

/// Rejected interval bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("interval end {end:#x} lies before its start {start:#x}")]
    Inverted { start: PhysAddr, end: PhysAddr },
}

impl Interval {
    /// Create the interval `[start, end]`.
    ///
    /// # Panics
    /// If `start > end`. Use [`try_new`](Self::try_new) for bounds that are
    /// not known to be ordered.
    #[inline]
    #[must_use]
    pub const fn new(start: PhysAddr, end: PhysAddr) -> Self {
        assert!(start <= end, "interval end lies before its start");
        Self { start, end }
    }

    /// Create the interval `[start, end]`, rejecting inverted bounds.
    ///
    /// # Errors
    /// [`IntervalError::Inverted`] if `start > end`.
    #[inline]
    pub const fn try_new(start: PhysAddr, end: PhysAddr) -> Result<Self, IntervalError> {
        if start > end {
            return Err(IntervalError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// The interval of `size` bytes beginning at `start`.
    ///
    /// `None` if `size` is zero or the interval would run past the end of the
    /// address space.
    #[inline]
    #[must_use]
    pub const fn from_start_size(start: PhysAddr, size: u64) -> Option<Self> {
        if size == 0 {
            return None;
        }
        match start.checked_add(size - 1) {
            Some(end) => Some(Self { start, end }),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysAddr {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysAddr {
        self.end
    }

    /// Number of bytes covered.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u128 {
        u128::from(self.end - self.start) + 1
    }

    /// Whether `addr` lies within the interval.
    #[inline]
    #[must_use]
    pub const fn contains_addr(&self, addr: PhysAddr) -> bool {
        self.start <= addr && addr <= self.end
    }

    /// Whether `other` lies entirely within the interval.
    #[inline]
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Whether the two intervals share at least one address.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        !(self.end < other.start || other.end < self.start)
    }

    /// Order two intervals, treating overlapping ones as equal.
    ///
    /// `self` is [`Less`](Ordering::Less) if it ends before `other` starts and
    /// [`Greater`](Ordering::Greater) if it starts after `other` ends. Among
    /// pairwise disjoint intervals this is a total order by start address, so
    /// searching a sorted set of them with a query interval lands on a stored
    /// interval overlapping the query, if there is one.
    #[inline]
    #[must_use]
    pub const fn overlap_cmp(&self, other: &Self) -> Ordering {
        if self.end < other.start {
            Ordering::Less
        } else if other.end < self.start {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interval(0x{:X}-0x{:X})", self.start, self.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:014x}-{:014x}]", self.start, self.end)
    }
}

impl TryFrom<(PhysAddr, PhysAddr)> for Interval {
    type Error = IntervalError;

    fn try_from((start, end): (PhysAddr, PhysAddr)) -> Result<Self, Self::Error> {
        Self::try_new(start, end)
    }
}
