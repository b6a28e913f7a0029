//! # Free Physical Address Space
//!
//! [`PhysSpace`] tracks which physical address ranges nobody has claimed yet.
//! It starts out pessimistic, with everything above a floor considered free,
//! and then only ever shrinks: the boot memory map, fixed windows placed by
//! early boot code, and size-driven allocations all carve ranges out of it.
//! Nothing is ever given back, so adjacent free intervals are never merged.
//!
//! ## Representation
//!
//! The free intervals are kept in a [`BTreeMap`] from start to end address.
//! They are pairwise disjoint, so ordering by start is the same as ordering by
//! [`Interval::overlap_cmp`], and the only stored interval that can overlap a
//! query is the last one starting at or before the query's end.
//!
//! ```text
//!   free:  [ 0 ..... 399 ]        [ 500 ............ 999 ]
//!   query:             [ 350 ................ 700 ]
//!   after: [ 0 .. 349 ]                              [ 701 .. 999 ]
//! ```

use crate::align::align_up;
use crate::{AlignMask, Interval, PhysAddr, PhysSpaceConfig};
use alloc::collections::BTreeMap;
use core::cmp::Ordering;
use core::fmt;
use kernel_info::boot::MemoryDescriptor;
use kernel_info::memory::{PHYS_ADDR_MAX, page_last_byte, trunc_page};
use log::{Level, debug, info, log, trace, warn};

/// The set of physical address ranges that are still free.
///
/// # Invariants
/// - Stored intervals are pairwise disjoint (none overlaps another).
/// - Free coverage never grows after construction.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct PhysSpace {
    /// Free intervals, start address to (inclusive) end address.
    free: BTreeMap<PhysAddr, PhysAddr>,
}

impl PhysSpace {
    /// A tracker with no free space at all.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            free: BTreeMap::new(),
        }
    }

    /// A tracker whose only free interval is `seed`.
    #[must_use]
    pub fn with_seed(seed: Interval) -> Self {
        let mut space = Self::new();
        space.free.insert(seed.start(), seed.end());
        space
    }

    /// A tracker holding the given free intervals.
    ///
    /// An interval overlapping one inserted before it is skipped.
    pub fn from_intervals<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = Interval>,
    {
        let mut space = Self::new();
        for interval in intervals {
            if let Some(existing) = space.find_overlapping(interval) {
                warn!("Skipping free interval {interval}, it overlaps {existing}");
                continue;
            }
            space.free.insert(interval.start(), interval.end());
        }
        space
    }

    /// Build the free space from the boot memory map.
    ///
    /// Everything from [`PhysSpaceConfig::floor`] to the top of the address
    /// space starts out free. Each descriptor that claims physical space is
    /// widened to whole pages and reserved; virtual descriptors and kinds that
    /// don't claim memory are ignored.
    pub fn new_from_boot_map<I>(map: I, config: &PhysSpaceConfig) -> Self
    where
        I: IntoIterator<Item = MemoryDescriptor>,
    {
        let mut space = Self::with_seed(Interval::new(config.floor(), PHYS_ADDR_MAX));
        let level = if config.verbose() {
            Level::Info
        } else {
            Level::Trace
        };

        for desc in map {
            if !desc.claims_physical_space() {
                debug!(
                    "Ignoring boot map entry {:014x}-{:014x} ({}{})",
                    desc.start,
                    desc.end,
                    desc.kind,
                    if desc.is_virtual { ", virtual" } else { "" }
                );
                continue;
            }

            let Ok(region) = Interval::try_new(trunc_page(desc.start), page_last_byte(desc.end))
            else {
                warn!(
                    "Ignoring inverted boot map entry {:014x}-{:014x} ({})",
                    desc.start, desc.end, desc.kind
                );
                continue;
            };

            let reserved = space.reserve(region);
            log!(
                level,
                "  reserve phys memory space {:014x}-{:014x} ({})",
                desc.start,
                desc.end,
                if reserved { "ok" } else { "failed" }
            );
        }

        space
    }

    /// Number of free intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Free intervals in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.free.iter().map(|(&start, &end)| Interval::new(start, end))
    }

    /// Total number of free bytes.
    #[must_use]
    pub fn free_bytes(&self) -> u128 {
        self.iter().map(|i| i.size()).sum()
    }

    /// The free interval overlapping `query`, if any.
    ///
    /// When `query` spans several free intervals, the highest of them is
    /// returned.
    #[must_use]
    pub fn find_overlapping(&self, query: Interval) -> Option<Interval> {
        let (&start, &end) = self.free.range(..=query.end()).next_back()?;
        let found = Interval::new(start, end);
        (found.overlap_cmp(&query) == Ordering::Equal).then_some(found)
    }

    /// Whether `query` is free as one contiguous block.
    #[must_use]
    pub fn is_free(&self, query: Interval) -> bool {
        self.find_overlapping(query)
            .is_some_and(|found| found.contains(&query))
    }

    /// Remove every free address in `query`.
    ///
    /// `query` may touch any number of free intervals, and may cover reserved
    /// space in between. Returns `false` if none of it was free, in which case
    /// nothing changes.
    pub fn reserve(&mut self, query: Interval) -> bool {
        let mut reserved = false;
        while let Some(found) = self.find_overlapping(query) {
            self.carve(found, query);
            reserved = true;
        }
        reserved
    }

    /// Take the part of `query` that overlaps the free interval `found` out of it.
    fn carve(&mut self, found: Interval, query: Interval) {
        if query.contains(&found) {
            trace!("Consuming free interval {found}");
            self.free.remove(&found.start());
        } else if found.start() >= query.start() {
            // Free space remains above the query only.
            trace!("Trimming start of free interval {found} to {:#x}", query.end() + 1);
            self.free.remove(&found.start());
            self.free.insert(query.end() + 1, found.end());
        } else if found.end() <= query.end() {
            // Free space remains below the query only.
            trace!("Trimming end of free interval {found} to {:#x}", query.start() - 1);
            self.free.insert(found.start(), query.start() - 1);
        } else {
            trace!("Splitting free interval {found} around {query}");
            self.free.insert(found.start(), query.start() - 1);
            self.free.insert(query.end() + 1, found.end());
        }
    }

    /// Claim exactly `query`, if it is free as one contiguous block.
    ///
    /// Nothing is reserved when `query` is only partially free.
    pub fn alloc(&mut self, query: Interval) -> bool {
        if !self.is_free(query) {
            return false;
        }
        self.reserve(query)
    }

    /// Claim the lowest `size` bytes whose start has every bit of `align_mask` clear.
    ///
    /// `align_mask` is `alignment - 1`, e.g. `0xfff` for 4 KiB pages. Free
    /// intervals are tried in ascending order and the first one that fits the
    /// aligned block wins. Returns `None` if nothing fits or `size` is zero.
    pub fn alloc_size(&mut self, size: u64, align_mask: u64) -> Option<Interval> {
        if size == 0 {
            return None;
        }

        let candidate = self.iter().find_map(|free| {
            // Starting this close to the top, `size` bytes would wrap around.
            if free.start() > PHYS_ADDR_MAX - size {
                return None;
            }
            let start = align_up(free.start(), align_mask)?;
            let candidate = Interval::from_start_size(start, size)?;
            free.contains(&candidate).then_some(candidate)
        });

        match candidate {
            Some(candidate) => {
                self.reserve(candidate);
                Some(candidate)
            }
            None => {
                debug!("No free interval fits {size:#x} bytes with alignment mask {align_mask:#x}");
                None
            }
        }
    }

    /// Claim `size` bytes aligned to `align`.
    ///
    /// See [`alloc_size`](Self::alloc_size).
    pub fn alloc_aligned(&mut self, size: u64, align: AlignMask) -> Option<Interval> {
        self.alloc_size(size, align.as_u64())
    }

    /// Write a listing of the free intervals to `out`.
    ///
    /// # Errors
    /// Propagates errors from `out`.
    pub fn dump<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "unused physical memory space:")?;
        for interval in self.iter() {
            writeln!(out, "  {interval}")?;
        }
        Ok(())
    }

    /// Log the free intervals at `info` level.
    pub fn dump_to_log(&self) {
        info!("unused physical memory space:");
        for interval in self.iter() {
            info!("  {interval}");
        }
    }
}

impl fmt::Display for PhysSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f)
    }
}

impl fmt::Debug for PhysSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
