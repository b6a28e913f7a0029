//! Alignment masks.
//!
//! Allocation requests state their alignment as a mask of the low address bits
//! that must be zero (`align - 1`), not as the alignment itself.

use crate::PhysAddr;
use kernel_info::memory::PAGE_MASK;

/// A mask of contiguous low bits (`2^k - 1`).
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct AlignMask(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlignMaskError {
    #[error("alignment mask {0:#x} is not of the form 2^k - 1")]
    NotContiguous(u64),
}

impl AlignMask {
    /// Byte alignment.
    pub const NONE: Self = Self(0);

    /// Page alignment.
    pub const PAGE: Self = Self(PAGE_MASK);

    /// # Errors
    /// [`AlignMaskError::NotContiguous`] unless `mask` consists of contiguous
    /// low bits.
    pub const fn new(mask: u64) -> Result<Self, AlignMaskError> {
        if mask & mask.wrapping_add(1) != 0 {
            return Err(AlignMaskError::NotContiguous(mask));
        }
        Ok(Self(mask))
    }

    /// The mask for a power-of-two byte alignment.
    #[must_use]
    pub const fn from_align(align: u64) -> Option<Self> {
        if align.is_power_of_two() {
            Some(Self(align - 1))
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Round `addr` up to the alignment, or `None` if that wraps.
    #[inline]
    #[must_use]
    pub const fn align_up(self, addr: PhysAddr) -> Option<PhysAddr> {
        align_up(addr, self.0)
    }
}

/// Round `addr` up so that the bits in `mask` are clear.
#[inline]
pub(crate) const fn align_up(addr: PhysAddr, mask: u64) -> Option<PhysAddr> {
    match addr.checked_add(mask) {
        Some(v) => Some(v & !mask),
        None => None,
    }
}
