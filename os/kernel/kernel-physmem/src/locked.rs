//! Shared access to a [`PhysSpace`] from several CPUs.
//!
//! Early boot is single threaded and should own its [`PhysSpace`] directly.
//! Once secondary CPUs come up, wrap it in a [`LockedPhysSpace`]: every call
//! holds the lock for the whole operation, so no other CPU ever observes a
//! half-carved free set.

use crate::{Interval, PhysSpace};
use kernel_sync::{SpinLock, SpinLockGuard};

/// Guard over the tracker; dereferences to [`PhysSpace`].
pub type PhysSpaceGuard<'a> = SpinLockGuard<'a, PhysSpace>;

#[derive(Default)]
pub struct LockedPhysSpace(SpinLock<PhysSpace>);

impl LockedPhysSpace {
    #[must_use]
    pub const fn new(space: PhysSpace) -> Self {
        Self(SpinLock::new(space))
    }

    #[inline]
    pub fn try_lock(&self) -> Option<PhysSpaceGuard<'_>> {
        self.0.try_lock()
    }

    #[inline]
    pub fn lock(&self) -> PhysSpaceGuard<'_> {
        self.0.lock()
    }

    #[inline]
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut PhysSpace) -> R) -> R {
        self.0.with_lock(f)
    }

    #[inline]
    pub const fn get_mut(&mut self) -> &mut PhysSpace {
        self.0.get_mut()
    }

    #[must_use]
    pub fn into_inner(self) -> PhysSpace {
        self.0.into_inner()
    }

    /// [`PhysSpace::reserve`] under the lock.
    pub fn reserve(&self, query: Interval) -> bool {
        self.with_lock(|space| space.reserve(query))
    }

    /// [`PhysSpace::alloc`] under the lock.
    pub fn alloc(&self, query: Interval) -> bool {
        self.with_lock(|space| space.alloc(query))
    }

    /// [`PhysSpace::alloc_size`] under the lock.
    pub fn alloc_size(&self, size: u64, align_mask: u64) -> Option<Interval> {
        self.with_lock(|space| space.alloc_size(size, align_mask))
    }
}

impl From<PhysSpace> for LockedPhysSpace {
    fn from(space: PhysSpace) -> Self {
        Self::new(space)
    }
}
