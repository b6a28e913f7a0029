//! # Boot-Time Physical Address Space Tracker
//!
//! Keeps track of which physical address ranges are still unclaimed while the
//! kernel boots, before a frame allocator exists.
//!
//! ## Lifecycle
//!
//! ```text
//! boot memory map ──► PhysSpace::new_from_boot_map
//!                          │
//!                          ├─ reserve(interval)      fixed windows, firmware holes
//!                          ├─ alloc(interval)        exact placement, all-or-nothing
//!                          ├─ alloc_size(size, mask) first fit, aligned
//!                          │
//!                          ▼
//!                  remaining free intervals ──► frame allocator
//! ```
//!
//! The tracker only ever removes space. There is no free operation; once the
//! frame allocator takes over, it is handed whatever is left.
//!
//! ## Core Components
//!
//! * [`Interval`]: closed `[start, end]` range with containment and the
//!   overlap ordering used to search the free set
//! * [`PhysSpace`]: the free set itself
//! * [`PhysSpaceConfig`]: seed floor and verbosity for boot map ingestion
//! * [`AlignMask`]: typed `align - 1` masks
//! * [`LockedPhysSpace`]: spin-locked wrapper for multi-CPU boot paths
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::boot::{MemoryDescriptor, MemoryKind};
//! use kernel_physmem::{AlignMask, Interval, PhysSpace, PhysSpaceConfig};
//!
//! let map = [
//!     MemoryDescriptor::new(0x0, 0x9_fbff, MemoryKind::Conventional),
//!     MemoryDescriptor::new(0x100_0000, 0x7fff_ffff, MemoryKind::Conventional),
//!     MemoryDescriptor::new(0xfec0_0000, 0xfec0_0fff, MemoryKind::Arch),
//! ];
//! let mut space = PhysSpace::new_from_boot_map(map, &PhysSpaceConfig::new());
//!
//! // A fixed window the platform code knows about.
//! assert!(space.alloc(Interval::new(0x8000_0000, 0x8000_ffff)));
//!
//! // Anything page aligned will do.
//! let buffer = space.alloc_aligned(0x20_0000, AlignMask::PAGE).unwrap();
//! assert_eq!(buffer.start() & 0xfff, 0);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

mod align;
mod config;
mod interval;
mod locked;
mod phys_space;

pub use align::{AlignMask, AlignMaskError};
pub use config::PhysSpaceConfig;
pub use interval::{Interval, IntervalError, PhysAddr};
pub use locked::{LockedPhysSpace, PhysSpaceGuard};
pub use phys_space::PhysSpace;
