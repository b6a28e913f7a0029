//! # Kernel Boot Interface and Physical Layout
//!
//! Contracts shared between the boot loader and the kernel's earliest memory
//! bookkeeping.
//!
//! ## Boot Memory Map ([`boot`])
//! The loader hands over an ordered list of packed descriptors, each tagging a
//! range of physical (or virtual) address space with a [`MemoryKind`](boot::MemoryKind):
//! * **Raw form**: [`RawMemoryDescriptor`](boot::RawMemoryDescriptor), two
//!   64-bit words with 1 KiB granularity
//! * **Decoded form**: [`MemoryDescriptor`](boot::MemoryDescriptor), plain
//!   inclusive `[start, end]` bounds
//! * **Map view**: [`BootMemoryMap`](boot::BootMemoryMap) over the loader's array
//!
//! ## Physical Layout ([`memory`])
//! Page size, the floor below which physical memory is never handed out, and
//! overflow-safe page rounding helpers.
//!
//! ```rust
//! use kernel_info::boot::{BootMemoryMap, MemoryDescriptor, MemoryKind, RawMemoryDescriptor};
//!
//! let raw = [RawMemoryDescriptor::encode(&MemoryDescriptor::new(
//!     0x0,
//!     0x9_fbff,
//!     MemoryKind::Conventional,
//! ))];
//! let map = BootMemoryMap::new(&raw);
//! assert!(map.validate().is_ok());
//! assert!(map.iter().all(|d| d.claims_physical_space()));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
