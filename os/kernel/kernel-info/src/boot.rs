//! # Boot Memory Map
//!
//! The loader describes physical memory as an ordered list of packed
//! descriptors, two 64-bit words each:
//!
//! ```text
//!  low word                                    high word
//!  63            10  9  8  7     4  3     0    63            10  9      0
//! ┌────────────────┬───┬──┬────────┬───────┐  ┌────────────────┬─────────┐
//! │ start >> 10    │ V │  │sub kind│ kind  │  │ end >> 10      │ (1...1) │
//! └────────────────┴───┴──┴────────┴───────┘  └────────────────┴─────────┘
//! ```
//!
//! `V` marks descriptors that describe virtual rather than physical address
//! space. Bounds have 1 KiB granularity; the low ten bits of the (inclusive)
//! end always read as ones.

use bitfield_struct::bitfield;
use core::fmt;

/// Granularity shift of descriptor bounds.
const DESC_SHIFT: u32 = 10;

/// Low bits of a descriptor end that are implied set.
const DESC_END_FILL: u64 = (1 << DESC_SHIFT) - 1;

/// What a boot memory map entry describes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MemoryKind {
    /// `0x0` — unused entry.
    Undefined,
    /// `0x1` — ordinary RAM.
    Conventional,
    /// `0x2` — reserved by the platform.
    Reserved,
    /// `0x3` — dedicated to a device or driver.
    Dedicated,
    /// `0x4` — shared between components.
    Shared,
    /// `0xd` — informational entry, does not claim memory.
    Info,
    /// `0xe` — owned by the boot loader.
    Bootloader,
    /// `0xf` — architecture specific.
    Arch,
    /// Any other encoding.
    Unknown(u8),
}

impl MemoryKind {
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw & 0x0f {
            0x0 => Self::Undefined,
            0x1 => Self::Conventional,
            0x2 => Self::Reserved,
            0x3 => Self::Dedicated,
            0x4 => Self::Shared,
            0xd => Self::Info,
            0xe => Self::Bootloader,
            0xf => Self::Arch,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn into_raw(self) -> u8 {
        match self {
            Self::Undefined => 0x0,
            Self::Conventional => 0x1,
            Self::Reserved => 0x2,
            Self::Dedicated => 0x3,
            Self::Shared => 0x4,
            Self::Info => 0xd,
            Self::Bootloader => 0xe,
            Self::Arch => 0xf,
            Self::Unknown(raw) => raw & 0x0f,
        }
    }

    /// Whether an entry of this kind takes its range out of the free physical space.
    ///
    /// All claiming kinds are treated alike; RAM handed out by the loader is
    /// not free for early boot code to carve from either.
    #[must_use]
    pub const fn claims_physical_space(self) -> bool {
        matches!(
            self,
            Self::Arch
                | Self::Conventional
                | Self::Reserved
                | Self::Dedicated
                | Self::Shared
                | Self::Bootloader
        )
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Conventional => f.write_str("conventional"),
            Self::Reserved => f.write_str("reserved"),
            Self::Dedicated => f.write_str("dedicated"),
            Self::Shared => f.write_str("shared"),
            Self::Info => f.write_str("info"),
            Self::Bootloader => f.write_str("bootloader"),
            Self::Arch => f.write_str("arch"),
            Self::Unknown(raw) => write!(f, "unknown({raw:#x})"),
        }
    }
}

/// A decoded boot memory map entry covering `[start, end]`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemoryDescriptor {
    /// First byte of the range.
    pub start: u64,
    /// Last byte of the range (inclusive).
    pub end: u64,
    pub kind: MemoryKind,
    /// Kind specific qualifier, opaque to the kernel.
    pub sub_kind: u8,
    /// Set for entries describing virtual address space.
    pub is_virtual: bool,
}

impl MemoryDescriptor {
    #[must_use]
    pub const fn new(start: u64, end: u64, kind: MemoryKind) -> Self {
        Self {
            start,
            end,
            kind,
            sub_kind: 0,
            is_virtual: false,
        }
    }

    #[must_use]
    pub const fn with_sub_kind(mut self, sub_kind: u8) -> Self {
        self.sub_kind = sub_kind;
        self
    }

    #[must_use]
    pub const fn with_virtual(mut self, is_virtual: bool) -> Self {
        self.is_virtual = is_virtual;
        self
    }

    /// Whether this entry removes its range from the free physical space.
    #[must_use]
    pub const fn claims_physical_space(&self) -> bool {
        !self.is_virtual && self.kind.claims_physical_space()
    }
}

/// Low word of a packed descriptor.
#[bitfield(u64, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct RawDescriptorLow {
    /// Bits 0–3 — memory kind.
    #[bits(4)]
    pub kind: u8,

    /// Bits 4–7 — kind specific qualifier.
    #[bits(4)]
    pub sub_kind: u8,

    /// Bit 8 — reserved.
    #[bits(1)]
    __: u8,

    /// Bit 9 — virtual address space.
    pub is_virtual: bool,

    /// Bits 10–63 — start address in KiB.
    #[bits(54)]
    pub start_kib: u64,
}

/// High word of a packed descriptor.
#[bitfield(u64, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct RawDescriptorHigh {
    /// Bits 0–9 — implied set in the decoded end address.
    #[bits(10)]
    __: u16,

    /// Bits 10–63 — end address in KiB.
    #[bits(54)]
    pub end_kib: u64,
}

/// A packed boot memory map entry, as written by the loader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawMemoryDescriptor {
    pub low: RawDescriptorLow,
    pub high: RawDescriptorHigh,
}

impl RawMemoryDescriptor {
    /// Pack a descriptor.
    ///
    /// Bounds are stored with 1 KiB granularity: the start is truncated and the
    /// end is widened to the last byte of its KiB.
    #[must_use]
    pub const fn encode(desc: &MemoryDescriptor) -> Self {
        let low = RawDescriptorLow::new()
            .with_kind(desc.kind.into_raw())
            .with_sub_kind(desc.sub_kind & 0x0f)
            .with_is_virtual(desc.is_virtual)
            .with_start_kib(desc.start >> DESC_SHIFT);
        let high = RawDescriptorHigh::new().with_end_kib(desc.end >> DESC_SHIFT);
        Self { low, high }
    }

    #[must_use]
    pub const fn decode(&self) -> MemoryDescriptor {
        MemoryDescriptor {
            start: self.low.start_kib() << DESC_SHIFT,
            end: (self.high.end_kib() << DESC_SHIFT) | DESC_END_FILL,
            kind: MemoryKind::from_raw(self.low.kind()),
            sub_kind: self.low.sub_kind(),
            is_virtual: self.low.is_virtual(),
        }
    }
}

impl From<&MemoryDescriptor> for RawMemoryDescriptor {
    fn from(value: &MemoryDescriptor) -> Self {
        Self::encode(value)
    }
}

/// Problems found while validating a boot memory map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootMapError {
    #[error("descriptor {index} ends before it starts ({start:#x}-{end:#x})")]
    InvertedDescriptor { index: usize, start: u64, end: u64 },
}

/// Borrowed view of the loader's descriptor array.
#[derive(Copy, Clone, Debug)]
pub struct BootMemoryMap<'a> {
    descriptors: &'a [RawMemoryDescriptor],
}

impl<'a> BootMemoryMap<'a> {
    #[must_use]
    pub const fn new(descriptors: &'a [RawMemoryDescriptor]) -> Self {
        Self { descriptors }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Decoded descriptors, in map order.
    pub fn iter(&self) -> impl Iterator<Item = MemoryDescriptor> + use<'a> {
        let descriptors = self.descriptors;
        descriptors.iter().map(RawMemoryDescriptor::decode)
    }

    /// Check that every descriptor describes a non-empty range.
    ///
    /// # Errors
    /// Reports the first descriptor whose end lies before its start.
    pub fn validate(&self) -> Result<(), BootMapError> {
        for (index, desc) in self.iter().enumerate() {
            if desc.start > desc.end {
                return Err(BootMapError::InvertedDescriptor {
                    index,
                    start: desc.start,
                    end: desc.end,
                });
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for BootMemoryMap<'a> {
    type Item = MemoryDescriptor;
    type IntoIter = core::iter::Map<
        core::slice::Iter<'a, RawMemoryDescriptor>,
        fn(&RawMemoryDescriptor) -> MemoryDescriptor,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors
            .iter()
            .map(RawMemoryDescriptor::decode as fn(&RawMemoryDescriptor) -> MemoryDescriptor)
    }
}
