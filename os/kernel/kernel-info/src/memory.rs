//! # Physical Memory Layout

/// Base page size used to round boot memory map entries.
pub const PAGE_SIZE: u64 = 4096;

/// Low bits of an address that lie within a [`PAGE_SIZE`] page.
pub const PAGE_MASK: u64 = PAGE_SIZE - 1;

/// Lowest physical address the boot-time free space tracker ever hands out.
///
/// Everything below this floor is treated as claimed regardless of what the
/// boot memory map says, since legacy regions, the loader and the kernel image
/// all live down there.
pub const PHYS_SPACE_FLOOR: u64 = 4 << 22; // 16 MiB

/// Highest representable physical address.
pub const PHYS_ADDR_MAX: u64 = u64::MAX;

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(PHYS_SPACE_FLOOR.is_multiple_of(PAGE_SIZE));
    assert!(PHYS_SPACE_FLOOR < PHYS_ADDR_MAX);
};

/// Round `addr` down to the base of its page.
#[inline]
#[must_use]
pub const fn trunc_page(addr: u64) -> u64 {
    addr & !PAGE_MASK
}

/// Round `addr` up to the next page boundary.
///
/// Returns `None` if the next boundary is not representable.
#[inline]
#[must_use]
pub const fn round_page(addr: u64) -> Option<u64> {
    match addr.checked_add(PAGE_MASK) {
        Some(v) => Some(trunc_page(v)),
        None => None,
    }
}

/// The last byte of the page containing `addr`.
///
/// Equivalent to `round_page(addr + 1) - 1` but never wraps.
#[inline]
#[must_use]
pub const fn page_last_byte(addr: u64) -> u64 {
    addr | PAGE_MASK
}
