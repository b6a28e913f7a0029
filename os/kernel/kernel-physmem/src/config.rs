//! Construction options for [`PhysSpace`](crate::PhysSpace).

use crate::PhysAddr;
use kernel_info::memory::PHYS_SPACE_FLOOR;

/// Options applied when building the free space from a boot memory map.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PhysSpaceConfig {
    floor: PhysAddr,
    verbose: bool,
}

impl PhysSpaceConfig {
    /// Seed at [`PHYS_SPACE_FLOOR`], quiet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            floor: PHYS_SPACE_FLOOR,
            verbose: false,
        }
    }

    /// Lowest address considered free before the boot map is applied.
    #[must_use]
    pub const fn with_floor(mut self, floor: PhysAddr) -> Self {
        self.floor = floor;
        self
    }

    /// Log every boot map reservation at `info` instead of `trace`.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub const fn floor(&self) -> PhysAddr {
        self.floor
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }
}

impl Default for PhysSpaceConfig {
    fn default() -> Self {
        Self::new()
    }
}
