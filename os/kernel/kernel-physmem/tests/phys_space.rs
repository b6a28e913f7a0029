use kernel_info::boot::{BootMemoryMap, MemoryDescriptor, MemoryKind, RawMemoryDescriptor};
use kernel_info::memory::{PHYS_ADDR_MAX, PHYS_SPACE_FLOOR};
use kernel_physmem::{AlignMask, Interval, PhysSpace, PhysSpaceConfig};

fn free(space: &PhysSpace) -> Vec<(u64, u64)> {
    space.iter().map(|i| (i.start(), i.end())).collect()
}

/// No two stored intervals overlap, and they are sorted by start.
fn assert_disjoint(space: &PhysSpace) {
    let intervals: Vec<_> = space.iter().collect();
    for pair in intervals.windows(2) {
        assert!(
            pair[0].end() < pair[1].start(),
            "{:?} and {:?} are not disjoint",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn split_in_the_middle() {
    let mut space = PhysSpace::with_seed(Interval::new(0, 999));
    assert!(space.reserve(Interval::new(400, 499)));
    assert_eq!(free(&space), [(0, 399), (500, 999)]);
}

#[test]
fn exact_allocation() {
    let mut space = PhysSpace::from_intervals([Interval::new(0, 399), Interval::new(500, 999)]);
    assert!(space.alloc(Interval::new(0, 399)));
    assert_eq!(free(&space), [(500, 999)]);

    // no longer free
    assert!(!space.alloc(Interval::new(0, 399)));
    assert_eq!(free(&space), [(500, 999)]);
}

#[test]
fn exact_allocation_is_all_or_nothing() {
    let mut space = PhysSpace::from_intervals([Interval::new(0, 399), Interval::new(500, 999)]);

    // straddles the reserved gap
    assert!(!space.alloc(Interval::new(300, 600)));
    // runs past the end of a free interval
    assert!(!space.alloc(Interval::new(900, 1100)));
    assert_eq!(free(&space), [(0, 399), (500, 999)]);

    assert!(space.alloc(Interval::new(600, 699)));
    assert_eq!(free(&space), [(0, 399), (500, 599), (700, 999)]);
}

#[test]
fn aligned_first_fit() {
    let mut space = PhysSpace::with_seed(Interval::new(500, 999));
    let got = space.alloc_size(100, 0xf).expect("100 bytes fit");

    assert_eq!(got.start() & 0xf, 0);
    assert!(got.start() >= 500);
    assert_eq!(got.end(), got.start() + 99);
    assert!(got.end() <= 999);

    assert_eq!(got, Interval::new(512, 611));
    assert_eq!(free(&space), [(500, 511), (612, 999)]);
}

#[test]
fn first_fit_prefers_lowest_interval() {
    let mut space = PhysSpace::from_intervals([
        Interval::new(0x1000, 0x1fff),
        Interval::new(0x10_0000, 0x1f_ffff),
    ]);
    assert_eq!(space.alloc_size(0x800, 0xff), Some(Interval::new(0x1000, 0x17ff)));
    assert_eq!(space.alloc_size(0x1000, 0xfff), Some(Interval::new(0x10_0000, 0x10_0fff)));
}

#[test]
fn no_fit_leaves_state_untouched() {
    let mut space = PhysSpace::with_seed(Interval::new(0, 50));
    assert_eq!(space.alloc_size(1000, 0), None);
    assert_eq!(free(&space), [(0, 50)]);
}

#[test]
fn no_candidate_near_the_top_of_the_address_space() {
    let mut space = PhysSpace::with_seed(Interval::new(PHYS_ADDR_MAX - 0xff, PHYS_ADDR_MAX));

    // Starting within `size` of the top is never considered.
    assert_eq!(space.alloc_size(0x100, 0), None);
    assert_eq!(space.alloc_size(0x1000, 0), None);
    // Aligning up past the top fails instead of wrapping to zero.
    assert_eq!(space.alloc_size(0x10, 0xfff), None);
    assert_eq!(free(&space), [(PHYS_ADDR_MAX - 0xff, PHYS_ADDR_MAX)]);

    assert_eq!(
        space.alloc_size(0x80, 0),
        Some(Interval::new(PHYS_ADDR_MAX - 0xff, PHYS_ADDR_MAX - 0x80))
    );
}

#[test]
fn typed_alignment_matches_raw_mask() {
    let mut a = PhysSpace::with_seed(Interval::new(0x1234, 0xf_ffff));
    let mut b = a.clone();
    let mask = AlignMask::from_align(0x1000).unwrap();
    assert_eq!(a.alloc_aligned(0x3000, mask), b.alloc_size(0x3000, 0xfff));
    assert_eq!(a, b);
}

#[test]
fn reservation_is_idempotent() {
    let mut space = PhysSpace::with_seed(Interval::new(0, 0xffff));
    let window = Interval::new(0x2000, 0x2fff);
    assert!(space.reserve(window));
    assert!(!space.reserve(window));
    assert_eq!(free(&space), [(0, 0x1fff), (0x3000, 0xffff)]);
}

#[test]
fn reserve_outside_free_space_is_a_no_op() {
    let mut space = PhysSpace::with_seed(Interval::new(0x1000, 0x1fff));
    assert!(!space.reserve(Interval::new(0, 0xfff)));
    assert!(!space.reserve(Interval::new(0x2000, 0x2fff)));
    assert_eq!(free(&space), [(0x1000, 0x1fff)]);
}

#[test]
fn boot_map_leaves_only_unclaimed_pages() {
    let map = [
        MemoryDescriptor::new(0x0, 0x9_fbff, MemoryKind::Conventional),
        MemoryDescriptor::new(0x100_0000, 0x3fff_ffff, MemoryKind::Conventional),
        MemoryDescriptor::new(0x4000_0000, 0x4000_03ff, MemoryKind::Bootloader),
        MemoryDescriptor::new(0x4010_0800, 0x4010_0bff, MemoryKind::Reserved),
        MemoryDescriptor::new(0xfec0_0000, 0xfec0_0fff, MemoryKind::Arch),
        MemoryDescriptor::new(0xfee0_0000, 0xfee0_0fff, MemoryKind::Dedicated),
        MemoryDescriptor::new(0x1_0000_0000, 0x1_0fff_ffff, MemoryKind::Shared),
        // none of these claim anything
        MemoryDescriptor::new(0x5000_0000, 0x5fff_ffff, MemoryKind::Info),
        MemoryDescriptor::new(0x6000_0000, 0x6fff_ffff, MemoryKind::Conventional)
            .with_virtual(true),
        MemoryDescriptor::new(0x7000_0000, 0x7000_0fff, MemoryKind::Unknown(0x7)),
    ];

    let space = PhysSpace::new_from_boot_map(map, &PhysSpaceConfig::new().with_verbose(true));
    assert_disjoint(&space);
    assert_eq!(
        free(&space),
        [
            (0x4000_1000, 0x400f_ffff),
            (0x4010_1000, 0xfebf_ffff),
            (0xfec0_1000, 0xfedf_ffff),
            (0xfee0_1000, 0xffff_ffff),
            (0x1_1000_0000, PHYS_ADDR_MAX),
        ]
    );
}

#[test]
fn boot_map_seed_starts_at_floor() {
    let no_entries = std::iter::empty::<MemoryDescriptor>;

    let space = PhysSpace::new_from_boot_map(no_entries(), &PhysSpaceConfig::default());
    assert_eq!(free(&space), [(PHYS_SPACE_FLOOR, PHYS_ADDR_MAX)]);

    let config = PhysSpaceConfig::new().with_floor(0x1000);
    let space = PhysSpace::new_from_boot_map(no_entries(), &config);
    assert_eq!(free(&space), [(0x1000, PHYS_ADDR_MAX)]);
}

#[test]
fn boot_map_entry_in_the_last_page() {
    let map = [MemoryDescriptor::new(
        PHYS_ADDR_MAX - 0x7ff,
        PHYS_ADDR_MAX,
        MemoryKind::Reserved,
    )];
    let space = PhysSpace::new_from_boot_map(map, &PhysSpaceConfig::new());
    assert_eq!(free(&space), [(PHYS_SPACE_FLOOR, PHYS_ADDR_MAX - 0x1000)]);
}

#[test]
fn boot_map_from_raw_descriptors() {
    let raw: Vec<RawMemoryDescriptor> = [
        MemoryDescriptor::new(0x100_0000, 0x1ff_ffff, MemoryKind::Conventional),
        MemoryDescriptor::new(0x300_0000, 0x3ff_ffff, MemoryKind::Reserved).with_virtual(true),
    ]
    .iter()
    .map(RawMemoryDescriptor::from)
    .collect();

    let map = BootMemoryMap::new(&raw);
    map.validate().expect("well formed map");

    let space = PhysSpace::new_from_boot_map(map, &PhysSpaceConfig::new());
    assert_eq!(free(&space), [(0x200_0000, PHYS_ADDR_MAX)]);
}

#[test]
fn is_free_requires_one_block() {
    let space = PhysSpace::from_intervals([Interval::new(0, 99), Interval::new(100, 199)]);
    assert!(space.is_free(Interval::new(0, 99)));
    assert!(space.is_free(Interval::new(150, 160)));
    // adjacent free intervals are never merged
    assert!(!space.is_free(Interval::new(50, 150)));
}

/// Tiny deterministic generator so the property test needs no extra crates.
struct Lcg(u64);

impl Lcg {
    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

#[test]
fn coverage_is_conserved_across_operations() {
    const TOP: u64 = 0xf_ffff;

    let mut space = PhysSpace::with_seed(Interval::new(0, TOP));
    let mut claimed = vec![false; usize::try_from(TOP + 1).unwrap()];
    let mut rng = Lcg(0x5eed);

    let mark = |claimed: &mut Vec<bool>, i: Interval| {
        for addr in i.start()..=i.end() {
            claimed[usize::try_from(addr).unwrap()] = true;
        }
    };

    for round in 0..400 {
        let start = rng.below(TOP);
        let len = 1 + rng.below(0x2000);
        let query = Interval::new(start, (start + len - 1).min(TOP));

        match round % 3 {
            0 => {
                let any_free = (query.start()..=query.end())
                    .any(|a| !claimed[usize::try_from(a).unwrap()]);
                assert_eq!(space.reserve(query), any_free, "reserve {query:?}");
                mark(&mut claimed, query);
            }
            1 => {
                let all_free = (query.start()..=query.end())
                    .all(|a| !claimed[usize::try_from(a).unwrap()]);
                let was_one_block = space.is_free(query);
                let ok = space.alloc(query);
                assert_eq!(ok, was_one_block, "alloc {query:?}");
                if ok {
                    assert!(all_free);
                    mark(&mut claimed, query);
                }
            }
            _ => {
                let mask = (1u64 << rng.below(10)) - 1;
                if let Some(got) = space.alloc_size(len, mask) {
                    assert_eq!(got.start() & mask, 0);
                    assert_eq!(got.size(), u128::from(len));
                    assert!((got.start()..=got.end()).all(|a| !claimed[usize::try_from(a).unwrap()]));
                    mark(&mut claimed, got);
                }
            }
        }

        assert_disjoint(&space);
    }

    // free space and claimed space partition [0, TOP]
    for interval in space.iter() {
        for addr in interval.start()..=interval.end() {
            assert!(!claimed[usize::try_from(addr).unwrap()]);
        }
    }
    let free_count = claimed.iter().filter(|c| !**c).count();
    assert_eq!(space.free_bytes(), free_count as u128);
}

#[test]
fn inverted_query_never_reaches_the_free_set() {
    let space = PhysSpace::with_seed(Interval::new(0, 100));

    assert!(std::panic::catch_unwind(|| Interval::new(10, 5)).is_err());
    assert!(Interval::try_new(10, 5).is_err());
    assert_eq!(free(&space), [(0, 100)]);
}
