//! Property-based tests for allocator and filesystem invariants
//!
//! Uses proptest to drive random workloads and check that sector bookkeeping
//! stays exact.

use proptest::prelude::*;
use sectorfs::{BitmapAllocator, FileSystem, SectorAllocator};
use std::collections::HashSet;

proptest! {
    #[test]
    fn prop_sector_count_matches_content(
        sizes in prop::collection::vec(0usize..400, 1..20)
    ) {
        let mut fs = FileSystem::with_capacity(256).unwrap();
        let session = fs.session();

        let mut seen = HashSet::new();
        for (idx, size) in sizes.iter().enumerate() {
            let name = format!("file{}", idx);
            fs.put(&session, &name, vec![idx as u8; *size]).unwrap();

            let entry = fs.info(&session, &name).unwrap();
            prop_assert_eq!(entry.sectors.len(), size.div_ceil(64));
            for sector in entry.sectors {
                prop_assert!(seen.insert(sector), "sector {} allocated twice", sector);
            }
        }

        prop_assert_eq!(fs.allocator().used_sectors(), seen.len() as u64);
        prop_assert!(fs.check().unwrap().is_consistent());
    }

    #[test]
    fn prop_freed_sector_reused_lowest_first(
        total in 1u64..200,
        fill in 1u64..200,
        to_free in prop::collection::vec(any::<prop::sample::Index>(), 1..10)
    ) {
        let mut allocator = BitmapAllocator::new(total);
        let fill = fill.min(total);
        let allocated: Vec<u64> = (0..fill).map(|_| allocator.allocate().unwrap()).collect();
        prop_assert_eq!(&allocated, &(0..fill).collect::<Vec<_>>());

        for index in &to_free {
            let id = allocated[index.index(allocated.len())];
            allocator.free(id).unwrap();

            // every other sector below `fill` is still allocated
            let next = allocator.allocate().unwrap();
            prop_assert_eq!(next, id);
        }
    }

    #[test]
    fn prop_defrag_packs_and_preserves(
        sizes in prop::collection::vec(1usize..300, 1..16),
        removals in prop::collection::vec(any::<bool>(), 16)
    ) {
        let mut fs = FileSystem::with_capacity(128).unwrap();
        let session = fs.session();

        for (idx, size) in sizes.iter().enumerate() {
            fs.put(&session, &format!("f{}", idx), vec![idx as u8; *size]).unwrap();
        }
        for (idx, remove) in removals.iter().take(sizes.len()).enumerate() {
            if *remove {
                fs.rm(&session, &format!("f{}", idx), false).unwrap();
            }
        }

        let before: Vec<(String, Vec<u8>)> = fs
            .ls(&session, None)
            .unwrap()
            .into_iter()
            .map(|e| {
                let content = fs.get(&session, &e.name).unwrap();
                (e.name, content)
            })
            .collect();
        let expected_used: u64 = before.iter().map(|(_, c)| c.len().div_ceil(64) as u64).sum();

        let report = fs.defrag().unwrap();
        prop_assert_eq!(report.used_sectors, expected_used);

        let mut used: Vec<u64> = fs.allocator().allocated().collect();
        used.sort_unstable();
        prop_assert_eq!(used, (0..expected_used).collect::<Vec<_>>());

        for (name, content) in before {
            prop_assert_eq!(fs.get(&session, &name).unwrap(), content);
        }
        prop_assert!(fs.check().unwrap().is_consistent());
    }

    #[test]
    fn prop_move_never_changes_allocation(
        sizes in prop::collection::vec(0usize..200, 1..10)
    ) {
        let mut fs = FileSystem::with_capacity(128).unwrap();
        let session = fs.session();
        fs.mkdir(&session, "a/b").unwrap();
        for (idx, size) in sizes.iter().enumerate() {
            fs.put_into(&session, "a", &format!("f{}", idx), vec![1; *size]).unwrap();
        }
        let used = fs.allocator().used_sectors();

        fs.mv(&session, "a", "moved").unwrap();
        fs.mv(&session, "moved/f0", "/").unwrap();
        prop_assert!(fs.mv(&session, "moved", "moved/b").is_err());

        prop_assert_eq!(fs.allocator().used_sectors(), used);
        prop_assert!(fs.check().unwrap().is_consistent());
    }
}
