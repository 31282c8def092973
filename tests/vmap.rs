// Aliased mapping tests. The mapping itself is Linux-only; other targets
// only get the capability probe.

#[cfg(target_os = "linux")]
mod linux_tests {
    use magicring::sys::page::page_size;
    use magicring::AliasedRegion;

    #[test]
    fn region_reports_rounded_page_aligned_sizes() {
        let region = AliasedRegion::alloc(5000, 0).unwrap();

        assert!(!region.as_ptr().is_null());
        assert_eq!(region.as_ptr() as usize % page_size(), 0);
        assert_eq!(region.phys_size() % page_size(), 0);
        assert_eq!(region.virt_size() % region.phys_size(), 0);
        assert!(region.phys_size() >= 5000);
        // v_req of 0 clamps to a single slot.
        assert_eq!(region.virt_size(), region.phys_size());
        assert_eq!(region.slot_count(), 1);
    }

    #[test]
    fn virtual_size_rounds_to_whole_slots() {
        let page = page_size();
        // Ask for two and a half windows; expect three.
        let region = AliasedRegion::alloc(2 * page, 5 * page).unwrap();
        assert_eq!(region.phys_size(), 2 * page);
        assert_eq!(region.virt_size(), 6 * page);
        assert_eq!(region.slot_count(), 3);
    }

    #[test]
    fn every_slot_aliases_the_physical_window() {
        let page = page_size();
        let region = AliasedRegion::alloc(page, 8 * page).unwrap();
        let phys = region.phys_size();

        unsafe {
            let base = region.as_ptr();
            for (byte, offset) in [(0x42u8, 0usize), (0x17, 1), (0xA5, phys / 2), (0xFF, phys - 1)]
            {
                base.add(offset).write(byte);
                for slot in 0..region.slot_count() {
                    assert_eq!(
                        base.add(slot * phys + offset).read(),
                        byte,
                        "slot {slot} does not alias offset {offset}"
                    );
                }
            }

            // Writes through a high slot land in the physical window too.
            let last = region.slot_count() - 1;
            base.add(last * phys + 3).write(0x77);
            assert_eq!(base.add(3).read(), 0x77);
        }
    }

    #[test]
    fn degenerate_single_slot_region_is_usable() {
        let region = AliasedRegion::alloc(page_size(), page_size()).unwrap();
        assert_eq!(region.slot_count(), 1);
        unsafe {
            region.as_ptr().write(0x5A);
            assert_eq!(region.as_ptr().read(), 0x5A);
        }
    }

    #[test]
    fn fresh_region_is_zero_filled() {
        let region = AliasedRegion::alloc(page_size(), 0).unwrap();
        unsafe {
            for i in 0..region.phys_size() {
                assert_eq!(region.as_ptr().add(i).read(), 0);
            }
        }
    }

    #[test]
    fn regions_are_independent() {
        let a = AliasedRegion::alloc(page_size(), 0).unwrap();
        let b = AliasedRegion::alloc(page_size(), 0).unwrap();
        unsafe {
            a.as_ptr().write(1);
            b.as_ptr().write(2);
            assert_eq!(a.as_ptr().read(), 1);
            assert_eq!(b.as_ptr().read(), 2);
        }
    }

    #[test]
    fn capability_probe_is_true_here() {
        assert!(magicring::aliasing_supported());
    }
}

#[cfg(not(target_os = "linux"))]
mod other_targets {
    #[test]
    fn capability_probe_is_false_here() {
        assert!(!magicring::aliasing_supported());
    }

    #[test]
    fn alloc_refuses_with_unsupported() {
        let err = magicring::AliasedRegion::alloc(4096, 0).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);

        let err = magicring::MagicRing::new(4096).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
    }
}
