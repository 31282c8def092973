// Physical-footprint checks: the whole point of the aliased ring is that a
// huge virtual span costs only one physical window.
//
// memory-stats reads process-wide numbers, so these run serialized.
#![cfg(target_os = "linux")]

use serial_test::serial;

#[test]
#[serial]
fn huge_virtual_reservation_costs_no_physical_memory() {
    use memory_stats::memory_stats;

    let before = memory_stats().expect("memory stats unavailable");

    // 64 KiB of backing spread over a 1 GiB virtual span.
    let phys = 16 * 4096;
    let mut ring = magicring::MagicRing::with_virt_factor(phys, 16 * 1024).unwrap();
    assert_eq!(ring.virt_size(), 1 << 30);

    // Dirty one full physical window worth of records.
    for i in 0..(phys / 8) as u64 {
        ring.push(i);
    }

    let after = memory_stats().expect("memory stats unavailable");
    let delta = after.physical_mem as i64 - before.physical_mem as i64;
    println!(
        "virtual span: {} MiB, physical delta: {} KiB",
        ring.virt_size() >> 20,
        delta / 1024
    );

    // The reservation itself must not page anything in; allow generous
    // noise from the allocator and the test harness.
    assert!(
        delta < (16 << 20),
        "1 GiB reservation grew resident memory by {delta} bytes"
    );
}

#[test]
#[serial]
fn dropping_a_ring_releases_its_mapping() {
    use memory_stats::memory_stats;

    let phys = 1 << 20;
    let before = memory_stats().expect("memory stats unavailable");

    for _ in 0..8 {
        let mut ring = magicring::MagicRing::with_virt_factor(phys, 4).unwrap();
        for i in 0..(phys / 8) as u64 {
            ring.push(i);
        }
    }

    let after = memory_stats().expect("memory stats unavailable");
    let delta = after.physical_mem as i64 - before.physical_mem as i64;
    println!("physical delta after 8 ring lifetimes: {} KiB", delta / 1024);

    // Eight 1 MiB windows were dirtied and unmapped; only noise may remain.
    assert!(
        delta < (4 << 20),
        "dropped rings leaked {delta} bytes of resident memory"
    );
}
