use magicring::FlatBuffer;

#[test]
fn reports_count_and_byte_size() {
    let buf = FlatBuffer::<u32>::new(1024).unwrap();
    assert_eq!(buf.count(), 1024);
    assert_eq!(buf.size_bytes(), 4096);
}

#[test]
fn fresh_buffer_is_zeroed() {
    let buf = FlatBuffer::<u64>::new(256).unwrap();
    assert!(buf.as_slice().iter().all(|&x| x == 0));
}

#[test]
fn indexed_writes_read_back() {
    let mut buf = FlatBuffer::<u32>::new(100).unwrap();
    for i in 0..100 {
        buf[i] = i as u32 * 3;
    }
    for i in 0..100 {
        assert_eq!(buf[i], i as u32 * 3);
    }
    assert_eq!(*buf.get(99).unwrap(), 99 * 3);
}

#[test]
fn checked_access_bounds_at_count() {
    let mut buf = FlatBuffer::<u32>::new(8).unwrap();
    assert!(buf.get(7).is_some());
    assert!(buf.get(8).is_none());
    assert!(buf.get_mut(8).is_none());
}

#[test]
#[should_panic]
fn indexing_past_the_end_panics() {
    let buf = FlatBuffer::<u32>::new(8).unwrap();
    let _ = buf[8];
}

#[test]
fn unchecked_access_matches_checked() {
    let mut buf = FlatBuffer::<u16>::new(16).unwrap();
    buf[5] = 777;
    unsafe {
        assert_eq!(*buf.get_unchecked(5), 777);
        *buf.get_unchecked_mut(5) = 778;
    }
    assert_eq!(buf[5], 778);
}

#[test]
fn buffers_move_without_copying_contents() {
    let mut buf = FlatBuffer::<u64>::new(4).unwrap();
    buf[0] = 42;
    let base = buf.as_slice().as_ptr();

    let moved = buf;
    assert_eq!(moved.as_slice().as_ptr(), base);
    assert_eq!(moved[0], 42);
}
