//! Aliased circular byte queue.
//!
//! Built on [`AliasedRegion`]: any span of up to `phys_size` bytes that
//! starts inside the virtual range and ends at or before its end is
//! physically contiguous, so push and pop never split a record. The write
//! and read cursors advance monotonically and wrap at `virt_size` with a
//! conditional subtract.

use std::io;
use std::mem::{align_of, size_of};
use std::ops::{Index, IndexMut};

use bytemuck::Pod;

use crate::sys::page::round_up_to_page;
use crate::sys::vmap::AliasedRegion;

/// A circular byte buffer over an aliased mapping.
///
/// Records are any [`Pod`] type no larger than the physical window. Push is
/// always accepted; there is no full state, and pushing more than
/// `phys_size` bytes without popping overwrites the oldest data. Pop is
/// always accepted and returns whatever bytes lie at the read cursor.
///
/// Cursor discipline: a stream of same-sized records keeps both cursors
/// uniformly aligned, so a record size that divides `virt_size` (any power
/// of two qualifies, since `virt_size` is a page multiple) keeps every copy
/// inside the reservation and on the aligned fast path.
///
/// Construction fails with `Unsupported` on targets without aliased
/// mappings; check [`crate::aliasing_supported`] and fall back to
/// [`crate::SplitRing`] there.
pub struct MagicRing {
    region: AliasedRegion,
    head: usize,
    tail: usize,
}

unsafe impl Send for MagicRing {}

impl MagicRing {
    /// Virtual span is this many physical windows unless overridden.
    pub const DEFAULT_VIRT_FACTOR: usize = 16;

    /// Ring with physical size `round_up_to_page(phys_bytes)` and the
    /// default virtual span of [`Self::DEFAULT_VIRT_FACTOR`] windows.
    pub fn new(phys_bytes: usize) -> io::Result<Self> {
        Self::with_virt_factor(phys_bytes, Self::DEFAULT_VIRT_FACTOR)
    }

    /// Ring whose virtual span is `virt_factor` physical windows.
    ///
    /// A factor of 1 is the degenerate case: no aliasing, still correct.
    /// Factor 0 is clamped to 1.
    pub fn with_virt_factor(phys_bytes: usize, virt_factor: usize) -> io::Result<Self> {
        let phys = round_up_to_page(phys_bytes);
        let region = AliasedRegion::alloc(phys, virt_factor.max(1) * phys)?;
        Ok(Self {
            region,
            head: 0,
            tail: 0,
        })
    }

    /// Real backing size in bytes, a page multiple.
    #[inline]
    pub fn phys_size(&self) -> usize {
        self.region.phys_size()
    }

    /// Virtual span in bytes, a multiple of `phys_size`.
    #[inline]
    pub fn virt_size(&self) -> usize {
        self.region.virt_size()
    }

    /// Virtual windows over the physical window.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.region.slot_count()
    }

    /// Write cursor, in `[0, virt_size)`.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Read cursor, in `[0, virt_size)`.
    #[inline]
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Rewinds both cursors to zero. Memory contents are left as-is.
    #[inline]
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Appends one record at `head` with a single copy.
    #[inline]
    pub fn push<T: Pod>(&mut self, value: T) {
        let size = size_of::<T>();
        assert!(
            size > 0 && size <= self.phys_size(),
            "record size {} outside physical window of {} bytes",
            size,
            self.phys_size()
        );
        debug_assert!(self.head + size <= self.virt_size());

        unsafe {
            let dst = self.region.as_ptr().add(self.head);
            if dst as usize % align_of::<T>() == 0 {
                dst.cast::<T>().write(value);
            } else {
                dst.cast::<T>().write_unaligned(value);
            }
        }

        self.head += size;
        if self.head >= self.virt_size() {
            self.head -= self.virt_size();
        }
    }

    /// Removes one record at `tail` with a single copy.
    ///
    /// Returns garbage (but a valid `T`, since `T` is [`Pod`]) if nothing
    /// was pushed there.
    #[inline]
    pub fn pop<T: Pod>(&mut self) -> T {
        let size = size_of::<T>();
        assert!(
            size > 0 && size <= self.phys_size(),
            "record size {} outside physical window of {} bytes",
            size,
            self.phys_size()
        );
        debug_assert!(self.tail + size <= self.virt_size());

        let value = unsafe {
            let src = self.region.as_ptr().add(self.tail).cast_const();
            if src as usize % align_of::<T>() == 0 {
                src.cast::<T>().read()
            } else {
                src.cast::<T>().read_unaligned()
            }
        };

        self.tail += size;
        if self.tail >= self.virt_size() {
            self.tail -= self.virt_size();
        }
        value
    }

    /// Checked byte access at virtual offset `i`.
    #[inline]
    pub fn byte_at(&self, i: usize) -> Option<&u8> {
        if i < self.virt_size() {
            Some(unsafe { &*self.region.as_ptr().add(i) })
        } else {
            None
        }
    }

    /// The first physical window as a byte slice.
    ///
    /// Every virtual slot reads the same bytes, so this is the whole
    /// observable content of the ring.
    #[inline]
    pub fn window(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.region.as_ptr(), self.phys_size()) }
    }

    /// Mutable view of the first physical window.
    #[inline]
    pub fn window_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.region.as_ptr(), self.phys_size()) }
    }
}

impl Index<usize> for MagicRing {
    type Output = u8;

    #[inline]
    fn index(&self, i: usize) -> &u8 {
        assert!(i < self.virt_size(), "byte offset {i} outside virtual span");
        unsafe { &*self.region.as_ptr().add(i) }
    }
}

impl IndexMut<usize> for MagicRing {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut u8 {
        assert!(i < self.virt_size(), "byte offset {i} outside virtual span");
        unsafe { &mut *self.region.as_ptr().add(i) }
    }
}
