//! Conventional circular byte queue over a flat allocation.
//!
//! Same operation surface and overwrite discipline as the aliased ring, but
//! a record that straddles the end of the allocation is copied in two
//! parts. This is the comparison baseline for the aliased ring and the
//! fallback on targets without aliased mappings.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::io;
use std::mem::size_of;
use std::ops::{Index, IndexMut};
use std::ptr::{self, NonNull};

use bytemuck::Pod;

use crate::sys::page::{page_size, round_up_to_page};

/// A circular byte buffer over a single flat, page-aligned allocation.
///
/// Cursors live in `[0, capacity)`. Push is always accepted and overwrites
/// silently on overrun; pop is always accepted and returns whatever bytes
/// lie at the read cursor.
pub struct SplitRing {
    buf: NonNull<u8>,
    layout: Layout,
    head: usize,
    tail: usize,
}

unsafe impl Send for SplitRing {}

impl SplitRing {
    /// Ring over `round_up_to_page(bytes)` zeroed bytes.
    pub fn new(bytes: usize) -> io::Result<Self> {
        let capacity = round_up_to_page(bytes);
        let layout = Layout::from_size_align(capacity, page_size()).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("SplitRing::new(): bad layout for {capacity} bytes: {err}"),
            )
        })?;

        let raw = unsafe { alloc_zeroed(layout) };
        let Some(buf) = NonNull::new(raw) else {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("SplitRing::new(): allocating {capacity} bytes failed"),
            ));
        };

        Ok(Self {
            buf,
            layout,
            head: 0,
            tail: 0,
        })
    }

    /// Allocation size in bytes, a page multiple.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Write cursor, in `[0, capacity)`.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Read cursor, in `[0, capacity)`.
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

    /// Appends one record at `head`.
    ///
    /// Contiguous copy when the record fits before the end of the
    /// allocation; two-part copy otherwise.
    #[inline]
    pub fn push<T: Pod>(&mut self, value: T) {
        let bytes = bytemuck::bytes_of(&value);
        let size = bytes.len();
        assert!(
            size > 0 && size <= self.capacity(),
            "record size {} outside capacity of {} bytes",
            size,
            self.capacity()
        );

        if self.head + size <= self.capacity() {
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr(), self.buf.as_ptr().add(self.head), size);
            }
            self.head += size;
            if self.head == self.capacity() {
                self.head = 0;
            }
        } else {
            self.head = self.copy_in_split(bytes, self.head);
        }
    }

    /// Removes one record at `tail`.
    #[inline]
    pub fn pop<T: Pod>(&mut self) -> T {
        let mut value: T = bytemuck::Zeroable::zeroed();
        let size = size_of::<T>();
        assert!(
            size > 0 && size <= self.capacity(),
            "record size {} outside capacity of {} bytes",
            size,
            self.capacity()
        );

        if self.tail + size <= self.capacity() {
            unsafe {
                ptr::copy_nonoverlapping(
                    self.buf.as_ptr().add(self.tail),
                    bytemuck::bytes_of_mut(&mut value).as_mut_ptr(),
                    size,
                );
            }
            self.tail += size;
            if self.tail == self.capacity() {
                self.tail = 0;
            }
        } else {
            self.tail = self.copy_out_split(bytemuck::bytes_of_mut(&mut value), self.tail);
        }
        value
    }

    /// Checked byte access at offset `i`.
    #[inline]
    pub fn byte_at(&self, i: usize) -> Option<&u8> {
        if i < self.capacity() {
            Some(unsafe { &*self.buf.as_ptr().add(i) })
        } else {
            None
        }
    }

    /// Straddling write: `first` bytes up to the end, the rest at offset 0.
    /// Returns the new cursor.
    #[cold]
    fn copy_in_split(&mut self, bytes: &[u8], cursor: usize) -> usize {
        let first = self.capacity() - cursor;
        let second = bytes.len() - first;
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.buf.as_ptr().add(cursor), first);
            ptr::copy_nonoverlapping(bytes.as_ptr().add(first), self.buf.as_ptr(), second);
        }
        second
    }

    /// Straddling read, mirror of [`Self::copy_in_split`].
    #[cold]
    fn copy_out_split(&self, bytes: &mut [u8], cursor: usize) -> usize {
        let first = self.capacity() - cursor;
        let second = bytes.len() - first;
        unsafe {
            ptr::copy_nonoverlapping(self.buf.as_ptr().add(cursor), bytes.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(self.buf.as_ptr(), bytes.as_mut_ptr().add(first), second);
        }
        second
    }
}

impl Index<usize> for SplitRing {
    type Output = u8;

    #[inline]
    fn index(&self, i: usize) -> &u8 {
        assert!(i < self.capacity(), "byte offset {i} outside capacity");
        unsafe { &*self.buf.as_ptr().add(i) }
    }
}

impl IndexMut<usize> for SplitRing {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut u8 {
        assert!(i < self.capacity(), "byte offset {i} outside capacity");
        unsafe { &mut *self.buf.as_ptr().add(i) }
    }
}

impl Drop for SplitRing {
    fn drop(&mut self) {
        unsafe { dealloc(self.buf.as_ptr(), self.layout) };
    }
}
