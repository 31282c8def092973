//! Flat typed array, the indexed-access baseline.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::io;
use std::mem::size_of;
use std::ops::{Index, IndexMut};
use std::ptr::NonNull;

use bytemuck::Pod;

/// A flat owned array of `count` trivially-copyable elements.
///
/// Allocated zeroed at construction, freed on drop. No cursors. Movable,
/// not clonable.
pub struct FlatBuffer<T> {
    ptr: NonNull<T>,
    count: usize,
    layout: Layout,
}

unsafe impl<T: Send> Send for FlatBuffer<T> {}

impl<T: Pod> FlatBuffer<T> {
    /// Array of `count` zeroed elements.
    pub fn new(count: usize) -> io::Result<Self> {
        assert!(count > 0, "element count must be nonzero");
        assert!(size_of::<T>() > 0, "zero-sized elements are not storable");

        let layout = Layout::array::<T>(count).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("FlatBuffer::new(): bad layout for {count} elements: {err}"),
            )
        })?;

        let raw = unsafe { alloc_zeroed(layout) } as *mut T;
        let Some(ptr) = NonNull::new(raw) else {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!(
                    "FlatBuffer::new(): allocating {} bytes failed",
                    layout.size()
                ),
            ));
        };

        Ok(Self { ptr, count, layout })
    }

    /// Number of elements.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Total allocation size in bytes.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.count) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.count) }
    }

    /// Checked element access.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        self.as_slice().get(i)
    }

    /// Checked mutable element access.
    #[inline]
    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(i)
    }

    /// Unchecked element access.
    ///
    /// # Safety
    /// `i` must be less than `count()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize) -> &T {
        &*self.ptr.as_ptr().add(i)
    }

    /// Unchecked mutable element access.
    ///
    /// # Safety
    /// `i` must be less than `count()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, i: usize) -> &mut T {
        &mut *self.ptr.as_ptr().add(i)
    }
}

impl<T: Pod> Index<usize> for FlatBuffer<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.as_slice()[i]
    }
}

impl<T: Pod> IndexMut<usize> for FlatBuffer<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.as_mut_slice()[i]
    }
}

impl<T> Drop for FlatBuffer<T> {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr().cast(), self.layout) };
    }
}
