//! Aliased virtual mapping: one physical region installed at every slot of a
//! contiguous virtual reservation.
//!
//! Uses memfd_create + mmap with MAP_FIXED. The reservation is taken first
//! with PROT_NONE so the per-slot mappings are guaranteed to land adjacent
//! to each other; each slot is then replaced by a shared read-write mapping
//! of the same memory object at offset 0.

use std::io;
use std::ptr::NonNull;

#[cfg(target_os = "linux")]
use crate::sys::page::{round_up_to_multiple, round_up_to_page};

/// Whether this target can install aliased mappings at all.
///
/// When this returns `false`, [`crate::SplitRing`] is the functionally
/// equivalent fallback.
#[inline]
pub const fn aliasing_supported() -> bool {
    cfg!(target_os = "linux")
}

/// An owned virtual range of `virt_size` bytes in which byte `i` aliases
/// physical byte `i % phys_size`.
///
/// The physical backing is `phys_size` bytes, always a page multiple;
/// `virt_size` is always a multiple of `phys_size`, so the range holds a
/// whole number of aliased slots. The region is unmapped on drop.
///
/// Virtual address space is a process-wide resource: a large `virt_size`
/// costs no physical memory, but constructing many regions with huge
/// reservations will exhaust the address space of the process.
pub struct AliasedRegion {
    ptr: NonNull<u8>,
    phys_size: usize,
    virt_size: usize,
}

unsafe impl Send for AliasedRegion {}

impl AliasedRegion {
    /// Maps a region with physical size `round_up_to_page(p_req)` and
    /// virtual size `v_req` rounded up to the next physical-size multiple
    /// (at least one slot).
    ///
    /// Any OS refusal unwinds whatever was installed before returning.
    #[cfg(target_os = "linux")]
    pub fn alloc(p_req: usize, v_req: usize) -> io::Result<Self> {
        use std::ffi::CString;

        let phys = round_up_to_page(p_req);
        let virt = round_up_to_multiple(v_req.max(phys), phys);
        let slots = virt / phys;

        // --- Reserve the whole virtual range, no access ---
        // This pins the address range so the per-slot mappings below are
        // contiguous; nothing else can be mapped into it in the meantime.
        let base = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                virt,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if base == libc::MAP_FAILED {
            let err = io::Error::last_os_error();
            return Err(io::Error::new(
                err.kind(),
                format!(
                    "AliasedRegion::alloc(): virtual reservation failed.\n\
                     ├─ Physical size: {phys} bytes\n\
                     ├─ Virtual size:  {virt} bytes ({slots} slots)\n\
                     ╰─ Error: {err}"
                ),
            ));
        }

        // --- Create the shared memory object backing every slot ---
        let name = CString::new("magicring").unwrap();
        let fd = unsafe {
            libc::syscall(libc::SYS_memfd_create, name.as_ptr(), libc::MFD_CLOEXEC) as libc::c_int
        };
        if fd < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::munmap(base, virt) };
            return Err(io::Error::new(
                err.kind(),
                format!("AliasedRegion::alloc(): memfd_create failed: {err}"),
            ));
        }

        if unsafe { libc::ftruncate(fd, phys as libc::off_t) } != 0 {
            let err = io::Error::last_os_error();
            unsafe {
                libc::munmap(base, virt);
                libc::close(fd);
            }
            return Err(io::Error::new(
                err.kind(),
                format!("AliasedRegion::alloc(): sizing memory object to {phys} bytes failed: {err}"),
            ));
        }

        // --- Install the object at every slot of the reservation ---
        // MAP_FIXED replaces the PROT_NONE pages slot by slot; after the
        // loop the original reservation is fully overlaid.
        for slot in 0..slots {
            let addr = unsafe { base.cast::<u8>().add(slot * phys) };
            let mapped = unsafe {
                libc::mmap(
                    addr.cast(),
                    phys,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED | libc::MAP_FIXED,
                    fd,
                    0,
                )
            };
            if mapped == libc::MAP_FAILED {
                let err = io::Error::last_os_error();
                unsafe {
                    libc::munmap(base, virt);
                    libc::close(fd);
                }
                return Err(io::Error::new(
                    err.kind(),
                    format!(
                        "AliasedRegion::alloc(): installing slot mapping failed.\n\
                         ├─ Slot:          {slot} of {slots}\n\
                         ├─ Physical size: {phys} bytes\n\
                         ╰─ Error: {err}"
                    ),
                ));
            }
        }

        // The mappings keep the object alive; the descriptor is not needed.
        unsafe { libc::close(fd) };

        Ok(Self {
            ptr: NonNull::new(base.cast()).unwrap(),
            phys_size: phys,
            virt_size: virt,
        })
    }

    /// Aliased mappings need the memfd + MAP_FIXED trio; on other targets
    /// construction always refuses. Check [`aliasing_supported`] and fall
    /// back to [`crate::SplitRing`].
    #[cfg(not(target_os = "linux"))]
    pub fn alloc(_p_req: usize, _v_req: usize) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "AliasedRegion::alloc(): aliased mappings are only supported on Linux",
        ))
    }

    /// Base of the mapping. Page-aligned.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Real backing size in bytes, a page multiple.
    #[inline]
    pub fn phys_size(&self) -> usize {
        self.phys_size
    }

    /// Size of the virtual range in bytes, a multiple of `phys_size`.
    #[inline]
    pub fn virt_size(&self) -> usize {
        self.virt_size
    }

    /// Number of virtual slots aliasing the physical region.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.virt_size / self.phys_size
    }
}

#[cfg(target_os = "linux")]
impl Drop for AliasedRegion {
    fn drop(&mut self) {
        // One munmap covers every slot. Failures cannot propagate out of
        // drop, so they go to the diagnostic stream.
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.virt_size) };
        if rc != 0 {
            eprintln!(
                "AliasedRegion cleanup error: {}",
                io::Error::last_os_error()
            );
        }
    }
}
