//! Page-size arithmetic shared by every allocation in this crate.

use std::sync::OnceLock;

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

#[cfg(unix)]
fn query_page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    assert!(size > 0, "sysconf(_SC_PAGESIZE) failed");
    size as usize
}

#[cfg(not(unix))]
fn query_page_size() -> usize {
    4096
}

/// Returns the OS page size, queried once per process.
#[inline]
pub fn page_size() -> usize {
    *PAGE_SIZE.get_or_init(query_page_size)
}

/// Rounds `n` up to the smallest page multiple that is at least one page.
///
/// `round_up_to_page(0)` and anything below one page return `page_size()`.
#[inline]
pub fn round_up_to_page(n: usize) -> usize {
    let page = page_size();
    debug_assert!(page.is_power_of_two());
    if n <= page {
        page
    } else {
        (n + page - 1) & !(page - 1)
    }
}

/// Rounds `n` up to a multiple of `m`.
///
/// `m` must be nonzero. `round_up_to_multiple(0, m)` is `0`; callers that
/// need a nonempty result clamp the input first.
#[inline]
pub fn round_up_to_multiple(n: usize, m: usize) -> usize {
    assert!(m > 0, "rounding step must be nonzero");
    ((n + m - 1) / m) * m
}

/// Smallest power of two that is at least `max(n, 1)`.
///
/// For callers that want mask-based wrap instead of a conditional subtract.
#[inline]
pub fn bit_ceil(n: usize) -> usize {
    n.max(1).next_power_of_two()
}
