//! Virtually-aliased ("magic") ring buffers.
//!
//! A [`MagicRing`] is a circular byte queue whose physical backing is mapped
//! several times into one contiguous virtual range. A record that straddles
//! the physical wrap point is still contiguous in virtual memory, so push and
//! pop are always a single copy. The MMU does the wrap, not the code.
//!
//! [`SplitRing`] is the conventional counterpart over a flat allocation: it
//! detects straddling records and copies them in two parts. It serves both as
//! the comparison baseline for benchmarks and as the fallback on targets
//! where aliased mappings are unavailable (check [`aliasing_supported`]).
//!
//! [`FlatBuffer`] is a plain typed array used as the indexed-access baseline.
//!
//! Neither ring is safe for concurrent access, and neither tracks occupancy:
//! pushing more than the physical window holds silently overwrites the
//! oldest data. These are throughput primitives, not SPSC queues.

pub mod ring;
pub mod sys;

pub use ring::{FlatBuffer, MagicRing, SplitRing};
pub use sys::vmap::{aliasing_supported, AliasedRegion};
