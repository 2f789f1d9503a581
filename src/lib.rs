//! Heap allocators over a single pre-reserved segment.
//!
//! This crate manages one contiguous byte region — the *segment* — obtained
//! from an OS-level helper, and services allocation, resizing, and free
//! requests out of it. The segment is tiled end to end by blocks, each a
//! one-word header (payload size plus a used bit) followed by its payload.
//! Two interchangeable engines share that layout:
//!
//! - [`ImplicitHeap`]: first fit by scanning the segment block by block.
//!   Freeing only clears the used bit.
//! - [`ExplicitHeap`]: first fit over a doubly linked list threaded through
//!   free payloads, with right-neighbor coalescing and in-place resize.
//!
//! Neither engine stores footers, so blocks never merge leftward; that
//! keeps the per-block overhead at one word and `free` cheap.
//!
//! ```no_run
//! use segment_heap_alloc::allocator::{self, Allocator, Config};
//! use segment_heap_alloc::sys;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut heap = unsafe { allocator::init_explicit(sys::new_env(), Config::default()) }?;
//! let p = unsafe { heap.alloc(128) }.ok_or("out of memory")?;
//! unsafe { heap.free(Some(p)) };
//! assert!(heap.validate());
//! # Ok(())
//! # }
//! ```
//!
//! The engines are single-threaded by design; wrap one in a lock if it must
//! be shared. [`global`] does exactly that for a process-wide default
//! instance with the classic `init`/`alloc`/`resize`/`free` surface.

pub mod allocator;
pub mod global;
pub mod internal;
pub mod sys;
pub mod util;

pub use allocator::{
    init_explicit, init_implicit, Allocator, Config, HeapError, HeapWithEnv, DEFAULT_SEGMENT_SIZE,
};
pub use internal::explicit::ExplicitHeap;
pub use internal::implicit::ImplicitHeap;
pub use internal::layout::segment::Segment;
pub use sys::ptr::{AnyMutPtr, AnyNonNullPtr};
