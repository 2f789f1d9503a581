//! The process-wide default heap: a thin wrapper over one [`ExplicitHeap`]
//! for clients that want the classic free-function surface instead of
//! owning an engine value. The mutex only makes the shared instance sound
//! to touch from Rust; the engine underneath remains single-threaded.

use parking_lot::Mutex;

use crate::allocator::Allocator;
use crate::internal::explicit::ExplicitHeap;
use crate::internal::layout::segment::Segment;
use crate::sys::ptr::{AnyMutPtr, AnyNonNullPtr};

static HEAP: Mutex<Option<ExplicitHeap>> = Mutex::new(None);

/// Binds the process-wide heap to `[base, base + len)`. Returns `false` when
/// the segment cannot host a minimal block, leaving no usable state behind.
/// Calling it again re-formats from scratch.
pub unsafe fn init(base: AnyMutPtr, len: usize) -> bool {
    let mut heap = HEAP.lock();
    match ExplicitHeap::init(Segment::new(base, len)) {
        Ok(new_heap) => {
            *heap = Some(new_heap);
            true
        }
        Err(_) => {
            *heap = None;
            false
        }
    }
}

pub unsafe fn alloc(requested: usize) -> Option<AnyNonNullPtr> {
    let mut heap = HEAP.lock();
    let heap = heap.as_mut()?;
    heap.alloc(requested)
}

pub unsafe fn resize(old: Option<AnyNonNullPtr>, new_size: usize) -> Option<AnyNonNullPtr> {
    let mut heap = HEAP.lock();
    let heap = heap.as_mut()?;
    heap.resize(old, new_size)
}

pub unsafe fn free(payload: Option<AnyNonNullPtr>) {
    if let Some(heap) = HEAP.lock().as_mut() {
        heap.free(payload);
    }
}

/// Runs the consistency check on the process-wide heap. An unbound heap is
/// trivially consistent.
pub fn validate() -> bool {
    HEAP.lock().as_ref().map_or(true, |heap| heap.validate())
}

pub fn bytes_in_use() -> usize {
    HEAP.lock().as_ref().map_or(0, |heap| heap.bytes_in_use())
}
