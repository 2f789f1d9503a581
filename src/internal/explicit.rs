//! The explicit-free-list engine: free blocks form a doubly linked list
//! threaded through their payloads, deallocation coalesces with free right
//! neighbors, and resize grows in place by absorbing them.
//!
//! There are no footers, so the left neighbor of a block cannot be found in
//! O(1) and is never coalesced. A freed block therefore only ever merges
//! rightward; the block to its left stays separate until it is freed itself.

use std::fmt;

use crate::allocator::{Allocator, HeapEngine, HeapError};
use crate::internal::layout::constants::{
    ALIGNMENT_SIZE, EXPLICIT_SPLIT_THRESHOLD, MAX_REQUEST_SIZE, MIN_EXPLICIT_PAYLOAD,
};
use crate::internal::layout::free_list::FreeList;
use crate::internal::layout::header::Header;
use crate::internal::layout::segment::Segment;
use crate::sys::ptr::AnyNonNullPtr;
use crate::util;

pub struct ExplicitHeap {
    segment: Segment,
    free_list: FreeList,
    nused: usize,
}

// The engine exclusively owns every byte of its segment, so it may move
// between threads; concurrent use is ruled out by &mut.
unsafe impl Send for ExplicitHeap {}

impl ExplicitHeap {
    /// Binds the engine to `segment` and formats it as one maximal free
    /// block. Any previous heap content is discarded wholesale.
    pub unsafe fn init(segment: Segment) -> Result<ExplicitHeap, HeapError> {
        // header + prev link + next link
        let min = 3 * ALIGNMENT_SIZE;
        if segment.len() < min {
            return Err(HeapError::SegmentTooSmall {
                got: segment.len(),
                min,
            });
        }
        if !util::bits::is_aligned(segment.len(), ALIGNMENT_SIZE) {
            return Err(HeapError::UnalignedSegment(segment.len()));
        }

        let first = segment.first();
        first.write(segment.len() - ALIGNMENT_SIZE, false);

        let mut free_list = FreeList::new();
        free_list.push_front(first);

        Ok(ExplicitHeap {
            segment,
            free_list,
            nused: 0,
        })
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn free_list_head_addr(&self) -> Option<usize> {
        self.free_list.head().map(|h| h.addr())
    }

    /// First fit over the free list.
    unsafe fn find_fit(&self, needed: usize) -> Option<Header> {
        let mut cur = self.free_list.head();
        while let Some(h) = cur {
            if h.size() >= needed {
                return Some(h);
            }
            cur = FreeList::next_of(h);
        }
        None
    }

    /// Rewrites `h` as a used block of `need` bytes, carving the leftover
    /// into a trailing free block when it is big enough to stand alone.
    unsafe fn shrink_in_place(&mut self, h: Header, need: usize) {
        let block = h.size();
        if block >= need + EXPLICIT_SPLIT_THRESHOLD {
            h.write(need, true);
            let trailer = h.next();
            trailer.write(block - need - ALIGNMENT_SIZE, false);
            self.free_list.push_front(trailer);
        }
        // Otherwise the block keeps its full size; the slack stays with
        // the allocation.
    }

    /// One diagnostic line per block, plus the segment bounds and byte
    /// accounting. Not called by the engine itself; handy under a debugger
    /// with `RUST_LOG=debug`.
    pub fn dump_blocks(&self) {
        log::debug!(
            "heap segment spans {:#x}..{:#x}, {} bytes in use",
            self.segment.start().to_raw_addr(),
            self.segment.end_addr(),
            self.nused,
        );
        unsafe {
            for h in self.segment.blocks() {
                log::debug!(
                    "block {:#x} used={} size={}",
                    h.addr(),
                    h.is_used(),
                    h.size(),
                );
            }
        }
    }
}

impl Allocator for ExplicitHeap {
    unsafe fn alloc(&mut self, requested: usize) -> Option<AnyNonNullPtr> {
        if requested == 0 || requested > MAX_REQUEST_SIZE {
            return None;
        }
        let needed = util::bits::round_up(requested, ALIGNMENT_SIZE).max(MIN_EXPLICIT_PAYLOAD);

        let victim = self.find_fit(needed)?;
        let block = victim.size();
        self.free_list.unlink(victim);

        if block < needed + EXPLICIT_SPLIT_THRESHOLD {
            // Too tight to split: the allocation absorbs the whole block.
            victim.write(block, true);
            self.nused += block;
        } else {
            victim.write(needed, true);
            self.nused += needed;
            let trailer = victim.next();
            trailer.write(block - needed - ALIGNMENT_SIZE, false);
            self.free_list.push_front(trailer);
        }

        Some(victim.payload())
    }

    unsafe fn free(&mut self, payload: Option<AnyNonNullPtr>) {
        let Some(payload) = payload else {
            return;
        };
        let h = Header::of_payload(payload);
        self.nused -= h.size();
        h.set_free();
        self.free_list.push_front(h);

        // Swallow every free neighbor to the right.
        let mut neighbor = h.next();
        while !self.segment.is_past_end(neighbor) && !neighbor.is_used() {
            self.free_list.unlink(neighbor);
            h.write(h.size() + neighbor.size() + ALIGNMENT_SIZE, false);
            neighbor = h.next();
        }
    }

    unsafe fn resize(
        &mut self,
        old: Option<AnyNonNullPtr>,
        new_size: usize,
    ) -> Option<AnyNonNullPtr> {
        let Some(old_payload) = old else {
            return self.alloc(new_size);
        };
        if new_size == 0 {
            self.free(Some(old_payload));
            return None;
        }
        if new_size > MAX_REQUEST_SIZE {
            return None;
        }

        let h = Header::of_payload(old_payload);
        let old_size = h.size();
        let need = util::bits::round_up(new_size, ALIGNMENT_SIZE).max(MIN_EXPLICIT_PAYLOAD);

        // Settled again at every exit, once the block's final size is known.
        self.nused -= old_size;

        if need <= old_size {
            self.shrink_in_place(h, need);
            self.nused += h.size();
            return Some(old_payload);
        }

        // Grow in place: absorb free right neighbors until the block is big
        // enough, then finish with the shrink path on the enlarged block.
        let mut neighbor = h.next();
        while !self.segment.is_past_end(neighbor) && !neighbor.is_used() {
            self.free_list.unlink(neighbor);
            h.write(h.size() + neighbor.size() + ALIGNMENT_SIZE, true);
            if h.size() >= need {
                self.shrink_in_place(h, need);
                self.nused += h.size();
                return Some(old_payload);
            }
            neighbor = h.next();
        }

        // Relocate. Neighbors absorbed above stay part of the old block
        // whether or not the allocation succeeds.
        match self.alloc(new_size) {
            Some(new_payload) => {
                std::ptr::copy_nonoverlapping::<u8>(
                    old_payload.to_raw(),
                    new_payload.to_raw(),
                    old_size.min(need),
                );
                self.nused += h.size();
                self.free(Some(old_payload));
                Some(new_payload)
            }
            None => {
                self.nused += h.size();
                None
            }
        }
    }

    fn validate(&self) -> bool {
        unsafe {
            let mut total = 0;
            for h in self.segment.blocks() {
                total += h.size() + ALIGNMENT_SIZE;
            }
            if total != self.segment.len() {
                log::error!(
                    "heap walk covers {} bytes but the segment holds {}",
                    total,
                    self.segment.len(),
                );
                util::debug_break();
                return false;
            }

            if let Some(head) = self.free_list.head() {
                if FreeList::prev_of(head).is_some() {
                    log::error!("free-list head {:?} has a prev link", head);
                    util::debug_break();
                    return false;
                }
            }
            let mut cur = self.free_list.head();
            while let Some(h) = cur {
                if h.is_used() {
                    log::error!("used block {:?} is on the free list", h);
                    util::debug_break();
                    return false;
                }
                cur = FreeList::next_of(h);
            }

            for h in self.segment.blocks() {
                if !h.is_used() && !self.free_list.contains(h) {
                    log::error!("free block {:?} is unreachable from the free-list head", h);
                    util::debug_break();
                    return false;
                }
            }
        }
        true
    }

    fn bytes_in_use(&self) -> usize {
        self.nused
    }
}

impl HeapEngine for ExplicitHeap {
    unsafe fn init(segment: Segment) -> Result<ExplicitHeap, HeapError> {
        ExplicitHeap::init(segment)
    }
}

impl fmt::Debug for ExplicitHeap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (blocks, free_blocks) = unsafe {
            self.segment.blocks().fold((0, 0), |(all, free), h| {
                (all + 1, free + usize::from(!h.is_used()))
            })
        };
        formatter
            .debug_struct("ExplicitHeap")
            .field("segment_start", &self.segment.start())
            .field("segment_size", &self.segment.len())
            .field("bytes_in_use", &self.nused)
            .field("blocks", &blocks)
            .field("free_blocks", &free_blocks)
            .finish()
    }
}
