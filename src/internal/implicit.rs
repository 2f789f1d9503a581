//! The implicit-free-list engine: no index of free blocks exists. First fit
//! walks the segment header by header, and `free` only clears the used bit;
//! a freed block is rediscovered by the next allocation scan. Resize still
//! works in place where it can, by splitting or by absorbing free right
//! neighbors, since the header walk makes those visible for free.

use std::fmt;

use crate::allocator::{Allocator, HeapEngine, HeapError};
use crate::internal::layout::constants::{
    ALIGNMENT_SIZE, IMPLICIT_SPLIT_THRESHOLD, MAX_REQUEST_SIZE,
};
use crate::internal::layout::header::Header;
use crate::internal::layout::segment::Segment;
use crate::sys::ptr::AnyNonNullPtr;
use crate::util;

pub struct ImplicitHeap {
    segment: Segment,
    nused: usize,
}

// The engine exclusively owns every byte of its segment, so it may move
// between threads; concurrent use is ruled out by &mut.
unsafe impl Send for ImplicitHeap {}

impl ImplicitHeap {
    /// Binds the engine to `segment` and formats it as one maximal free
    /// block. Any previous heap content is discarded wholesale.
    pub unsafe fn init(segment: Segment) -> Result<ImplicitHeap, HeapError> {
        // header + one aligned payload word
        let min = 2 * ALIGNMENT_SIZE;
        if segment.len() < min {
            return Err(HeapError::SegmentTooSmall {
                got: segment.len(),
                min,
            });
        }
        if !util::bits::is_aligned(segment.len(), ALIGNMENT_SIZE) {
            return Err(HeapError::UnalignedSegment(segment.len()));
        }

        segment.first().write(segment.len() - ALIGNMENT_SIZE, false);

        Ok(ImplicitHeap { segment, nused: 0 })
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// First fit over the block walk.
    unsafe fn find_fit(&self, needed: usize) -> Option<Header> {
        let mut cur = self.segment.first();
        while cur.is_used() || cur.size() < needed {
            cur = cur.next();
            if self.segment.is_past_end(cur) {
                return None;
            }
        }
        Some(cur)
    }

    /// Rewrites `h` as a used block of `need` bytes, carving the leftover
    /// into a trailing free block when it is big enough to stand alone.
    unsafe fn shrink_in_place(&mut self, h: Header, need: usize) {
        let block = h.size();
        if block >= need + IMPLICIT_SPLIT_THRESHOLD {
            h.write(need, true);
            h.next().write(block - need - ALIGNMENT_SIZE, false);
        }
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

impl Allocator for ImplicitHeap {
    unsafe fn alloc(&mut self, requested: usize) -> Option<AnyNonNullPtr> {
        if requested == 0 || requested > MAX_REQUEST_SIZE {
            return None;
        }
        let needed = util::bits::round_up(requested, ALIGNMENT_SIZE);

        let victim = self.find_fit(needed)?;
        let block = victim.size();

        if block < needed + IMPLICIT_SPLIT_THRESHOLD {
            // Too tight to split: the allocation absorbs the whole block.
            victim.write(block, true);
            self.nused += block;
        } else {
            victim.write(needed, true);
            self.nused += needed;
            victim.next().write(block - needed - ALIGNMENT_SIZE, false);
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
        // No coalescing: the block waits for the next allocation scan.
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
        let need = util::bits::round_up(new_size, ALIGNMENT_SIZE);

        // Settled again at every exit, once the block's final size is known.
        self.nused -= old_size;

        if need <= old_size {
            self.shrink_in_place(h, need);
            self.nused += h.size();
            return Some(old_payload);
        }

        // Grow in place over free right neighbors, then finish with the
        // shrink path on the enlarged block.
        let mut neighbor = h.next();
        while !self.segment.is_past_end(neighbor) && !neighbor.is_used() {
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
        }
        true
    }

    fn bytes_in_use(&self) -> usize {
        self.nused
    }
}

impl HeapEngine for ImplicitHeap {
    unsafe fn init(segment: Segment) -> Result<ImplicitHeap, HeapError> {
        ImplicitHeap::init(segment)
    }
}

impl fmt::Debug for ImplicitHeap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (blocks, free_blocks) = unsafe {
            self.segment.blocks().fold((0, 0), |(all, free), h| {
                (all + 1, free + usize::from(!h.is_used()))
            })
        };
        formatter
            .debug_struct("ImplicitHeap")
            .field("segment_start", &self.segment.start())
            .field("segment_size", &self.segment.len())
            .field("bytes_in_use", &self.nused)
            .field("blocks", &blocks)
            .field("free_blocks", &free_blocks)
            .finish()
    }
}
