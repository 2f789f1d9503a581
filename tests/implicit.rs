//! End-to-end exercises of the implicit-free-list engine: the same block
//! layout as the explicit variant, but no free list, no coalescing on free,
//! and first fit by scanning the segment.

use segment_heap_alloc::internal::layout::constants::{ALIGNMENT_SIZE, MAX_REQUEST_SIZE};
use segment_heap_alloc::internal::layout::header::Header;
use segment_heap_alloc::{Allocator, AnyMutPtr, AnyNonNullPtr, ImplicitHeap, Segment};

#[repr(align(4096))]
struct Region<const N: usize>([u8; N]);

fn heap<const N: usize>(mem: &mut Region<N>) -> ImplicitHeap {
    let segment = Segment::new(AnyMutPtr::new(mem.0.as_mut_ptr()), N);
    unsafe { ImplicitHeap::init(segment) }.unwrap()
}

/// (used, payload size) of every block, in address order.
fn block_map(heap: &ImplicitHeap) -> Vec<(bool, usize)> {
    unsafe {
        heap.segment()
            .blocks()
            .map(|h| (h.is_used(), h.size()))
            .collect()
    }
}

unsafe fn fill(p: AnyNonNullPtr, len: usize, byte: u8) {
    std::ptr::write_bytes(p.to_raw::<u8>(), byte, len);
}

unsafe fn holds(p: AnyNonNullPtr, len: usize, byte: u8) -> bool {
    std::slice::from_raw_parts(p.to_raw::<u8>(), len)
        .iter()
        .all(|&b| b == byte)
}

#[test]
fn fresh_heap_fill() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let a = heap.alloc(16).unwrap();
        let b = heap.alloc(16).unwrap();
        let c = heap.alloc(16).unwrap();

        assert_ne!(a, b);
        assert_ne!(b, c);
        for p in [a, b, c] {
            assert_eq!(p.to_raw_addr() % ALIGNMENT_SIZE, 0);
        }

        assert_eq!(heap.bytes_in_use(), 48);
        assert_eq!(
            block_map(&heap),
            vec![(true, 16), (true, 16), (true, 16), (false, 176)]
        );
        assert!(heap.validate());
    }
}

#[test]
fn freed_blocks_stay_separate() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let _a = heap.alloc(16).unwrap();
        let b = heap.alloc(16).unwrap();
        let c = heap.alloc(16).unwrap();

        heap.free(Some(b));
        heap.free(Some(c));

        // No coalescing on free: three free fragments remain.
        assert_eq!(
            block_map(&heap),
            vec![(true, 16), (false, 16), (false, 16), (false, 176)]
        );
        assert!(heap.validate());
    }
}

#[test]
fn scan_skips_fragments_that_are_too_small() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let a = heap.alloc(16).unwrap();
        let _b = heap.alloc(16).unwrap();
        heap.free(Some(a));

        // 32 bytes cannot fit in `a`'s 16-byte carcass, so first fit walks
        // on to the tail block.
        let c = heap.alloc(32).unwrap();
        assert!(c.to_raw_addr() > a.to_raw_addr());
        assert_eq!(Header::of_payload(c).size(), 32);
        assert!(heap.validate());
    }
}

#[test]
fn shrink_in_place_splits_off_the_slack() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let a = heap.alloc(64).unwrap();
        fill(a, 16, 0x5a);

        let shrunk = heap.resize(Some(a), 16).unwrap();
        assert_eq!(shrunk, a);
        assert!(holds(a, 16, 0x5a));

        let h = Header::of_payload(a);
        assert_eq!(h.size(), 16);
        assert!(h.is_used());
        assert_eq!(h.next().size(), 40);
        assert!(!h.next().is_used());
        assert!(heap.validate());
    }
}

#[test]
fn grow_in_place_absorbs_the_free_right_neighbor() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let a = heap.alloc(16).unwrap();
        let b = heap.alloc(16).unwrap();
        fill(a, 16, 0xc3);
        heap.free(Some(b));

        let grown = heap.resize(Some(a), 40).unwrap();
        assert_eq!(grown, a);
        assert!(holds(a, 16, 0xc3));
        assert_eq!(Header::of_payload(a).size(), 40);
        assert_eq!(block_map(&heap), vec![(true, 40), (false, 200)]);
        assert!(heap.validate());
    }
}

#[test]
fn grow_falls_back_to_relocation_past_a_used_neighbor() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let a = heap.alloc(16).unwrap();
        let _b = heap.alloc(16).unwrap();
        fill(a, 16, 0x7e);

        let moved = heap.resize(Some(a), 40).unwrap();
        assert_ne!(moved, a);
        assert!(holds(moved, 16, 0x7e));
        assert!(!Header::of_payload(a).is_used());
        assert!(heap.validate());
    }
}

#[test]
fn rejection_paths_leave_the_heap_untouched() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        assert_eq!(heap.alloc(0), None);
        assert_eq!(heap.alloc(MAX_REQUEST_SIZE + 1), None);
        heap.free(None);
        assert_eq!(heap.bytes_in_use(), 0);
        assert!(heap.validate());
    }
}

#[test]
fn resize_of_nothing_allocates_and_resize_to_zero_frees() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let p = heap.resize(None, 32).unwrap();
        assert_eq!(Header::of_payload(p).size(), 32);
        assert_eq!(heap.bytes_in_use(), 32);

        assert_eq!(heap.resize(Some(p), 0), None);
        assert_eq!(heap.bytes_in_use(), 0);
        assert!(heap.validate());
    }
}

#[test]
fn resize_to_the_current_size_is_a_no_op() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let p = heap.alloc(48).unwrap();
        fill(p, 48, 0x11);

        let q = heap.resize(Some(p), 48).unwrap();
        assert_eq!(q, p);
        assert!(holds(p, 48, 0x11));
        assert_eq!(Header::of_payload(p).size(), 48);
        assert!(heap.validate());
    }
}

#[test]
fn free_then_realloc_reuses_the_block() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let p = heap.alloc(50).unwrap();
        heap.free(Some(p));
        assert!(heap.validate());

        // The freed 56-byte carcass is the first fit for the same request.
        let q = heap.alloc(50).unwrap();
        assert_eq!(q, p);
        assert_eq!(Header::of_payload(q).size(), 56);
        assert!(heap.validate());
    }
}

#[test]
fn small_requests_round_up_to_one_word() {
    let mut mem = Region([0u8; 256]);
    let mut heap = heap(&mut mem);
    unsafe {
        let p = heap.alloc(1).unwrap();
        assert_eq!(Header::of_payload(p).size(), ALIGNMENT_SIZE);
        assert_eq!(heap.bytes_in_use(), ALIGNMENT_SIZE);
    }
}

#[test]
fn exhaustion_returns_none_and_keeps_state() {
    let mut mem = Region([0u8; 64]);
    let mut heap = heap(&mut mem);
    unsafe {
        let a = heap.alloc(56).unwrap(); // absorbs the whole heap
        assert_eq!(heap.alloc(8), None);
        assert_eq!(heap.bytes_in_use(), 56);

        heap.free(Some(a));
        let b = heap.alloc(8).unwrap();
        assert_eq!(b, a);
        assert!(heap.validate());
    }
}
