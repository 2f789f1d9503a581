//! Exercises the env-backed facade end to end: reserve a real segment,
//! allocate through it, and re-format it wholesale with `reset`.

use segment_heap_alloc::allocator::{self, Allocator, Config};
use segment_heap_alloc::internal::layout::constants::ALIGNMENT_SIZE;
use segment_heap_alloc::sys;

const SEGMENT_SIZE: usize = 1 << 16;

#[test]
fn reset_reformats_the_same_segment() {
    unsafe {
        let mut heap = allocator::init_explicit(
            sys::new_env(),
            Config {
                segment_size: SEGMENT_SIZE,
            },
        )
        .unwrap();

        // The helper reports the region the engine was bound to.
        assert!(heap.segment_env().start().is_some());
        assert_eq!(heap.segment_env().size(), SEGMENT_SIZE);
        assert_eq!(heap.segment().len(), SEGMENT_SIZE);

        let a = heap.alloc(100).unwrap();
        let _b = heap.alloc(200).unwrap();
        heap.free(Some(a));
        heap.engine_mut().dump_blocks();
        assert!(heap.bytes_in_use() > 0);
        assert!(heap.validate());

        // Everything live is discarded wholesale; the segment comes back as
        // one maximal free block heading the list.
        heap.reset().unwrap();
        assert_eq!(heap.bytes_in_use(), 0);
        assert!(heap.validate());

        let blocks: Vec<(bool, usize)> = heap
            .segment()
            .blocks()
            .map(|h| (h.is_used(), h.size()))
            .collect();
        assert_eq!(blocks, vec![(false, SEGMENT_SIZE - ALIGNMENT_SIZE)]);
        assert_eq!(
            heap.engine().free_list_head_addr(),
            Some(heap.segment().start().to_raw_addr())
        );

        // The reset heap allocates from scratch again.
        let c = heap.alloc(100).unwrap();
        assert_eq!(c.to_raw_addr() % ALIGNMENT_SIZE, 0);
        assert!(heap.validate());
    }
}
