use crate::internal::layout::constants::ALIGNMENT_SIZE;
use crate::internal::layout::header::Header;
use crate::sys::ptr::AnyMutPtr;

/// The binding to the one contiguous byte region the allocator manages.
/// Blocks tile it end to end; there are no gaps and no sentinels.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    start: AnyMutPtr,
    len: usize,
}

impl Segment {
    pub fn new(start: AnyMutPtr, len: usize) -> Segment {
        Segment { start, len }
    }

    #[inline]
    pub fn start(&self) -> AnyMutPtr {
        self.start
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn end_addr(&self) -> usize {
        self.start.to_raw_addr() + self.len
    }

    /// The header of the block at the very start of the segment.
    #[inline]
    pub fn first(&self) -> Header {
        Header::at(self.start)
    }

    #[inline]
    pub fn is_past_end(&self, h: Header) -> bool {
        h.addr() >= self.end_addr()
    }

    /// Walks every block in address order. The segment must currently be
    /// tiled by valid headers.
    #[inline]
    pub unsafe fn blocks(&self) -> Blocks {
        Blocks {
            cur: self.first(),
            end_addr: self.end_addr(),
        }
    }
}

pub struct Blocks {
    cur: Header,
    end_addr: usize,
}

impl Iterator for Blocks {
    type Item = Header;

    fn next(&mut self) -> Option<Header> {
        if self.cur.addr() >= self.end_addr {
            return None;
        }
        let h = self.cur;
        // Safe per the contract of `Segment::blocks`: `h` is in bounds and
        // holds a valid header word.
        self.cur = unsafe { h.next() };
        Some(h)
    }
}
