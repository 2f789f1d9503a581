//! The block-header codec. This is the one module that reinterprets raw
//! segment bytes as header words; everything above it works with [`Header`]
//! values and never touches the word encoding directly.
//!
//! A header is one aligned machine word: bit 0 is the used flag, the
//! remaining bits are the payload size in bytes (always a multiple of
//! [`ALIGNMENT_SIZE`], so bit 0 is free for the flag).

use std::fmt;
use std::ptr::NonNull;

use crate::internal::layout::constants::ALIGNMENT_SIZE;
use crate::sys::ptr::{AnyMutPtr, AnyNonNullPtr};
use crate::util;

const USED_BIT: usize = 1;

/// The address of one block header inside the segment.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Header {
    raw: *mut usize,
}

impl Header {
    #[inline]
    pub fn at(p: AnyMutPtr) -> Header {
        debug_assert!(util::bits::is_aligned(p.to_raw_addr(), ALIGNMENT_SIZE));
        Header { raw: p.to_raw() }
    }

    /// The header sits one word before its payload.
    #[inline]
    pub fn of_payload(payload: AnyNonNullPtr) -> Header {
        Header::at(unsafe { payload.to_any().sub(ALIGNMENT_SIZE) })
    }

    #[inline]
    pub fn addr(self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub fn to_any(self) -> AnyMutPtr {
        AnyMutPtr::new(self.raw)
    }

    #[inline]
    pub unsafe fn payload(self) -> AnyNonNullPtr {
        AnyNonNullPtr::new(NonNull::new_unchecked(
            (self.raw as *mut u8).add(ALIGNMENT_SIZE),
        ))
    }

    #[inline]
    pub unsafe fn size(self) -> usize {
        *self.raw & !USED_BIT
    }

    #[inline]
    pub unsafe fn is_used(self) -> bool {
        *self.raw & USED_BIT != 0
    }

    #[inline]
    pub unsafe fn set_used(self) {
        *self.raw |= USED_BIT;
    }

    #[inline]
    pub unsafe fn set_free(self) {
        *self.raw &= !USED_BIT;
    }

    /// Writes the whole word at once. `size` must be aligned so the used
    /// flag has its bit to itself.
    #[inline]
    pub unsafe fn write(self, size: usize, used: bool) {
        debug_assert!(util::bits::is_aligned(size, ALIGNMENT_SIZE));
        *self.raw = size | used as usize;
    }

    /// The header of the right neighbor: one word plus one payload further.
    #[inline]
    pub unsafe fn next(self) -> Header {
        Header::at(self.to_any().add(ALIGNMENT_SIZE + self.size()))
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Header({:#x})", self.addr())
    }
}
