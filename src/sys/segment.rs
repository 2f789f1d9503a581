//! The OS segment helper: reserves one large page-aligned region for a heap
//! to manage and reports its bounds. Re-initializing discards the previous
//! region; nothing is ever returned to the OS piecemeal.

use std::error::Error;
use std::result::Result;

use crate::sys::ptr::AnyMutPtr;
use crate::sys::SysMemEnv;
use crate::util;

#[derive(Debug)]
pub struct HeapSegment<Env: SysMemEnv> {
    env: Env,
    current: Option<Reservation>,
}

#[derive(Debug, Clone, Copy)]
struct Reservation {
    base: AnyMutPtr,
    len: usize,
}

impl<Env: SysMemEnv> HeapSegment<Env> {
    pub fn new(env: Env) -> HeapSegment<Env> {
        HeapSegment { env, current: None }
    }

    /// Reserves a fresh region of at least `total_bytes`, rounded up to
    /// whole pages, and returns its base address. Any prior region is
    /// released first.
    pub unsafe fn init_segment(
        &mut self,
        total_bytes: usize,
    ) -> Result<AnyMutPtr, Box<dyn Error>> {
        let page_size = self.env.page_size()?;
        assert!(util::bits::is_power_of_2(page_size));
        let len = util::bits::round_up(total_bytes, page_size);

        if let Some(prev) = self.current.take() {
            self.env.release(prev.base, prev.len)?;
        }

        let base = self.env.reserve(len)?;
        self.current = Some(Reservation { base, len });
        Ok(base)
    }

    /// Base address of the current region, if one is reserved.
    pub fn start(&self) -> Option<AnyMutPtr> {
        self.current.map(|r| r.base)
    }

    /// Size of the current region in bytes; zero when none is reserved.
    pub fn size(&self) -> usize {
        self.current.map_or(0, |r| r.len)
    }
}

impl<Env: SysMemEnv> Drop for HeapSegment<Env> {
    fn drop(&mut self) {
        if let Some(prev) = self.current.take() {
            if let Err(err) = unsafe { self.env.release(prev.base, prev.len) } {
                log::warn!("failed to release the heap segment: {}", err);
            }
        }
    }
}
