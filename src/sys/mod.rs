use std::error::Error;
use std::result::Result;

mod linux;
pub mod ptr;
pub mod segment;

/// The OS-level memory operations the segment helper is built on. One
/// reserve per heap lifetime; the region is only handed back wholesale.
pub trait SysMemEnv {
    unsafe fn page_size(&mut self) -> Result<usize, Box<dyn Error>>;
    unsafe fn reserve(&mut self, len: usize) -> Result<ptr::AnyMutPtr, Box<dyn Error>>;
    unsafe fn release(&mut self, addr: ptr::AnyMutPtr, len: usize) -> Result<(), Box<dyn Error>>;
}

pub fn new_env() -> impl SysMemEnv + std::fmt::Debug {
    SysMemEnvForLinux {}
}

#[derive(Debug)]
struct SysMemEnvForLinux {}

impl SysMemEnv for SysMemEnvForLinux {
    unsafe fn page_size(&mut self) -> Result<usize, Box<dyn Error>> {
        linux::get_pagesize()
    }

    unsafe fn reserve(&mut self, len: usize) -> Result<ptr::AnyMutPtr, Box<dyn Error>> {
        linux::reserve(len)
    }

    unsafe fn release(&mut self, addr: ptr::AnyMutPtr, len: usize) -> Result<(), Box<dyn Error>> {
        linux::release(addr, len)
    }
}
