extern crate libc;

use std::error::Error;
use std::io;
use std::result::Result;

use crate::sys::ptr::AnyMutPtr;

pub unsafe fn get_pagesize() -> Result<usize, Box<dyn Error>> {
    let v = libc::sysconf(libc::_SC_PAGE_SIZE);
    if v < 0 {
        Err(Box::new(io::Error::last_os_error()))
    } else {
        Ok(v as usize)
    }
}

/// Maps a fresh anonymous read-write region. mmap regions start on a page
/// boundary, which covers the page-alignment guarantee of the heap segment.
pub unsafe fn reserve(len: usize) -> Result<AnyMutPtr, Box<dyn Error>> {
    let p = libc::mmap(
        std::ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_ANONYMOUS | libc::MAP_PRIVATE,
        -1,
        0,
    );
    if p == libc::MAP_FAILED {
        Err(Box::new(io::Error::last_os_error()))
    } else {
        Ok(AnyMutPtr::new(p))
    }
}

pub unsafe fn release(addr: AnyMutPtr, len: usize) -> Result<(), Box<dyn Error>> {
    let r = libc::munmap(addr.to_raw(), len);
    if r != 0 {
        Err(Box::new(io::Error::last_os_error()))
    } else {
        Ok(())
    }
}
