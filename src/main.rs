use std::error::Error;
use std::result::Result;

use segment_heap_alloc::allocator::{self, Allocator, Config};
use segment_heap_alloc::sys;

fn main() {
    env_logger::init();
    unsafe { main_try() }.unwrap();
}

unsafe fn main_try() -> Result<(), Box<dyn Error>> {
    let mut heap = allocator::init_explicit(sys::new_env(), Config::default())?;
    println!("heap info: {:?}", heap);

    let p = heap.alloc(1 << 18).ok_or("allocation failed")?;

    let item: *mut usize = p.to_raw();
    *item = 0;
    println!("{:?}", *item);

    *item = p.to_raw_addr();
    println!("{:?}", *item);

    let p = heap.resize(Some(p), 1 << 20).ok_or("resize failed")?;
    let item: *mut usize = p.to_raw();
    println!("{:?}", *item);

    heap.free(Some(p));
    assert!(heap.validate());
    println!("bytes in use: {}", heap.bytes_in_use());
    heap.engine().dump_blocks();

    Ok(())
}
