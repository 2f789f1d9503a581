//! The public allocator surface: the [`Allocator`] trait both engines
//! implement, and facade constructors that pair an engine with an OS-backed
//! segment.

use std::error::Error;
use std::result::Result;

use thiserror::Error as ThisError;

use crate::internal::explicit::ExplicitHeap;
use crate::internal::implicit::ImplicitHeap;
use crate::internal::layout::segment::Segment;
use crate::sys::ptr::AnyNonNullPtr;
use crate::sys::segment::HeapSegment;
use crate::sys::SysMemEnv;

/// Default segment size for the bundled sample driver.
pub const DEFAULT_SEGMENT_SIZE: usize = 1 << 32;

/// The alloc/resize/free surface a client program uses instead of the
/// platform allocator. `None` plays the role a null pointer plays in the
/// classic C surface: "no block" as an argument, "request not satisfied" as
/// a result. Allocation failure is an ordinary return value, never a panic.
pub trait Allocator {
    unsafe fn alloc(&mut self, requested: usize) -> Option<AnyNonNullPtr>;

    /// Resizes `old` to `new_size`, in place when the block layout allows
    /// it, otherwise by allocate-copy-free. `resize(None, n)` behaves as
    /// `alloc(n)`; `resize(p, 0)` behaves as `free(p)`.
    unsafe fn resize(
        &mut self,
        old: Option<AnyNonNullPtr>,
        new_size: usize,
    ) -> Option<AnyNonNullPtr>;

    unsafe fn free(&mut self, payload: Option<AnyNonNullPtr>);

    /// Whole-heap consistency check. Read-only; logs and returns `false` on
    /// the first violation found.
    fn validate(&self) -> bool;

    /// Sum of the payload sizes of all used blocks. Diagnostics only; never
    /// consulted for correctness.
    fn bytes_in_use(&self) -> usize;
}

/// An engine that can take over a freshly reserved segment.
pub trait HeapEngine: Allocator + Sized {
    unsafe fn init(segment: Segment) -> Result<Self, HeapError>;
}

#[derive(Debug, ThisError)]
pub enum HeapError {
    #[error("segment of {got} bytes cannot host a minimal block (need at least {min})")]
    SegmentTooSmall { got: usize, min: usize },
    #[error("segment length {0} is not a multiple of the block alignment")]
    UnalignedSegment(usize),
}

pub struct Config {
    pub segment_size: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            segment_size: DEFAULT_SEGMENT_SIZE,
        }
    }
}

/// An engine bound to a segment it reserved through `Env`. The mapping is
/// released when this is dropped.
#[derive(Debug)]
pub struct HeapWithEnv<Env: SysMemEnv, H> {
    segment_env: HeapSegment<Env>,
    segment: Segment,
    heap: H,
}

pub unsafe fn init_implicit<Env: SysMemEnv>(
    env: Env,
    config: Config,
) -> Result<HeapWithEnv<Env, ImplicitHeap>, Box<dyn Error>> {
    init_with_env(env, config)
}

pub unsafe fn init_explicit<Env: SysMemEnv>(
    env: Env,
    config: Config,
) -> Result<HeapWithEnv<Env, ExplicitHeap>, Box<dyn Error>> {
    init_with_env(env, config)
}

unsafe fn init_with_env<Env: SysMemEnv, H: HeapEngine>(
    env: Env,
    config: Config,
) -> Result<HeapWithEnv<Env, H>, Box<dyn Error>> {
    let mut segment_env = HeapSegment::new(env);
    let base = segment_env.init_segment(config.segment_size)?;
    let segment = Segment::new(base, segment_env.size());
    let heap = H::init(segment)?;
    Ok(HeapWithEnv {
        segment_env,
        segment,
        heap,
    })
}

impl<Env: SysMemEnv, H: HeapEngine> HeapWithEnv<Env, H> {
    /// Re-formats the same segment as an empty heap, discarding every live
    /// block wholesale.
    pub unsafe fn reset(&mut self) -> Result<(), HeapError> {
        self.heap = H::init(self.segment)?;
        Ok(())
    }

    pub fn engine(&self) -> &H {
        &self.heap
    }

    pub fn engine_mut(&mut self) -> &mut H {
        &mut self.heap
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn segment_env(&self) -> &HeapSegment<Env> {
        &self.segment_env
    }
}

impl<Env: SysMemEnv, H: HeapEngine> Allocator for HeapWithEnv<Env, H> {
    unsafe fn alloc(&mut self, requested: usize) -> Option<AnyNonNullPtr> {
        self.heap.alloc(requested)
    }

    unsafe fn resize(
        &mut self,
        old: Option<AnyNonNullPtr>,
        new_size: usize,
    ) -> Option<AnyNonNullPtr> {
        self.heap.resize(old, new_size)
    }

    unsafe fn free(&mut self, payload: Option<AnyNonNullPtr>) {
        self.heap.free(payload)
    }

    fn validate(&self) -> bool {
        self.heap.validate()
    }

    fn bytes_in_use(&self) -> usize {
        self.heap.bytes_in_use()
    }
}
