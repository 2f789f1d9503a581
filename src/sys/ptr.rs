use std::ptr::NonNull;

/// An untyped, possibly-null byte address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyMutPtr {
    raw: *mut u8,
}

impl AnyMutPtr {
    #[inline]
    pub fn new<T>(raw: *mut T) -> AnyMutPtr {
        AnyMutPtr {
            raw: raw as *mut u8,
        }
    }

    #[inline]
    pub fn null() -> AnyMutPtr {
        AnyMutPtr {
            raw: std::ptr::null_mut(),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    #[inline]
    pub fn to_raw<T>(&self) -> *mut T {
        self.raw as *mut T
    }

    #[inline]
    pub fn to_raw_addr(&self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub unsafe fn add(&self, size_bytes: usize) -> AnyMutPtr {
        AnyMutPtr {
            raw: self.raw.add(size_bytes),
        }
    }

    #[inline]
    pub unsafe fn sub(&self, size_bytes: usize) -> AnyMutPtr {
        AnyMutPtr {
            raw: self.raw.sub(size_bytes),
        }
    }

    #[inline]
    pub unsafe fn offset_bytes_from(&self, another: AnyMutPtr) -> isize {
        self.raw.offset_from(another.raw)
    }
}

/// An untyped byte address known not to be null. Payloads handed to clients
/// use this form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyNonNullPtr {
    raw: NonNull<u8>,
}

impl AnyNonNullPtr {
    #[inline]
    pub fn new<T>(raw: NonNull<T>) -> AnyNonNullPtr {
        AnyNonNullPtr { raw: raw.cast() }
    }

    #[inline]
    pub fn from_any(p: AnyMutPtr) -> Option<AnyNonNullPtr> {
        NonNull::new(p.to_raw::<u8>()).map(|raw| AnyNonNullPtr { raw })
    }

    #[inline]
    pub fn to_any(&self) -> AnyMutPtr {
        AnyMutPtr::new(self.raw.as_ptr())
    }

    #[inline]
    pub fn to_raw<T>(&self) -> *mut T {
        self.raw.as_ptr() as *mut T
    }

    #[inline]
    pub fn to_raw_addr(&self) -> usize {
        self.raw.as_ptr() as usize
    }

    #[inline]
    pub unsafe fn add(&self, size_bytes: usize) -> AnyNonNullPtr {
        AnyNonNullPtr {
            raw: NonNull::new_unchecked(self.raw.as_ptr().add(size_bytes)),
        }
    }

    #[inline]
    pub unsafe fn sub(&self, size_bytes: usize) -> AnyNonNullPtr {
        AnyNonNullPtr {
            raw: NonNull::new_unchecked(self.raw.as_ptr().sub(size_bytes)),
        }
    }

    #[inline]
    pub unsafe fn offset_bytes_from(&self, another: AnyNonNullPtr) -> isize {
        self.raw.as_ptr().offset_from(another.raw.as_ptr())
    }
}
