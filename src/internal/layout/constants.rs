use std::mem::size_of;

/// Every header address, payload address, and block size is a multiple of
/// this. One header occupies exactly one such word.
pub const ALIGNMENT_SIZE: usize = 8;

/// Largest payload size a single request may ask for.
pub const MAX_REQUEST_SIZE: usize = 1 << 30;

/// Smallest payload able to host the two free-list links of the explicit
/// variant.
pub const MIN_EXPLICIT_PAYLOAD: usize = 2 * ALIGNMENT_SIZE;

/// A block only splits when the leftover can form a free block: a header
/// plus one aligned word (implicit) or a header plus both links (explicit).
pub const IMPLICIT_SPLIT_THRESHOLD: usize = 2 * ALIGNMENT_SIZE;
pub const EXPLICIT_SPLIT_THRESHOLD: usize = 3 * ALIGNMENT_SIZE;

// Headers and intrusive links are stored as single machine words.
const _: () = assert!(size_of::<usize>() == ALIGNMENT_SIZE);
const _: () = assert!(size_of::<*mut usize>() == ALIGNMENT_SIZE);
