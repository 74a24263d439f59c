//! Tar block arithmetic.
//!
//! Every structure in a tar stream is a whole number of 512-byte blocks:
//! headers occupy one block, file content is zero-filled up to the next
//! block boundary, and the archive ends with two zero blocks.

/// Size of one tar block in bytes.
pub const BLOCK_SIZE: u64 = 512;

/// Size of the end-of-archive marker (two zero blocks).
pub const TERMINATOR_SIZE: u64 = 2 * BLOCK_SIZE;

/// Default chunk size: one classic tar record of twenty blocks.
pub const DEFAULT_BUFFER_SIZE: usize = 20 * BLOCK_SIZE as usize;

/// Returns the number of zero bytes needed after `content_size` bytes so the
/// total becomes a multiple of `block_size`.
///
/// Returns zero when `content_size` is already aligned.
///
/// # Panics
///
/// Panics if `block_size` is zero.
///
/// # Example
///
/// ```rust
/// use tarstream::block::padding;
///
/// assert_eq!(padding(10, 512), 502);
/// assert_eq!(padding(512, 512), 0);
/// assert_eq!(padding(0, 512), 0);
/// ```
#[inline]
pub const fn padding(content_size: u64, block_size: u64) -> u64 {
    (block_size - content_size % block_size) % block_size
}

/// Rounds `size` up to the next multiple of [`BLOCK_SIZE`].
#[inline]
pub const fn round_up(size: u64) -> u64 {
    size + padding(size, BLOCK_SIZE)
}

/// Returns true if `size` is a whole number of blocks.
#[inline]
pub const fn is_aligned(size: u64) -> bool {
    size % BLOCK_SIZE == 0
}

/// Returns the number of bytes an entry occupies in the stream.
///
/// A regular file takes its header plus its content rounded up to the block
/// size; anything else is described by its header alone.
#[inline]
pub const fn entry_footprint(is_regular_file: bool, size: u64) -> u64 {
    if is_regular_file {
        BLOCK_SIZE + round_up(size)
    } else {
        BLOCK_SIZE
    }
}
