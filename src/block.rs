use core::mem;
use core::panic::Location;

use static_assertions::const_assert_eq;

use crate::align::{ALIGNMENT, ARCH_ALIGNMENT};

/// Sentinel offset standing in for an absent chain link.
pub(crate) const NIL: usize = usize::MAX;

/// Size of one block header in bytes.
pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

/// Smallest block a split is allowed to leave behind: a header plus one
/// aligned payload chunk.
pub(crate) const MIN_SUFFIX_SIZE: usize = HEADER_SIZE + ARCH_ALIGNMENT;

// Payload addresses stay ALIGNMENT-aligned only while both of these hold.
const_assert_eq!(HEADER_SIZE % ALIGNMENT, 0);
const_assert_eq!(ARCH_ALIGNMENT % ALIGNMENT, 0);

/// Metadata stored in the first bytes of every block in the region.
///
/// `next` and `prev` are byte offsets from the region base (`NIL` when
/// absent) and always match address order: the block at offset `o` with
/// size `s` is followed by the block at `o + s`, if any.
#[repr(C, align(8))]
pub(crate) struct BlockHeader {
  /// Total block length in bytes, header included.
  pub size: usize,
  /// Offset of the next block in address order, or `NIL`.
  pub next: usize,
  /// Offset of the previous block in address order, or `NIL`.
  pub prev: usize,
  /// Call site of the owning allocation. `None` while the block is free.
  pub site: Option<&'static Location<'static>>,
  /// Caller-supplied variable name. `None` while the block is free.
  pub var_name: Option<&'static str>,
  /// Allocation flag.
  pub free: bool,
}

impl BlockHeader {
  /// A free block covering `size` bytes with no neighbors and no
  /// diagnostics, as installed over the whole region on init.
  pub(crate) fn free_spanning(size: usize) -> Self {
    Self {
      size,
      next: NIL,
      prev: NIL,
      site: None,
      var_name: None,
      free: true,
    }
  }

  pub(crate) fn next_offset(&self) -> Option<usize> {
    (self.next != NIL).then_some(self.next)
  }

  pub(crate) fn prev_offset(&self) -> Option<usize> {
    (self.prev != NIL).then_some(self.prev)
  }

  /// Bytes available to the caller: everything past the header.
  pub(crate) fn payload_size(&self) -> usize {
    self.size - HEADER_SIZE
  }

  /// Whether this block can service an aligned request, leaving room for a
  /// fresh header in a potential suffix.
  pub(crate) fn fits(&self, aligned_size: usize) -> bool {
    self.free && self.size >= aligned_size + HEADER_SIZE
  }

  pub(crate) fn clear_site(&mut self) {
    self.site = None;
    self.var_name = None;
  }
}
