//! # Fit Allocator
//!
//! A fixed-region allocator that carves a statically-sized byte region into
//! variable-sized blocks under a selectable placement strategy.
//!
//! ## Region layout
//!
//! The region is tiled, at all times, by an ordered sequence of blocks with
//! no gaps and no overlap. Every block starts with a header; the bytes after
//! the header are the payload handed to the caller:
//!
//! ```text
//!   ┌───────────────────────── region (N bytes) ─────────────────────────┐
//!   │                                                                    │
//!   ├──────────┬─────────┬──────────┬──────┬──────────┬─────────────────┤
//!   │ Header   │ Payload │ Header   │ Pay. │ Header   │    Payload      │
//!   │ size: 88 │ (used)  │ size: 72 │(used)│ size:    │    (free)       │
//!   │ free: No │         │ free: No │      │ free: Yes│                 │
//!   └──────────┴─────────┴──────────┴──────┴──────────┴─────────────────┘
//!        │                    ▲  │              ▲
//!        └─── next ───────────┘  └─── next ─────┘      (prev runs back)
//! ```
//!
//! The headers form a doubly-linked chain in address order holding *every*
//! block, free and allocated. Searches filter on the free flag; keeping the
//! chain address-ordered is what lets a freed block merge with its
//! neighbors by following two links.
//!
//! ## Placement strategies
//!
//! ```text
//!   First-fit: scan from the lowest block, take the first that fits.
//!   Next-fit:  scan from where the previous placement ended, wrapping
//!              from the tail back to the lowest block.
//!   Best-fit:  scan everything, take the smallest block that fits.
//! ```
//!
//! ## Diagnostics
//!
//! Every allocation records the call site (captured via `#[track_caller]`)
//! and a caller-supplied variable name. [`FitAllocator::dump`] renders one
//! line per block, and allocation, free, split, and merge events are
//! emitted as `tracing` events.

use core::fmt;
use core::panic::Location;
use core::ptr::{self, NonNull};

use tracing::{debug, error};

use crate::align;
use crate::align::{ALIGNMENT, ARCH_ALIGNMENT};
use crate::block::{BlockHeader, HEADER_SIZE, MIN_SUFFIX_SIZE, NIL};
use crate::error::AllocError;
use crate::region::Region;

/// Placement strategy used to choose the free block for an allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
  /// First fitting block, scanning from the start of the region.
  #[default]
  FirstFit,
  /// First fitting block at or after the previous placement, wrapping
  /// around from the tail of the region.
  NextFit,
  /// Smallest fitting block anywhere in the region; ties go to the lowest
  /// address.
  BestFit,
}

/// Snapshot of one block, as yielded by [`FitAllocator::blocks`].
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
  /// Address of the payload bytes.
  pub payload: *const u8,
  /// Payload length in bytes (block length minus the header).
  pub payload_size: usize,
  /// Whether the block is free.
  pub free: bool,
  /// Call site of the owning allocation, while the block is allocated.
  pub site: Option<&'static Location<'static>>,
  /// Variable name supplied at the allocating call site.
  pub var_name: Option<&'static str>,
}

/// A fixed-region heap allocator for single-threaded use.
///
/// One allocator owns one region of `N` bytes; independent instances
/// coexist freely. The allocator is `Send` but not `Sync`; callers that
/// share it across threads must serialize access externally.
///
/// # Pointer contract
///
/// [`malloc`](Self::malloc) hands out raw payload pointers into the owned
/// region. A pointer stays valid until it is passed to
/// [`free`](Self::free), the allocator is [`reset`](Self::reset), or the
/// allocator is dropped; writing more than the requested size through it
/// corrupts neighboring blocks.
pub struct FitAllocator<const N: usize> {
  region: Box<Region<N>>,
  /// Offset of the lowest-address block.
  chain_head: usize,
  /// Next-fit resume point; always the offset of some chain block.
  cursor: usize,
}

impl<const N: usize> FitAllocator<N> {
  /// Creates an allocator over a fresh zeroed region holding one free
  /// block that spans all of it.
  ///
  /// # Panics
  ///
  /// Panics if `N` cannot hold a block header plus one aligned payload
  /// chunk.
  pub fn new() -> Self {
    assert!(
      N >= HEADER_SIZE + ARCH_ALIGNMENT,
      "region of {N} bytes cannot hold a header and one aligned payload"
    );

    let mut allocator = Self {
      region: Region::new_boxed(),
      chain_head: 0,
      cursor: 0,
    };
    allocator.reset();
    allocator
  }

  /// Returns the allocator to its post-construction state: the region is
  /// zeroed and a single free block spans all of it.
  ///
  /// Outstanding allocations are destroyed; pointers previously handed out
  /// must not be used afterwards.
  pub fn reset(&mut self) {
    self.region.zero();
    // SAFETY: offset 0 is in bounds (checked on construction) and no
    // header reference is alive across this call.
    unsafe { ptr::write(self.region.header_ptr(0), BlockHeader::free_spanning(N)) };
    self.chain_head = 0;
    self.cursor = 0;
    debug!(capacity = N, "allocator reset");
  }

  /// Allocates `size` bytes and returns a pointer to the payload.
  ///
  /// The requested size is rounded up to [`ARCH_ALIGNMENT`]; the call site
  /// and `var_name` are stamped into the block header for diagnostics.
  ///
  /// # Errors
  ///
  /// [`AllocError::InvalidArgument`] when `size` is zero and
  /// [`AllocError::OutOfMemory`] when no free block can satisfy the
  /// request under `strategy`.
  #[track_caller]
  pub fn malloc(
    &mut self,
    size: usize,
    var_name: &'static str,
    strategy: Strategy,
  ) -> Result<NonNull<u8>, AllocError> {
    let site = Location::caller();

    if size == 0 {
      error!(var_name, site = %site, "zero-size allocation request");
      return Err(AllocError::InvalidArgument);
    }
    if size > N {
      // Reject before the rounding below can overflow on absurd sizes.
      error!(size, var_name, site = %site, "request exceeds region capacity");
      return Err(AllocError::OutOfMemory);
    }

    let aligned = align!(size);
    let found = match strategy {
      Strategy::FirstFit => self.find_first_fit(aligned),
      Strategy::NextFit => self.find_next_fit(aligned),
      Strategy::BestFit => self.find_best_fit(aligned),
    };
    let Some(offset) = found else {
      error!(size, var_name, site = %site, ?strategy, "no free block large enough");
      return Err(AllocError::OutOfMemory);
    };

    self.split(offset, aligned);

    let header = self.header_mut(offset);
    header.site = Some(site);
    header.var_name = Some(var_name);

    let payload = self.region.payload_ptr(offset);
    debug!(
      size,
      aligned,
      var_name,
      site = %site,
      ?strategy,
      payload = ?payload.as_ptr(),
      "allocated"
    );
    Ok(payload)
  }

  /// Releases the allocation at `ptr` and merges it with free neighbors.
  ///
  /// `var_name` is used only for the diagnostic events, matching the name
  /// given at the allocating call site is not required.
  ///
  /// # Errors
  ///
  /// [`AllocError::InvalidArgument`] when `ptr` is null, outside the
  /// region, misaligned, or not the start of a live block, and
  /// [`AllocError::DoubleFree`] when the block is already free. The region
  /// is left untouched in every error case.
  #[track_caller]
  pub fn free(
    &mut self,
    ptr: *mut u8,
    var_name: &'static str,
  ) -> Result<(), AllocError> {
    let site = Location::caller();

    let offset = match self.resolve(ptr) {
      Ok(offset) => offset,
      Err(err) => {
        error!(?ptr, var_name, site = %site, %err, "rejected free");
        return Err(err);
      }
    };

    let header = self.header_mut(offset);
    let payload_size = header.payload_size();
    header.free = true;
    header.clear_site();
    debug!(payload_size, var_name, site = %site, ?ptr, "freed");

    self.coalesce(offset);
    Ok(())
  }

  /// Writes the allocation table to `out`, one line per block in address
  /// order: payload address, payload size, free flag, and the recorded
  /// call site (`N/A:0` for free blocks).
  pub fn dump<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
    writeln!(out, "Allocation Table:")?;
    writeln!(out, "Address\t\tSize\t\tFree\t\tFile:Line")?;

    for block in self.blocks() {
      write!(
        out,
        "{:p}\t\t{}\t\t{}\t\t",
        block.payload,
        block.payload_size,
        if block.free { "Yes" } else { "No" },
      )?;
      match (block.free, block.site) {
        (true, _) => writeln!(out, "N/A:0")?,
        (false, Some(site)) => writeln!(out, "{}:{}", site.file(), site.line())?,
        (false, None) => writeln!(out, "Unknown:0")?,
      }
    }
    Ok(())
  }

  /// Iterates over every block in the region, lowest address first.
  pub fn blocks(&self) -> Blocks<'_, N> {
    Blocks {
      allocator: self,
      offset: 0,
    }
  }

  /// Total payload bytes currently allocated.
  pub fn allocated_bytes(&self) -> usize {
    self
      .blocks()
      .filter(|block| !block.free)
      .map(|block| block.payload_size)
      .sum()
  }

  /// Total payload bytes currently free, summed across all free blocks.
  /// A single request may still fail for less when the free space is
  /// fragmented.
  pub fn free_bytes(&self) -> usize {
    self
      .blocks()
      .filter(|block| block.free)
      .map(|block| block.payload_size)
      .sum()
  }

  /// Region size in bytes, headers included.
  pub const fn capacity(&self) -> usize {
    N
  }

  fn header(&self, offset: usize) -> &BlockHeader {
    // SAFETY: offsets handed around internally always head a live block.
    unsafe { &*self.region.header_ptr(offset) }
  }

  fn header_mut(&mut self, offset: usize) -> &mut BlockHeader {
    // SAFETY: as in `header`, and `&mut self` guarantees exclusivity.
    unsafe { &mut *self.region.header_ptr(offset) }
  }

  /// Walks the chain from its head and returns the first fitting block.
  fn find_first_fit(&self, aligned_size: usize) -> Option<usize> {
    let mut current = Some(self.chain_head);

    while let Some(offset) = current {
      let header = self.header(offset);
      if header.fits(aligned_size) {
        return Some(offset);
      }
      current = header.next_offset();
    }
    None
  }

  /// Walks the chain from the cursor, wrapping from the tail to the chain
  /// head, and parks the cursor on the block it returns.
  fn find_next_fit(&mut self, aligned_size: usize) -> Option<usize> {
    let start = self.cursor;
    let mut offset = start;

    loop {
      let header = self.header(offset);
      if header.fits(aligned_size) {
        self.cursor = offset;
        return Some(offset);
      }
      offset = header.next_offset().unwrap_or(self.chain_head);
      if offset == start {
        return None;
      }
    }
  }

  /// Walks the whole chain and returns the smallest fitting block; ties
  /// keep the first (lowest-address) candidate.
  fn find_best_fit(&self, aligned_size: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    let mut current = Some(self.chain_head);

    while let Some(offset) = current {
      let header = self.header(offset);
      if header.fits(aligned_size) && best.is_none_or(|(_, size)| header.size < size) {
        best = Some((offset, header.size));
      }
      current = header.next_offset();
    }
    best.map(|(offset, _)| offset)
  }

  /// Marks the block at `offset` allocated, carving off a free suffix when
  /// the remainder can hold a header plus one aligned payload chunk.
  fn split(
    &mut self,
    offset: usize,
    aligned_size: usize,
  ) {
    let (total, old_next) = {
      let header = self.header(offset);
      debug_assert!(header.free);
      (header.size, header.next)
    };

    if total >= aligned_size + HEADER_SIZE + MIN_SUFFIX_SIZE {
      let suffix = offset + HEADER_SIZE + aligned_size;
      let suffix_size = total - HEADER_SIZE - aligned_size;
      let suffix_header = BlockHeader {
        size: suffix_size,
        next: old_next,
        prev: offset,
        site: None,
        var_name: None,
        free: true,
      };
      // SAFETY: the suffix lies inside the block being split, past the
      // bytes reserved for the allocation.
      unsafe { ptr::write(self.region.header_ptr(suffix), suffix_header) };

      if old_next != NIL {
        self.header_mut(old_next).prev = suffix;
      }

      let header = self.header_mut(offset);
      header.size = aligned_size + HEADER_SIZE;
      header.next = suffix;
      header.free = false;
      // The chain head stays at the allocated prefix; the suffix sits
      // above it in address order.

      debug!(offset, suffix, suffix_size, "split block");
    } else {
      self.header_mut(offset).free = false;
      debug!(offset, size = total, "block taken whole");
    }
  }

  /// Merges the just-freed block at `offset` with its free neighbors,
  /// forward first, and clears diagnostics on the surviving block.
  fn coalesce(&mut self, offset: usize) {
    let mut survivor = offset;

    if let Some(right) = self.header(offset).next_offset() {
      if self.header(right).free {
        let (right_size, right_next) = {
          let right_header = self.header(right);
          (right_header.size, right_header.next)
        };
        let header = self.header_mut(offset);
        header.size += right_size;
        header.next = right_next;
        if right_next != NIL {
          self.header_mut(right_next).prev = offset;
        }
        if self.cursor == right {
          self.cursor = offset;
        }
        debug!(offset, absorbed = right, size = self.header(offset).size, "merged with next block");
      }
    }

    if let Some(left) = self.header(offset).prev_offset() {
      if self.header(left).free {
        let (size, next) = {
          let header = self.header(offset);
          (header.size, header.next)
        };
        let left_header = self.header_mut(left);
        left_header.size += size;
        left_header.next = next;
        if next != NIL {
          self.header_mut(next).prev = left;
        }
        if self.cursor == offset {
          self.cursor = left;
        }
        survivor = left;
        debug!(offset = left, absorbed = offset, size = self.header(left).size, "merged with previous block");
      }
    }

    self.header_mut(survivor).clear_site();
  }

  /// Maps a user pointer back to the offset of its block header.
  ///
  /// The pointer must land inside the region past the first header, be
  /// payload-aligned, and head a block that is actually on the chain; a
  /// pointer into the interior of a large allocation passes the range and
  /// alignment checks, so the chain walk is what finally rejects it.
  fn resolve(&self, ptr: *const u8) -> Result<usize, AllocError> {
    if ptr.is_null() {
      return Err(AllocError::InvalidArgument);
    }

    let base = self.region.base() as usize;
    let addr = ptr as usize;
    if addr < base + HEADER_SIZE || addr >= base + N {
      return Err(AllocError::InvalidArgument);
    }
    if (addr - base) % ALIGNMENT != 0 {
      return Err(AllocError::InvalidArgument);
    }

    let target = addr - base - HEADER_SIZE;

    let mut current = Some(self.chain_head);
    while let Some(offset) = current {
      if offset == target {
        return if self.header(offset).free {
          Err(AllocError::DoubleFree)
        } else {
          Ok(offset)
        };
      }
      if offset > target {
        break;
      }
      current = self.header(offset).next_offset();
    }
    Err(AllocError::InvalidArgument)
  }
}

impl<const N: usize> Default for FitAllocator<N> {
  fn default() -> Self {
    Self::new()
  }
}

impl<const N: usize> fmt::Debug for FitAllocator<N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FitAllocator")
      .field("capacity", &N)
      .field("chain_head", &self.chain_head)
      .field("cursor", &self.cursor)
      .field("allocated_bytes", &self.allocated_bytes())
      .finish_non_exhaustive()
  }
}

/// Iterator over the blocks of a region, lowest address first.
pub struct Blocks<'a, const N: usize> {
  allocator: &'a FitAllocator<N>,
  offset: usize,
}

impl<const N: usize> Iterator for Blocks<'_, N> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    if self.offset >= N {
      return None;
    }

    let header = self.allocator.header(self.offset);
    if header.size < HEADER_SIZE {
      // A header that cannot even cover itself means the walk left the
      // tiled part of the region; stop rather than loop.
      return None;
    }

    let info = BlockInfo {
      payload: self.allocator.region.payload_ptr(self.offset).as_ptr(),
      payload_size: header.payload_size(),
      free: header.free,
      site: header.site,
      var_name: header.var_name,
    };
    self.offset += header.size;
    Some(info)
  }
}
