//! # fitalloc - A Fixed-Region Memory Allocator Library
//!
//! This crate provides a **fixed-region heap allocator** for single-threaded
//! use: it owns a statically-sized contiguous byte region and services
//! variable-sized allocation and free requests against it under a choice of
//! three placement strategies (first-fit, next-fit, best-fit).
//!
//! ## Overview
//!
//! ```text
//!   Fixed-Region Allocator Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                       REGION (N bytes, owned)                        │
//!   │                                                                      │
//!   │   ┌────┬──────┬────┬────────┬────┬──────────────────────────────┐    │
//!   │   │ H  │ used │ H  │  free  │ H  │            free              │    │
//!   │   └────┴──────┴────┴────────┴────┴──────────────────────────────┘    │
//!   │     │            │             │                                     │
//!   │     └── every block starts with a header (H) linked to its           │
//!   │         address-order neighbors; freed blocks merge eagerly          │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every allocation records its call site (captured with `#[track_caller]`)
//! and a caller-supplied variable name, so leaks and misuse can be read
//! straight off the allocation table produced by
//! [`dump`](FitAllocator::dump).
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - Alignment constants and the align! macro
//!   ├── block      - Block header layout (internal)
//!   ├── region     - Owned backing region, raw-pointer boundary (internal)
//!   ├── error      - AllocError
//!   └── allocator  - FitAllocator, Strategy, blocks/dump introspection
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitalloc::{FitAllocator, Strategy};
//!
//! let mut allocator = FitAllocator::<4096>::new();
//!
//! let ptr = allocator.malloc(64, "scratch", Strategy::FirstFit).unwrap();
//! unsafe { ptr.as_ptr().write_bytes(0xAB, 64) };
//!
//! let mut table = String::new();
//! allocator.dump(&mut table).unwrap();
//! assert!(table.starts_with("Allocation Table:"));
//!
//! allocator.free(ptr.as_ptr(), "scratch").unwrap();
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the allocator is `Send` but not `Sync`; wrap
//!   it in a lock for shared use.
//! - **Fixed capacity**: the region never grows, shrinks, or moves, and
//!   memory is never returned to the operating system.
//! - **Fixed alignment**: payloads are aligned to [`ARCH_ALIGNMENT`];
//!   requests for larger alignments are not supported.
//!
//! ## Safety
//!
//! The allocator hands out raw pointers into memory it owns. Callers must
//! not use a pointer after freeing it, free it twice (this is detected and
//! rejected, but the pointer stays invalid), or write beyond the requested
//! size.

pub mod align;
mod allocator;
mod block;
mod error;
mod region;

pub use align::{ALIGNMENT, ARCH_ALIGNMENT};
pub use allocator::{BlockInfo, Blocks, FitAllocator, Strategy};
pub use block::HEADER_SIZE;
pub use error::AllocError;

/// Region size of the default allocator, in bytes.
pub const HEAP_SIZE: usize = 64 * 1024;

/// Allocator over a region of [`HEAP_SIZE`] bytes.
pub type DefaultFitAllocator = FitAllocator<HEAP_SIZE>;
