/// Alignment boundary every user payload must satisfy, measured from the
/// region base. Block headers are a multiple of this, so payload addresses
/// stay on it no matter how the region is carved up.
pub const ALIGNMENT: usize = 8;

/// Size alignment for allocation requests, chosen per target architecture.
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
pub const ARCH_ALIGNMENT: usize = 16;
#[cfg(any(target_arch = "x86", target_arch = "arm"))]
pub const ARCH_ALIGNMENT: usize = 8;
#[cfg(not(any(
  target_arch = "x86_64",
  target_arch = "aarch64",
  target_arch = "x86",
  target_arch = "arm"
)))]
pub const ARCH_ALIGNMENT: usize = 8;

/// Rounds a requested size up to the next `ARCH_ALIGNMENT` boundary.
///
/// # Examples
///
/// ```rust
/// use fitalloc::ARCH_ALIGNMENT;
///
/// assert_eq!(fitalloc::align!(1), ARCH_ALIGNMENT);
/// assert_eq!(fitalloc::align!(ARCH_ALIGNMENT), ARCH_ALIGNMENT);
/// assert_eq!(fitalloc::align!(ARCH_ALIGNMENT + 1), 2 * ARCH_ALIGNMENT);
/// ```
#[macro_export]
macro_rules! align {
  ($size:expr) => {
    (($size) + $crate::ARCH_ALIGNMENT - 1) & !($crate::ARCH_ALIGNMENT - 1)
  };
}

#[cfg(test)]
mod tests {
  use super::ARCH_ALIGNMENT;

  #[test]
  fn test_align() {
    for i in 0..10 {
      let sizes = (ARCH_ALIGNMENT * i + 1)..=(ARCH_ALIGNMENT * (i + 1));

      let expected = ARCH_ALIGNMENT * (i + 1);

      for size in sizes {
        assert_eq!(expected, align!(size));
      }
    }
  }

  #[test]
  fn aligned_sizes_are_fixed_points() {
    for i in 1..64 {
      let size = ARCH_ALIGNMENT * i;
      assert_eq!(size, align!(size));
    }
  }
}
