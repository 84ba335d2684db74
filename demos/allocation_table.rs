use fitalloc::{DefaultFitAllocator, Strategy};

/// Renders the allocator's current allocation table to stdout.
fn print_table(
  label: &str,
  allocator: &DefaultFitAllocator,
) {
  let mut table = String::new();
  allocator.dump(&mut table).expect("writing to a String cannot fail");
  println!("\n=== {label} ===\n{table}");
}

fn main() {
  // Route the allocator's tracing events to stderr so the split/merge
  // activity is visible next to the allocation tables. Filter with
  // RUST_LOG, e.g. `RUST_LOG=debug cargo run --example allocation_table`.
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let mut allocator = DefaultFitAllocator::new();
  print_table("fresh region", &allocator);

  // --------------------------------------------------------------------
  // 1) A few first-fit allocations: carve the region front to back.
  // --------------------------------------------------------------------
  let request = allocator
    .malloc(256, "request", Strategy::FirstFit)
    .expect("fresh region must hold 256 bytes");
  let response = allocator
    .malloc(1024, "response", Strategy::FirstFit)
    .expect("fresh region must hold 1024 bytes");
  let scratch = allocator
    .malloc(64, "scratch", Strategy::FirstFit)
    .expect("fresh region must hold 64 bytes");

  unsafe { request.as_ptr().write_bytes(0xAA, 256) };
  unsafe { response.as_ptr().write_bytes(0xBB, 1024) };
  print_table("after three first-fit allocations", &allocator);

  // --------------------------------------------------------------------
  // 2) Free the middle block: the hole shows up in the table.
  // --------------------------------------------------------------------
  allocator
    .free(response.as_ptr(), "response")
    .expect("response is live");
  print_table("after freeing the middle block", &allocator);

  // --------------------------------------------------------------------
  // 3) Best-fit picks the tightest hole for a small request, next-fit
  //    carries on from the last placement.
  // --------------------------------------------------------------------
  let snug = allocator
    .malloc(512, "snug", Strategy::BestFit)
    .expect("the freed hole fits 512 bytes");
  let tail = allocator
    .malloc(128, "tail", Strategy::NextFit)
    .expect("the tail fits 128 bytes");
  print_table("after best-fit and next-fit placements", &allocator);

  println!(
    "allocated: {} bytes, free: {} bytes, capacity: {} bytes",
    allocator.allocated_bytes(),
    allocator.free_bytes(),
    allocator.capacity(),
  );

  // --------------------------------------------------------------------
  // 4) Release everything; the region coalesces back to a single block.
  // --------------------------------------------------------------------
  for (ptr, name) in [
    (request, "request"),
    (scratch, "scratch"),
    (snug, "snug"),
    (tail, "tail"),
  ] {
    allocator.free(ptr.as_ptr(), name).expect("pointer is live");
  }
  print_table("after releasing everything", &allocator);
}
