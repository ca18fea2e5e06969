use std::time::Instant;

use lazy_static::lazy_static;

lazy_static! {
    static ref ORIGIN: Instant = Instant::now();
}

/// Monotonic nanoseconds since first use in this process. Only differences
/// and ordering are meaningful, like the kernel's monotonic clock.
pub fn monotonic_ns() -> u64 {
    ORIGIN.elapsed().as_nanos() as u64
}
