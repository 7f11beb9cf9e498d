//! Helpers for testing code built on the stream combinators.
//!
//! - [`stream`] turns plain iterators into streams and drains streams with a timeout, so a test
//!   waiting on a stream that never closes fails instead of hanging.
//! - [`sorted`] compares outputs of combinators that do not preserve ordering.

pub mod stream;

pub use stream::{DEFAULT_COLLECT_TIMEOUT, collect, stream_from_iter};

/// Returns `values` sorted, for order-insensitive comparisons.
pub fn sorted<T: Ord>(mut values: Vec<T>) -> Vec<T> {
    values.sort_unstable();
    values
}
