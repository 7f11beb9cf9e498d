//! Concurrent stream-processing combinators on top of tokio.
//!
//! Streams are bounded tokio channels ([`concurrency::stream`]) and every combinator in [`ops`]
//! races its blocking points against a level-triggered cancellation signal
//! ([`concurrency::cancel`]). Combinators spawn their tasks into a per-call
//! [`workers::group::WorkerGroup`] and close their outputs only once all of those tasks exited.

pub mod concurrency;
pub mod error;
mod macros;
pub mod ops;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod workers;
