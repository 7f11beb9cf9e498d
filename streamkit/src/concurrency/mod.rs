//! Concurrency primitives shared by every combinator.
//!
//! - [`cancel`] provides the level-triggered cancellation signal observed at every blocking point.
//! - [`stream`] provides the typed conduits combinators read from and write to.
//! - [`future`] provides the single-slot in-flight future used to prevent overlapping work.
//!
//! Combinators wait on these with `tokio::select!`, always listing the cancellation branch first
//! in a `biased` select so that a task stops making progress as soon as cancellation is visible.

pub mod cancel;
pub mod future;
pub mod stream;
