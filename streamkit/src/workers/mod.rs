//! Worker tasks shared by the stream combinators.
//!
//! Every combinator invocation owns a [`group::WorkerGroup`] that tracks the tasks it spawned.
//! Output streams are closed by the group once all of its tasks have exited, never earlier.

pub mod base;
pub mod group;
pub mod stage;
