//! Logging setup shared by streamkit binaries and tests.

pub mod tracing;
