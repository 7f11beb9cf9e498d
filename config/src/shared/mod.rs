//! Shared configuration types for streamkit pipelines.

mod base;
mod demo;
mod poll;
mod take;
mod workers;

pub use base::ValidationError;
pub use demo::DemoConfig;
pub use poll::PollConfig;
pub use take::TakeConfig;
pub use workers::WorkersConfig;
