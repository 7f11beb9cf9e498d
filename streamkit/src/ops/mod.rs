//! Stream combinators.
//!
//! Every combinator takes its inputs and a [`crate::concurrency::cancel::CancelRx`], spawns the
//! tasks it needs and returns immediately with its output. Outputs close once every task that can
//! write to them has exited.

pub mod fan;
pub mod filter;
pub mod moving_later;
pub mod poll;
pub mod single_flight;
pub mod take_first;
pub mod transform;
pub mod workerpool;

pub use fan::{fan_in, fan_out};
pub use filter::filter;
pub use moving_later::moving_later;
pub use poll::poll;
pub use single_flight::SingleFlight;
pub use take_first::{take_first_to_list, take_first_to_stream};
pub use transform::transform;
pub use workerpool::workerpool;
