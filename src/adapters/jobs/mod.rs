//! Background jobs.

mod activation_sweeper;

pub use activation_sweeper::{ActivationSweeper, ActivationSweeperConfig};
