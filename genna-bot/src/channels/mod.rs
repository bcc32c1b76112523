//! Channel implementations.

pub mod cli;

pub use cli::{CliChannel, CliChannelConfig, run_interactive};
