//! Command line interface module
//!
//! Argument parsing and the runner that dispatches each subcommand to the
//! registry client.

pub mod args;
pub mod runner;

pub use args::{Args, Command};
pub use runner::Runner;
