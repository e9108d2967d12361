//! Command-line interface definitions and subcommands

pub mod args;
pub mod validate;

pub use args::{Cli, Commands};
pub use validate::run_validate;
