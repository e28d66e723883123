//! Subcommands

pub mod analyze;
pub mod debate;
pub mod monitor;
pub mod sweep;
