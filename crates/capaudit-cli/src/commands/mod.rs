//! Subcommand implementations.

pub mod audit;
pub mod completion;
pub mod validate;
pub mod verify;
