//! Command implementations for the Thumbsmith CLI.

pub mod config;
pub mod run;
