//! Library side of the `ddc` command-line tool.
//!
//! Exposes the command handlers and configuration so they can be tested
//! without spawning the binary.

pub mod commands;
pub mod config;
pub mod output;
