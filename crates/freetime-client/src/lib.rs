//! CLI, config file, table rendering
//!
//! This crate provides the `freetime` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod timestamp;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
