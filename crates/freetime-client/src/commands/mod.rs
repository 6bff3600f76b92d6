//! Command implementations.

pub mod config;
pub mod free;
pub mod init;
pub mod lookup;
