//! Raccoon daemon library
//!
//! This module provides the process-level pieces of the raccoon daemon:
//! - Command line parsing and configuration layering
//! - The `/metrics` endpoint and signal handling

pub mod cli;
pub mod config;
pub mod error;
pub mod server;

pub use cli::{Cli, Command, GarbageArgs, LogFormat};
pub use config::RaccoonConfig;
pub use error::{DaemonError, DaemonResult};
