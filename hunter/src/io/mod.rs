//! I/O helpers for hunter commands.

pub mod atomic;
pub mod backend;
pub mod channel;
pub mod config;
pub mod init;
pub mod process;
pub mod prompt;
pub mod session_store;
pub mod turn_log;
