//! Deterministic, pure logic shared by the hunting controller.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod conversation;
pub mod error;
pub mod immutability;
pub mod invariants;
pub mod ledger;
pub mod log_extract;
pub mod replay;
pub mod state;
pub mod types;
