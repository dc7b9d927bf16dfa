//! Resumable bug-hunting iteration controller.
//!
//! A reported bug moves through hunting rounds: a reasoning backend proposes a
//! hypothesis and decides whether it needs more logs or has found the cause,
//! a person reproduces the bug and pastes tagged log lines, and the cycle
//! repeats until the bug is confirmed fixed. Every turn is resumable because
//! the whole dialogue is rebuilt from the recorded cycles.
//!
//! - **[`core`]**: Pure, deterministic logic (ledger, replay, log extraction,
//!   invariants). No I/O.
//! - **[`io`]**: Side-effecting operations (backend process, terminal channel,
//!   config, session and turn logs). Isolated so tests can script them.
//!
//! [`hunter`] holds the state machine. Orchestration modules ([`turn`],
//! [`report`], [`handoff`], [`validate`]) implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod handoff;
pub mod hunter;
pub mod io;
pub mod logging;
pub mod report;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
pub mod validate;
