//! Stable exit codes for hunter CLI commands.

/// Command succeeded and the iteration is ready for another turn.
pub const OK: i32 = 0;
/// Command failed: bad layout, config, session, backend reply, or other error.
pub const INVALID: i32 = 1;
/// The iteration is complete.
pub const COMPLETE: i32 = 2;
/// The iteration waits on the logging or fix stage.
pub const HANDOFF: i32 = 3;
