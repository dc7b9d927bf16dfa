//! Development-time tracing for debugging the hunter.
//!
//! Tracing output goes to stderr and is controlled by `RUST_LOG`. It is not
//! part of the product output: turn history lives in `.hunter/turns/` and is
//! always written.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber. Defaults to `warn` when `RUST_LOG` is unset.
///
/// ```bash
/// RUST_LOG=hunter=debug hunter turn
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
