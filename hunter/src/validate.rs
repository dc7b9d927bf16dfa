//! Validation of the `.hunter/` layout, config, and session.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::core::types::IterationStatus;
use crate::io::config::load_config;
use crate::io::init::HunterPaths;
use crate::io::session_store::load_session;

/// Session validation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValidation {
    /// No bug reported yet.
    NoBugReported,
    Ok {
        status: IterationStatus,
        cycles: usize,
    },
}

/// Validate `.hunter/` layout, config, and the stored session.
pub fn validate_hunter(root: &Path) -> Result<SessionValidation> {
    let paths = HunterPaths::new(root);

    ensure_dir(&paths.hunter_dir)?;
    ensure_dir(&paths.state_dir)?;
    ensure_dir(&paths.turns_dir)?;

    load_config(&paths.config_path).with_context(|| "load config.toml")?;

    if !paths.session_path.exists() {
        return Ok(SessionValidation::NoBugReported);
    }
    let session = load_session(&paths.session_path).with_context(|| "load session.json")?;
    Ok(SessionValidation::Ok {
        status: session.project.iteration.status,
        cycles: session.project.iteration.cycles.len(),
    })
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(anyhow!("missing directory {} (run `hunter init`)", path.display()));
    }
    Ok(())
}
