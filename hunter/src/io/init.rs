//! Layout of the `.hunter/` directory and its initialization.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{HunterConfig, write_config};

/// All canonical paths within `.hunter/` for a project root.
#[derive(Debug, Clone)]
pub struct HunterPaths {
    pub root: PathBuf,
    pub hunter_dir: PathBuf,
    pub state_dir: PathBuf,
    pub turns_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub config_path: PathBuf,
    pub session_path: PathBuf,
}

impl HunterPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let hunter_dir = root.join(".hunter");
        let state_dir = hunter_dir.join("state");
        Self {
            root: root.clone(),
            hunter_dir: hunter_dir.clone(),
            state_dir: state_dir.clone(),
            turns_dir: hunter_dir.join("turns"),
            gitignore_path: hunter_dir.join(".gitignore"),
            config_path: hunter_dir.join("config.toml"),
            session_path: state_dir.join("session.json"),
        }
    }
}

/// Options for `init_hunter`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing hunter-owned files.
    pub force: bool,
}

/// Create `.hunter/` scaffolding in `root`.
///
/// Fails if `.hunter/` already exists unless `options.force` is set. The
/// session file is left alone; it is created when a bug is reported.
pub fn init_hunter(root: &Path, options: &InitOptions) -> Result<HunterPaths> {
    let paths = HunterPaths::new(root);
    if paths.hunter_dir.exists() && !options.force {
        return Err(anyhow!(
            "hunter init: .hunter already exists (use --force to overwrite)"
        ));
    }
    if paths.hunter_dir.exists() && !paths.hunter_dir.is_dir() {
        return Err(anyhow!(
            "hunter init: .hunter exists but is not a directory"
        ));
    }

    create_dir(&paths.hunter_dir)?;
    create_dir(&paths.state_dir)?;
    create_dir(&paths.turns_dir)?;

    write_file(&paths.gitignore_path, HUNTER_GITIGNORE)?;
    write_config(&paths.config_path, &HunterConfig::default())?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("write file {}", path.display()))
}

const HUNTER_GITIGNORE: &str = "turns/\n";
