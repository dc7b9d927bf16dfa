//! Hunter configuration stored under `.hunter/config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::atomic::write_atomic;

/// Hunter configuration (TOML).
///
/// Meant to be edited by hand. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HunterConfig {
    /// Temperature for deriving reproduction instructions.
    pub reproduction_temperature: f32,

    /// Temperature for the exploratory hunting call.
    pub hunting_temperature: f32,

    /// Temperature for the ADD_LOGS / PROBLEM_IDENTIFIED classification.
    pub conclusion_temperature: f32,

    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    /// Command that answers one request read as JSON from stdin.
    pub command: Vec<String>,

    /// Wall-clock budget per backend call in seconds.
    pub timeout_secs: u64,

    /// Reply bytes kept from the backend's stdout.
    pub output_limit_bytes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: vec!["hunter-backend".to_string()],
            timeout_secs: 10 * 60,
            output_limit_bytes: 200_000,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            reproduction_temperature: 0.0,
            hunting_temperature: 0.5,
            conclusion_temperature: 0.0,
            backend: BackendConfig::default(),
        }
    }
}

impl HunterConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("reproduction_temperature", self.reproduction_temperature),
            ("hunting_temperature", self.hunting_temperature),
            ("conclusion_temperature", self.conclusion_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(anyhow!("{name} must be within [0, 2] (got {value})"));
            }
        }
        if self.backend.command.is_empty() || self.backend.command[0].trim().is_empty() {
            return Err(anyhow!("backend.command must be a non-empty array"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(anyhow!("backend.timeout_secs must be > 0"));
        }
        if self.backend.output_limit_bytes == 0 {
            return Err(anyhow!("backend.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HunterConfig::default()`.
pub fn load_config(path: &Path) -> Result<HunterConfig> {
    if !path.exists() {
        let cfg = HunterConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HunterConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &HunterConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, HunterConfig::default());
        assert_eq!(cfg.hunting_temperature, 0.5);
        assert_eq!(cfg.reproduction_temperature, 0.0);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = HunterConfig::default();
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "hunting_temperature = 0.9\n[backend]\ncommand = [\"my-llm\", \"--json\"]\n")
            .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.hunting_temperature, 0.9);
        assert_eq!(cfg.backend.command, vec!["my-llm", "--json"]);
        assert_eq!(cfg.backend.timeout_secs, BackendConfig::default().timeout_secs);
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let cfg = HunterConfig {
            hunting_temperature: 3.5,
            ..HunterConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("hunting_temperature"));
    }

    #[test]
    fn rejects_empty_backend_command() {
        let mut cfg = HunterConfig::default();
        cfg.backend.command.clear();
        assert!(cfg.validate().is_err());
    }
}
