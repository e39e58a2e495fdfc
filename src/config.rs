//! Daemon configuration, read from `menteed.toml` with environment overrides.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::mentor::MentorGate;
use crate::store::Backend;

/// Canonical config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "menteed.toml";

pub const ENV_CONFIG: &str = "MENTEED_CONFIG";
pub const ENV_DATA_DIR: &str = "MENTEED_DATA_DIR";
pub const ENV_BACKEND: &str = "MENTEED_BACKEND";
pub const ENV_MENTOR_PASSWORD: &str = "MENTEED_MENTOR_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub mentor: MentorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub backend: Backend,
    /// Open `data_dir` at startup instead of waiting for `workspace.select`.
    #[serde(default = "default_true")]
    pub open_on_start: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::default(),
            open_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MentorSettings {
    /// Plain-text shared password.
    #[serde(default)]
    pub password: Option<String>,
    /// SHA-256 hex digest of the shared password; wins over `password`.
    #[serde(default)]
    pub password_sha256: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid menteed config")
    }

    /// Read `path`; a missing file gives the defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        Self::from_toml_str(&text)
    }

    /// File from `MENTEED_CONFIG` (or `./menteed.toml`), then env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var_os(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let mut cfg = Self::from_file(&path)?;
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    pub fn apply_env<F>(&mut self, get: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = get(ENV_DATA_DIR).filter(|s| !s.trim().is_empty()) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(ENV_BACKEND).filter(|s| !s.trim().is_empty()) {
            self.storage.backend = Backend::parse(&raw)
                .with_context(|| format!("{ENV_BACKEND}: unknown backend {raw:?}"))?;
        }
        if let Some(pw) = get(ENV_MENTOR_PASSWORD).filter(|s| !s.is_empty()) {
            self.mentor.password = Some(pw);
            self.mentor.password_sha256 = None;
        }
        Ok(())
    }

    pub fn mentor_gate(&self) -> anyhow::Result<MentorGate> {
        if let Some(hex) = self.mentor.password_sha256.as_deref() {
            return MentorGate::from_sha256_hex(hex);
        }
        Ok(match self.mentor.password.as_deref() {
            Some(pw) if !pw.is_empty() => MentorGate::from_password(pw),
            _ => MentorGate::disabled(),
        })
    }
}
