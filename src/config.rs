//! Sandbox configuration.
//!
//! Everything tunable lives in one serde struct with sensible defaults. A JSON
//! file may override any subset of fields; the binaries then apply CLI flags
//! on top.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SandboxError};
use crate::journal::JournalConfig;
use crate::props::ScatterParams;
use crate::terrain::TerrainParams;

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub terrain: TerrainParams,
    pub props: ScatterParams,
    pub journal: JournalConfig,
    /// Seeds the seed source; `None` draws from entropy
    pub session_seed: Option<u64>,
}

impl SandboxConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SandboxError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| SandboxError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject parameters the generators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.terrain.segments == 0 {
            return Err(SandboxError::InvalidConfig("terrain.segments must be at least 1".into()));
        }
        if !self.terrain.world_scale.is_finite() || self.terrain.world_scale <= 0.0 {
            return Err(SandboxError::InvalidConfig(format!(
                "terrain.world_scale must be positive, got {}",
                self.terrain.world_scale
            )));
        }
        if !self.props.range.is_finite() || self.props.range <= 0.0 {
            return Err(SandboxError::InvalidConfig(format!(
                "props.range must be positive, got {}",
                self.props.range
            )));
        }
        if self.journal.base_url.trim().is_empty() {
            return Err(SandboxError::InvalidConfig("journal.base_url is empty".into()));
        }
        Ok(())
    }
}
