use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tileworld_world::SimConfig;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/tileworld.toml";

/// Everything the headless runner reads from `config/tileworld.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TileworldConfig {
    pub run: RunConfig,
    pub sim: SimConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Ticks to step before exiting.
    pub ticks: u64,
    /// Seconds per tick.
    pub tick_secs: f64,
    /// Seconds per frame fed to the tick accumulator.
    pub frame_secs: f64,
    /// Directory holding profile saves.
    pub save_dir: PathBuf,
    /// Save file name, without extension.
    pub profile: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: 1200,
            tick_secs: 0.05,
            frame_secs: 1.0 / 60.0,
            save_dir: PathBuf::from("saves"),
            profile: "player".to_string(),
        }
    }
}

impl TileworldConfig {
    /// Read the config, falling back to defaults when the file is missing or
    /// malformed.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<TileworldConfig>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Config file {} not found. Using defaults",
                        path.display()
                    );
                }
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}
