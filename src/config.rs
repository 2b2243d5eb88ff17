use std::fs;
use std::path::{Path, PathBuf};

use dimblock_blocks::{BlockError, BlockInfoCatalog};
use dimblock_runtime::{MemoryEngineConfig, RegistryConfig};
use serde::Deserialize;

// Top-level host config file
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct HostConfig {
    pub registry: RegistryConfig,
    pub engine: MemoryEngineConfig,
    // Block attribute catalog, relative to the config file
    pub blocks: Option<PathBuf>,
}

impl HostConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, BlockError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BlockError> {
        let path = path.as_ref();
        let mut cfg = Self::from_toml_str(&fs::read_to_string(path)?)?;
        if let (Some(blocks), Some(dir)) = (cfg.blocks.as_mut(), path.parent()) {
            if blocks.is_relative() {
                *blocks = dir.join(&*blocks);
            }
        }
        Ok(cfg)
    }

    pub fn catalog(&self) -> Result<BlockInfoCatalog, BlockError> {
        match &self.blocks {
            Some(path) => BlockInfoCatalog::from_path(path),
            None => Ok(BlockInfoCatalog::new()),
        }
    }
}
