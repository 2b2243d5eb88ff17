use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{BlockError, BlockInfo, BlockKey, ClientBlock, PistonReaction, Rgb};

#[derive(Deserialize, Debug, Default)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockInfoDef>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlockInfoDef {
    pub key: BlockKey,
    #[serde(default)]
    pub client: Option<ClientBlock>,
    #[serde(default)]
    pub explosion_resistance: Option<f32>,
    #[serde(default)]
    pub map_color: Option<Rgb>,
    #[serde(default)]
    pub occluding: Option<bool>,
    #[serde(default)]
    pub destroyable_by_fluid: Option<bool>,
    #[serde(default)]
    pub causes_suffocation: Option<bool>,
    #[serde(default)]
    pub piston_reaction: Option<PistonReaction>,
}

impl BlockInfoDef {
    pub fn into_info(self) -> BlockInfo {
        let base = BlockInfo::new(self.key);
        BlockInfo {
            client_block: self.client.unwrap_or(base.client_block.clone()),
            explosion_resistance: self
                .explosion_resistance
                .unwrap_or(base.explosion_resistance),
            map_color: self.map_color.unwrap_or(base.map_color),
            occluding: self.occluding.unwrap_or(base.occluding),
            destroyable_by_fluid: self
                .destroyable_by_fluid
                .unwrap_or(base.destroyable_by_fluid),
            causes_suffocation: self.causes_suffocation.unwrap_or(base.causes_suffocation),
            piston_reaction: self.piston_reaction.unwrap_or(base.piston_reaction),
            ..base
        }
    }
}

/// Static block attributes loaded from a TOML file, keyed by block key.
#[derive(Default, Clone, Debug)]
pub struct BlockInfoCatalog {
    pub infos: Vec<BlockInfo>,
    pub by_key: HashMap<BlockKey, usize>,
}

impl BlockInfoCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &BlockKey) -> Option<&BlockInfo> {
        self.by_key.get(key).map(|i| &self.infos[*i])
    }

    /// Catalog entry for `key`, or the built-in defaults when the catalog has none.
    pub fn info_or_default(&self, key: &BlockKey) -> BlockInfo {
        self.get(key)
            .cloned()
            .unwrap_or_else(|| BlockInfo::new(key.clone()))
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, BlockError> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        let mut catalog = BlockInfoCatalog::new();
        for def in cfg.blocks {
            if catalog.by_key.contains_key(&def.key) {
                return Err(BlockError::DuplicateKey(def.key));
            }
            catalog.by_key.insert(def.key.clone(), catalog.infos.len());
            catalog.infos.push(def.into_info());
        }
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BlockError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}
