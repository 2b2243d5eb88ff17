use serde::Deserialize;

/// Registry tuning, usually read from the `[registry]` table of the host config.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Seed of the random source handed to scheduled ticks.
    pub seed: u64,
    /// Nesting limit for physics cascades started from hooks.
    pub max_physics_depth: u32,
    pub tick_tile_entities: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_physics_depth: 64,
            tick_tile_entities: true,
        }
    }
}
