//! Sample blocks registered by the demo host.

use std::any::Any;

use dimblock_blocks::{
    BlockData, BlockDefinition, BlockError, BlockInfo, BlockInfoCatalog, BlockKey, BlockWorld,
    ClientBlock, EntityRef, Hand, HitResult, HookResult, InteractionResult, Redstone,
    StateDescriptor,
};
use dimblock_geom::{BlockFace, Location};
use dimblock_runtime::{EngineAdapter, Registry};
use dimblock_tile::{Compound, TileEntityState, TileError};
use rand::{Rng, RngCore};

fn info_for(catalog: &BlockInfoCatalog, key: &str) -> Result<BlockInfo, BlockError> {
    Ok(catalog.info_or_default(&key.parse::<BlockKey>()?))
}

/// Toggled by players; stays lit for a few ticks, then dims on its own.
pub struct Lamp {
    info: BlockInfo,
}

impl Lamp {
    pub const KEY: &'static str = "demo:lamp";
    const GLOW_TICKS: u64 = 4;
}

impl BlockDefinition for Lamp {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn states(&self) -> HookResult<Vec<StateDescriptor>> {
        Ok(vec![
            StateDescriptor::boolean("lit", false)?,
            StateDescriptor::int("power", 0, 15, 15)?,
        ])
    }

    fn on_register(&self, _world: &dyn BlockWorld) -> HookResult {
        log::info!(target: "host", "{} ready", self.key());
        Ok(())
    }

    fn client_view(&self, data: &BlockData) -> ClientBlock {
        self.info
            .client_block
            .clone()
            .with("lit", data.get_bool("lit").unwrap_or(false))
    }

    fn interact(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        entity: &EntityRef,
        _hand: Hand,
        _hit: HitResult,
    ) -> HookResult<InteractionResult> {
        let lit = !data.get_bool("lit").unwrap_or(false);
        log::info!(target: "host", "{} turns {} the lamp at {}", entity.kind, if lit { "on" } else { "off" }, location);
        world.set_block_data(&data.with("lit", lit)?, location, true)?;
        if lit {
            self.tick_later(world, location, Self::GLOW_TICKS);
        }
        Ok(InteractionResult::Success)
    }

    fn tick(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        random: &mut dyn RngCore,
    ) -> HookResult {
        if !data.get_bool("lit").unwrap_or(false) {
            return Ok(());
        }
        // flicker a little before going dark
        if random.gen_bool(0.25) {
            self.tick_later(world, location, 1);
            return Ok(());
        }
        world.set_block_data(&data.with("lit", false)?, location, true)
    }

    fn update_state(
        &self,
        _world: &mut dyn BlockWorld,
        _data: &BlockData,
        location: Location,
        _neighbor: Location,
        direction: BlockFace,
    ) -> HookResult {
        log::debug!(target: "host", "lamp at {} saw a change to its {}", location, direction);
        Ok(())
    }

    fn redstone(&self) -> Option<&dyn Redstone> {
        Some(self)
    }
}

impl Redstone for Lamp {
    fn is_power_source(&self, data: &BlockData) -> bool {
        data.get_bool("lit").unwrap_or(false)
    }

    fn power_level(&self, data: &BlockData, _location: Location, _face: BlockFace) -> u8 {
        data.get_int("power").map_or(0, |p| p.clamp(0, 15) as u8)
    }
}

/// Fired clay counter kept by a kiln.
#[derive(Debug, Default)]
pub struct KilnState {
    pub heat: i32,
    pub fired: i32,
}

impl KilnState {
    const FIRING_HEAT: i32 = 5;
}

impl TileEntityState for KilnState {
    fn load(&mut self, tag: &Compound) -> Result<(), TileError> {
        self.heat = tag.require_int("heat")?;
        self.fired = tag.get_int("fired").unwrap_or(0);
        Ok(())
    }

    fn save(&self, tag: &mut Compound) {
        tag.put_int("heat", self.heat);
        tag.put_int("fired", self.fired);
    }

    fn tick(&mut self) {
        self.heat += 1;
        if self.heat >= Self::FIRING_HEAT {
            self.heat = 0;
            self.fired += 1;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct Kiln {
    info: BlockInfo,
}

impl Kiln {
    pub const KEY: &'static str = "demo:kiln";
    const STOKE_HEAT: i32 = 2;
}

impl BlockDefinition for Kiln {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn states(&self) -> HookResult<Vec<StateDescriptor>> {
        Ok(vec![StateDescriptor::named(
            "facing",
            &["north", "east", "south", "west"],
            "north",
        )?])
    }

    fn client_view(&self, data: &BlockData) -> ClientBlock {
        self.info.client_block.clone().with_data(data)
    }

    fn create_tile_entity(&self, _data: &BlockData, _location: Location) -> Option<Box<dyn TileEntityState>> {
        Some(Box::new(KilnState::default()))
    }

    /// Stoking adds heat directly to the kiln's tile entity.
    fn interact(
        &self,
        world: &mut dyn BlockWorld,
        _data: &BlockData,
        location: Location,
        _entity: &EntityRef,
        _hand: Hand,
        _hit: HitResult,
    ) -> HookResult<InteractionResult> {
        let Some(kiln) = world
            .tile_entity_at(location)
            .and_then(|s| s.downcast_mut::<KilnState>())
        else {
            return Ok(InteractionResult::Pass);
        };
        kiln.heat += Self::STOKE_HEAT;
        Ok(InteractionResult::Success)
    }

    fn post_break(&self, _world: &mut dyn BlockWorld, data: &BlockData, location: Location) -> HookResult {
        log::info!(
            target: "host",
            "kiln at {} broken, facing {}",
            location,
            data.get_name("facing").unwrap_or("north")
        );
        Ok(())
    }
}

pub fn register_all<E: EngineAdapter>(
    registry: &mut Registry<E>,
    catalog: &BlockInfoCatalog,
) -> Result<(), BlockError> {
    registry.register(Lamp {
        info: info_for(catalog, Lamp::KEY)?,
    })?;
    registry.register(Kiln {
        info: info_for(catalog, Kiln::KEY)?,
    })?;
    Ok(())
}
