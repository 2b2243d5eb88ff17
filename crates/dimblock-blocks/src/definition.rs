use std::sync::Arc;

use dimblock_geom::{BlockFace, Location};
use dimblock_tile::TileEntityState;
use rand::RngCore;

use crate::{
    BlockData, BlockError, BlockInfo, BlockKey, ClientBlock, HookResult, PistonReaction, Rgb,
    StateDescriptor,
};

/// Outcome of [`BlockDefinition::interact`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InteractionResult {
    /// Not handled; the held item's own interaction proceeds.
    #[default]
    Pass,
    /// Handled; the held item's interaction is suppressed.
    Success,
}

impl InteractionResult {
    #[inline]
    pub fn suppresses_item_use(self) -> bool {
        matches!(self, InteractionResult::Success)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: u64,
    pub kind: String,
}

impl EntityRef {
    pub fn new(id: u64, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Hand {
    #[default]
    Main,
    Off,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub kind: String,
    pub count: u32,
}

/// Block face hit by a ray or projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HitResult {
    pub location: Location,
    pub face: BlockFace,
}

/// Optional redstone capability of a definition.
///
/// The definition detects its own level changes and re-applies physics; the registry
/// only forwards queries.
pub trait Redstone {
    fn is_complex_redstone(&self, _data: &BlockData) -> bool {
        false
    }

    /// Analog level read by comparators, 0..=15.
    fn comparator_level(&self, _data: &BlockData, _location: Location) -> u8 {
        0
    }

    fn is_power_source(&self, _data: &BlockData) -> bool {
        false
    }

    fn power_level(&self, _data: &BlockData, _location: Location, _face: BlockFace) -> u8 {
        0
    }
}

/// World access handed to hooks. Implemented by the registry; calls may re-enter it.
pub trait BlockWorld {
    fn definition_for(&self, key: &BlockKey) -> Option<Arc<dyn BlockDefinition>>;

    fn default_block_data_for(&self, definition: &dyn BlockDefinition) -> Option<BlockData>;

    fn block_data_at(&self, location: Location) -> Option<BlockData>;

    fn set_block_data(
        &mut self,
        data: &BlockData,
        location: Location,
        apply_physics: bool,
    ) -> Result<(), BlockError>;

    fn remove_block(&mut self, location: Location, apply_physics: bool) -> Result<(), BlockError>;

    fn apply_physics(&mut self, key: &BlockKey, location: Location);

    /// Schedules a tick of the block `key` at `location`; returns the request id.
    fn tick_later(&mut self, location: Location, key: &BlockKey, delay: u64) -> u64;

    fn tile_entity_at(&mut self, location: Location) -> Option<&mut (dyn TileEntityState + 'static)>;
}

/// Engine-independent behavior of one block type.
///
/// Only [`info`](Self::info) and [`states`](Self::states) are mandatory. Hooks that may
/// mutate the world return [`HookResult`]; errors are logged by the caller and the
/// invocation counts as a no-op.
#[allow(unused_variables)]
pub trait BlockDefinition {
    fn info(&self) -> &BlockInfo;

    /// Property descriptors; must not change over the definition's lifetime.
    fn states(&self) -> HookResult<Vec<StateDescriptor>>;

    fn on_register(&self, world: &dyn BlockWorld) -> HookResult {
        Ok(())
    }

    /// What the client is shown for `data`.
    fn client_view(&self, data: &BlockData) -> ClientBlock {
        self.info().client_block.clone()
    }

    fn on_contact(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        entity: &EntityRef,
    ) -> HookResult {
        Ok(())
    }

    fn drop_naturally(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        item: Option<&ItemRef>,
    ) -> HookResult {
        Ok(())
    }

    fn can_entity_spawn_on(&self, data: &BlockData, location: Location, kind: &str) -> bool {
        true
    }

    fn is_occluding(&self, data: &BlockData, location: Location) -> bool {
        self.info().occluding
    }

    fn attack_block(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        entity: &EntityRef,
    ) -> HookResult {
        Ok(())
    }

    fn step_on(&self, world: &mut dyn BlockWorld, location: Location, entity: &EntityRef) -> HookResult {
        Ok(())
    }

    fn on_projectile_hit(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        projectile: &EntityRef,
        hit: HitResult,
    ) -> HookResult {
        Ok(())
    }

    fn interact(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        entity: &EntityRef,
        hand: Hand,
        hit: HitResult,
    ) -> HookResult<InteractionResult> {
        Ok(InteractionResult::Pass)
    }

    /// Called after the data at `location` was written.
    fn on_data_update(&self, world: &mut dyn BlockWorld, data: &BlockData, location: Location) -> HookResult {
        Ok(())
    }

    fn post_break(&self, world: &mut dyn BlockWorld, data: &BlockData, location: Location) -> HookResult {
        Ok(())
    }

    /// Scheduled tick, invoked at most once per [`BlockWorld::tick_later`] request.
    fn tick(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        random: &mut dyn RngCore,
    ) -> HookResult {
        Ok(())
    }

    /// A neighbour changed; `direction` is the face of this block pointing at it.
    fn update_state(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        neighbor: Location,
        direction: BlockFace,
    ) -> HookResult {
        Ok(())
    }

    fn do_physics(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        other: Location,
    ) -> HookResult {
        Ok(())
    }

    fn handle_rain(&self, world: &mut dyn BlockWorld, location: Location) -> HookResult {
        Ok(())
    }

    fn explosion_resistance(&self, data: &BlockData) -> f32 {
        self.info().explosion_resistance
    }

    fn map_color(&self, data: &BlockData, location: Location) -> Rgb {
        self.info().map_color
    }

    fn piston_reaction(&self, data: &BlockData) -> PistonReaction {
        self.info().piston_reaction
    }

    fn destroyed_by_fluid(&self, data: &BlockData, fluid: &str) -> bool {
        self.info().destroyable_by_fluid
    }

    fn causes_suffocation(&self, data: &BlockData, location: Location) -> bool {
        self.info().causes_suffocation
    }

    fn redstone(&self) -> Option<&dyn Redstone> {
        None
    }

    /// Fresh tile entity state for a newly placed block, if this type carries one.
    fn create_tile_entity(&self, data: &BlockData, location: Location) -> Option<Box<dyn TileEntityState>> {
        None
    }

    fn key(&self) -> &BlockKey {
        &self.info().key
    }

    fn tick_later(&self, world: &mut dyn BlockWorld, location: Location, delay: u64) -> u64 {
        world.tick_later(location, self.key(), delay)
    }

    fn apply_physics(&self, world: &mut dyn BlockWorld, location: Location) {
        world.apply_physics(self.key(), location);
    }

    fn default_block_data(&self, world: &dyn BlockWorld) -> Option<BlockData>
    where
        Self: Sized,
    {
        world.default_block_data_for(self)
    }
}

impl std::fmt::Debug for dyn BlockDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockDefinition({})", self.key())
    }
}
