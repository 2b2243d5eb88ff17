#![allow(dead_code)]

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use dimblock_blocks::{
    BlockData, BlockDefinition, BlockInfo, BlockWorld, ClientBlock, EntityRef, Hand, HitResult,
    HookResult, InteractionResult, Redstone, StateDescriptor,
};
use dimblock_geom::{BlockFace, Location, WorldId};
use dimblock_runtime::{MemoryEngine, Registry, RegistryConfig};
use dimblock_tile::{Compound, TileEntityState, TileError};
use rand::RngCore;

pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn at(x: i32, y: i32, z: i32) -> Location {
    Location::new(WorldId(0), x, y, z)
}

pub fn registry() -> Registry<MemoryEngine> {
    Registry::new(MemoryEngine::default(), RegistryConfig::default())
}

/// Records every hook it sees into a shared journal.
pub struct Recorder {
    pub info: BlockInfo,
    pub journal: Journal,
}

impl Recorder {
    pub fn new(key: &str, journal: &Journal) -> Self {
        Self {
            info: BlockInfo::new(key.parse().unwrap()),
            journal: Rc::clone(journal),
        }
    }

    fn log(&self, entry: String) {
        self.journal.borrow_mut().push(entry);
    }
}

impl BlockDefinition for Recorder {
    fn info(&self) -> &BlockInfo {
        &self.info
    }

    fn states(&self) -> HookResult<Vec<StateDescriptor>> {
        Ok(vec![
            StateDescriptor::boolean("lit", false)?,
            StateDescriptor::int("power", 0, 15, 0)?,
        ])
    }

    fn client_view(&self, data: &BlockData) -> ClientBlock {
        ClientBlock::new("minecraft:redstone_lamp").with("lit", data.get_bool("lit").unwrap_or(false))
    }

    fn tick(
        &self,
        _world: &mut dyn BlockWorld,
        _data: &BlockData,
        location: Location,
        _random: &mut dyn RngCore,
    ) -> HookResult {
        self.log(format!("tick {} {},{},{}", self.info.key, location.x, location.y, location.z));
        Ok(())
    }

    fn update_state(
        &self,
        _world: &mut dyn BlockWorld,
        _data: &BlockData,
        location: Location,
        _neighbor: Location,
        direction: BlockFace,
    ) -> HookResult {
        self.log(format!("update {},{},{} {}", location.x, location.y, location.z, direction));
        Ok(())
    }

    fn do_physics(
        &self,
        _world: &mut dyn BlockWorld,
        _data: &BlockData,
        location: Location,
        _other: Location,
    ) -> HookResult {
        self.log(format!("physics {},{},{}", location.x, location.y, location.z));
        Ok(())
    }

    fn on_data_update(&self, _world: &mut dyn BlockWorld, data: &BlockData, _location: Location) -> HookResult {
        self.log(format!("data {data}"));
        Ok(())
    }

    fn post_break(&self, _world: &mut dyn BlockWorld, data: &BlockData, _location: Location) -> HookResult {
        self.log(format!("break {data}"));
        Ok(())
    }

    fn interact(
        &self,
        world: &mut dyn BlockWorld,
        data: &BlockData,
        location: Location,
        _entity: &EntityRef,
        _hand: Hand,
        _hit: HitResult,
    ) -> HookResult<InteractionResult> {
        let lit = data.get_bool("lit").unwrap_or(false);
        world.set_block_data(&data.with("lit", !lit)?, location, false)?;
        Ok(InteractionResult::Success)
    }

    fn redstone(&self) -> Option<&dyn Redstone> {
        Some(self)
    }
}

impl Redstone for Recorder {
    fn is_power_source(&self, data: &BlockData) -> bool {
        data.get_bool("lit").unwrap_or(false)
    }

    fn power_level(&self, data: &BlockData, _location: Location, _face: BlockFace) -> u8 {
        data.get_int("power").unwrap_or(0) as u8
    }
}

/// A block with no hooks beyond the defaults.
pub struct Plain(pub BlockInfo);

impl Plain {
    pub fn new(key: &str) -> Self {
        Plain(BlockInfo::new(key.parse().unwrap()))
    }
}

impl BlockDefinition for Plain {
    fn info(&self) -> &BlockInfo {
        &self.0
    }
    fn states(&self) -> HookResult<Vec<StateDescriptor>> {
        Ok(Vec::new())
    }
}

/// Hooks that fail in every way a block author can get wrong.
pub struct Faulty(pub BlockInfo);

impl BlockDefinition for Faulty {
    fn info(&self) -> &BlockInfo {
        &self.0
    }

    fn states(&self) -> HookResult<Vec<StateDescriptor>> {
        Ok(Vec::new())
    }

    fn tick(
        &self,
        _world: &mut dyn BlockWorld,
        _data: &BlockData,
        _location: Location,
        _random: &mut dyn RngCore,
    ) -> HookResult {
        panic!("tick exploded")
    }

    fn interact(
        &self,
        _world: &mut dyn BlockWorld,
        _data: &BlockData,
        _location: Location,
        _entity: &EntityRef,
        _hand: Hand,
        _hit: HitResult,
    ) -> HookResult<InteractionResult> {
        panic!("interact exploded")
    }

    fn is_occluding(&self, _data: &BlockData, _location: Location) -> bool {
        panic!("occlusion exploded")
    }

    fn on_data_update(&self, _world: &mut dyn BlockWorld, _data: &BlockData, _location: Location) -> HookResult {
        Err(dimblock_blocks::BlockError::hook("refusing update"))
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Furnace {
    pub burn: i32,
    pub item: String,
}

impl TileEntityState for Furnace {
    fn load(&mut self, tag: &Compound) -> Result<(), TileError> {
        self.burn = tag.require_int("burn")?;
        self.item = tag.get_string("item").unwrap_or_default().to_string();
        Ok(())
    }

    fn save(&self, tag: &mut Compound) {
        tag.put_int("burn", self.burn);
        tag.put_string("item", self.item.clone());
    }

    fn tick(&mut self) {
        self.burn += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct FurnaceBlock(pub BlockInfo);

impl FurnaceBlock {
    pub fn new() -> Self {
        FurnaceBlock(BlockInfo::new("demo:furnace".parse().unwrap()))
    }
}

impl BlockDefinition for FurnaceBlock {
    fn info(&self) -> &BlockInfo {
        &self.0
    }

    fn states(&self) -> HookResult<Vec<StateDescriptor>> {
        Ok(vec![StateDescriptor::named(
            "facing",
            &["north", "east", "south", "west"],
            "north",
        )?])
    }

    fn create_tile_entity(&self, _data: &BlockData, _location: Location) -> Option<Box<dyn TileEntityState>> {
        Some(Box::new(Furnace::default()))
    }
}

pub fn furnace_at(reg: &mut Registry<MemoryEngine>, location: Location) -> &mut Furnace {
    reg.tile_state_at_mut(location)
        .and_then(|s| s.downcast_mut::<Furnace>())
        .expect("furnace state")
}
