use std::collections::HashMap as StdHashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use dimblock_blocks::{BlockData, BlockDefinition, BlockError, BlockKey, BlockWorld, StateSchema};
use dimblock_geom::Location;
use dimblock_tile::{BridgeMap, Compound, TileEntityBridge, TileEntityState, TileStore, put_location};
use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::guard;
use crate::{DeferredTickScheduler, EngineAdapter, RegistryConfig};

struct Entry {
    definition: Arc<dyn BlockDefinition>,
    schema: Arc<StateSchema>,
}

/// Counters for one [`Registry::run_tick`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub fired: usize,
    pub dropped: usize,
    pub tiles_ticked: usize,
}

/// Owns the block definitions and mediates every block mutation against one engine.
pub struct Registry<E: EngineAdapter> {
    engine: E,
    config: RegistryConfig,
    entries: HashMap<BlockKey, Entry>,
    order: Vec<BlockKey>,
    scheduler: DeferredTickScheduler,
    tiles: TileStore,
    bridges: BridgeMap,
    rng: StdRng,
    depth: u32,
}

impl<E: EngineAdapter> Registry<E> {
    pub fn new(engine: E, config: RegistryConfig) -> Self {
        log::info!(target: "registry", "registry on engine {} (seed {})", engine.version(), config.seed);
        Self {
            engine,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            entries: HashMap::new(),
            order: Vec::new(),
            scheduler: DeferredTickScheduler::new(),
            tiles: TileStore::new(),
            bridges: BridgeMap::new(),
            depth: 0,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &DeferredTickScheduler {
        &self.scheduler
    }

    pub fn tiles(&self) -> &TileStore {
        &self.tiles
    }

    // --- Registration ---

    pub fn register<D: BlockDefinition + 'static>(
        &mut self,
        definition: D,
    ) -> Result<Arc<dyn BlockDefinition>, BlockError> {
        let definition: Arc<dyn BlockDefinition> = Arc::new(definition);
        self.register_arc(Arc::clone(&definition))?;
        Ok(definition)
    }

    pub fn register_arc(&mut self, definition: Arc<dyn BlockDefinition>) -> Result<(), BlockError> {
        let key = definition.key().clone();
        if self.entries.contains_key(&key) {
            log::warn!(target: "registry", "{} registered twice; keeping the first", key);
            return Err(BlockError::DuplicateKey(key));
        }
        let states = guard::call(&key, None, "states", || definition.states()).map_err(|e| {
            BlockError::Registration {
                key: key.clone(),
                reason: e.to_string(),
            }
        })?;
        let schema = StateSchema::new(key.clone(), states)?;
        log::debug!(
            target: "registry",
            "{}: {} states in {} bits",
            key,
            schema.state_count(),
            schema.total_bits()
        );
        self.entries.insert(
            key.clone(),
            Entry {
                definition: Arc::clone(&definition),
                schema,
            },
        );
        self.order.push(key.clone());

        let hooked = guard::call(&key, None, "on_register", || definition.on_register(&*self));
        if let Err(e) = hooked {
            self.entries.remove(&key);
            self.order.retain(|k| k != &key);
            return Err(BlockError::Registration {
                key,
                reason: e.to_string(),
            });
        }
        log::info!(target: "registry", "registered {}", key);
        Ok(())
    }

    pub fn definition_for(&self, key: &BlockKey) -> Option<Arc<dyn BlockDefinition>> {
        self.entries.get(key).map(|e| Arc::clone(&e.definition))
    }

    pub fn schema_for(&self, key: &BlockKey) -> Option<&Arc<StateSchema>> {
        self.entries.get(key).map(|e| &e.schema)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &BlockKey> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Default data of `definition`; absent unless that very instance is registered.
    pub fn default_block_data_for(&self, definition: &dyn BlockDefinition) -> Option<BlockData> {
        let entry = self.entries.get(definition.key())?;
        std::ptr::addr_eq(Arc::as_ptr(&entry.definition), definition)
            .then(|| entry.schema.default_data())
    }

    pub fn block_data_from(
        &self,
        key: &BlockKey,
        properties: &StdHashMap<String, String>,
    ) -> Result<BlockData, BlockError> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| BlockError::Unregistered(key.clone()))?;
        entry.schema.data_from_props(properties)
    }

    // --- World access ---

    pub fn block_data_at(&self, location: Location) -> Option<BlockData> {
        self.occupant(location).map(|(_, data)| data)
    }

    /// Managed definition and data at `location`.
    pub(crate) fn occupant(&self, location: Location) -> Option<(Arc<dyn BlockDefinition>, BlockData)> {
        let native = self.engine.native_block_at(location)?;
        let entry = self.entries.get(&native.key)?;
        match entry.schema.unpack(native.state) {
            Ok(data) => Some((Arc::clone(&entry.definition), data)),
            Err(e) => {
                log::warn!(target: "registry", "undecodable block at {}: {}", location, e);
                None
            }
        }
    }

    fn enter(&mut self, what: &str, location: Location) -> bool {
        if self.depth >= self.config.max_physics_depth {
            log::warn!(
                target: "registry",
                "{} at {} exceeds nesting depth {}; cascade stopped",
                what,
                location,
                self.config.max_physics_depth
            );
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn set_block_data(
        &mut self,
        data: &BlockData,
        location: Location,
        apply_physics: bool,
    ) -> Result<(), BlockError> {
        if !self.engine.is_valid_location(location) {
            return Err(BlockError::InvalidLocation(location));
        }
        let key = data.key().clone();
        let (definition, schema) = match self.entries.get(&key) {
            Some(e) => (Arc::clone(&e.definition), Arc::clone(&e.schema)),
            None => return Err(BlockError::Unregistered(key)),
        };
        let Some(data) = data.rebased(&schema) else {
            return Err(BlockError::IllegalStateTransition {
                key,
                reason: format!("{data} does not match the registered states"),
            });
        };
        let data = &data;
        if !self.enter("block update", location) {
            return Err(BlockError::hook(format!("update of {key} at {location} nested too deep")));
        }

        let fallback = definition.info().client_block.clone();
        let client = guard::value(&key, location, "client_view", fallback, || {
            definition.client_view(data)
        });
        let native = self.engine.native_shape_for(data, client);
        let previous = self.engine.occupant_key(location);
        self.engine.set_native_block_at(location, Some(native));
        log::debug!(target: "registry", "set {} at {}", data, location);

        if previous.as_ref() != Some(&key) {
            self.release_tile(location);
        }
        if self.tiles.handle_at(location).is_none() {
            let created = guard::value(&key, location, "create_tile_entity", None, || {
                definition.create_tile_entity(data, location)
            });
            if let Some(state) = created {
                self.bind_tile(&key, location, state);
            }
        }

        guard::or(&key, location, "on_data_update", (), || {
            definition.on_data_update(self, data, location)
        });
        if apply_physics {
            self.apply_physics(&key, location);
        }
        self.depth -= 1;
        Ok(())
    }

    pub fn remove_block(&mut self, location: Location, apply_physics: bool) -> Result<(), BlockError> {
        if !self.engine.is_valid_location(location) {
            return Err(BlockError::InvalidLocation(location));
        }
        let removed = self.occupant(location);
        self.engine.set_native_block_at(location, None);
        self.release_tile(location);
        let Some((definition, data)) = removed else {
            return Ok(());
        };
        log::debug!(target: "registry", "removed {} at {}", data, location);
        guard::or(definition.key(), location, "post_break", (), || {
            definition.post_break(self, &data, location)
        });
        if apply_physics {
            self.apply_physics(definition.key(), location);
        }
        Ok(())
    }

    /// Physics for the block at `location`, then update + physics for each managed
    /// neighbour in face order.
    pub fn apply_physics(&mut self, key: &BlockKey, location: Location) {
        if !self.enter("physics", location) {
            return;
        }
        log::trace!(target: "registry", "physics from {} at {}", key, location);
        if let Some((definition, data)) = self.occupant(location) {
            guard::or(definition.key(), location, "do_physics", (), || {
                definition.do_physics(self, &data, location, location)
            });
        }
        for (face, neighbor) in location.neighbors() {
            let Some((definition, data)) = self.occupant(neighbor) else {
                continue;
            };
            let direction = face.opposite();
            guard::or(definition.key(), neighbor, "update_state", (), || {
                definition.update_state(self, &data, neighbor, location, direction)
            });
            let Some((definition, data)) = self.occupant(neighbor) else {
                continue;
            };
            guard::or(definition.key(), neighbor, "do_physics", (), || {
                definition.do_physics(self, &data, neighbor, location)
            });
        }
        self.depth -= 1;
    }

    // --- Scheduling ---

    pub fn tick_later(&mut self, location: Location, key: &BlockKey, delay: u64) -> u64 {
        self.scheduler.schedule(location, key.clone(), delay)
    }

    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// One engine tick: due block ticks first, then every live tile entity once.
    pub fn run_tick(&mut self) -> TickReport {
        self.scheduler.advance_tick();
        let mut report = TickReport {
            tick: self.scheduler.now(),
            ..TickReport::default()
        };
        let mut rng = StdRng::seed_from_u64(self.rng.next_u64());
        while let Some(req) = self.scheduler.pop_due() {
            let occupant = self
                .occupant(req.location)
                .filter(|(d, _)| d.key() == &req.key);
            let Some((definition, data)) = occupant else {
                log::trace!(
                    target: "scheduler",
                    "[tick {}] dropped #{} {} at {}: occupant changed",
                    report.tick,
                    req.id,
                    req.key,
                    req.location
                );
                report.dropped += 1;
                continue;
            };
            log::trace!(target: "scheduler", "[tick {}] firing #{} {} at {}", report.tick, req.id, req.key, req.location);
            guard::or(&req.key, req.location, "tick", (), || {
                definition.tick(self, &data, req.location, &mut rng)
            });
            report.fired += 1;
        }
        if self.config.tick_tile_entities {
            report.tiles_ticked = self.tick_tiles();
        }
        report
    }

    fn tick_tiles(&mut self) -> usize {
        let mut n = 0;
        for handle in self.bridges.handles() {
            let Some(bridge) = self.bridges.lookup(handle, &self.tiles) else {
                continue;
            };
            let tiles = &mut self.tiles;
            if catch_unwind(AssertUnwindSafe(|| bridge.tick(tiles))).is_err() {
                log::error!(target: "hooks", "tile entity tick at {} panicked", bridge.location());
            }
            n += 1;
        }
        n
    }

    // --- Tile entities ---

    fn bind_tile(&mut self, key: &BlockKey, location: Location, state: Box<dyn TileEntityState>) {
        let handle = self.tiles.insert(location, state);
        let native_id = self.engine.tile_entity_type(key);
        log::debug!(target: "tiles", "bound {} at {}", native_id, location);
        self.bridges.bind(handle, native_id, location);
    }

    fn release_tile(&mut self, location: Location) {
        if let Some((handle, _)) = self.tiles.remove_at(location) {
            self.bridges.detach(handle);
            log::debug!(target: "tiles", "released tile entity at {}", location);
        }
    }

    pub fn tile_state_at(&self, location: Location) -> Option<&(dyn TileEntityState + 'static)> {
        self.tiles.handle_at(location).and_then(|h| self.tiles.get(h))
    }

    pub fn tile_state_at_mut(&mut self, location: Location) -> Option<&mut (dyn TileEntityState + 'static)> {
        self.tiles.get_at_mut(location)
    }

    pub fn bridge_at(&mut self, location: Location) -> Option<&mut TileEntityBridge> {
        let handle = self.tiles.handle_at(location)?;
        self.bridges.lookup(handle, &self.tiles)
    }

    pub fn live_bridges(&self) -> usize {
        self.bridges.len()
    }

    /// Persisted form of the tile entity at `location`.
    pub fn save_tile_entity(&mut self, location: Location) -> Option<Compound> {
        let handle = self.tiles.handle_at(location)?;
        let bridge = self.bridges.lookup(handle, &self.tiles)?;
        let tiles = &self.tiles;
        match catch_unwind(AssertUnwindSafe(|| bridge.save(tiles, Compound::new()))) {
            Ok(tag) => Some(tag),
            Err(_) => {
                log::error!(target: "hooks", "tile entity save at {} panicked", location);
                None
            }
        }
    }

    /// Saves, serializes through the engine and releases the tile entity at `location`.
    pub fn unload_tile_entity(&mut self, location: Location) -> Result<Option<Vec<u8>>, BlockError> {
        let Some(tag) = self.save_tile_entity(location) else {
            return Ok(None);
        };
        let bytes = self.engine.serialize_compound(&tag)?;
        self.release_tile(location);
        Ok(Some(bytes))
    }

    /// Recreates the tile entity of the managed block at `location` from `bytes`.
    /// Returns false when the occupant carries no tile entity.
    pub fn load_tile_entity(&mut self, location: Location, bytes: &[u8]) -> Result<bool, BlockError> {
        if !self.engine.is_valid_location(location) {
            return Err(BlockError::InvalidLocation(location));
        }
        let mut tag = self.engine.deserialize_compound(bytes)?;
        put_location(&mut tag, location);
        let Some((definition, data)) = self.occupant(location) else {
            return Ok(false);
        };
        let created = guard::value(definition.key(), location, "create_tile_entity", None, || {
            definition.create_tile_entity(&data, location)
        });
        let Some(state) = created else {
            return Ok(false);
        };
        self.release_tile(location);
        let handle = self.tiles.insert(location, state);
        let native_id = self.engine.tile_entity_type(definition.key());
        let (bridge, _) = self.bridges.bind(handle, native_id, location);
        if let Err(e) = bridge.load(&mut self.tiles, &tag) {
            log::warn!(target: "tiles", "loading tile entity at {} failed: {}", location, e);
            self.release_tile(location);
            return Err(e.into());
        }
        Ok(true)
    }

    /// Swaps in a new engine adapter, carrying every live tile entity across through a
    /// snapshot. Returns the old adapter and how many tile entities were restored.
    pub fn reload_engine(&mut self, engine: E) -> (E, usize) {
        let mut snapshots: Vec<(Location, Compound)> = Vec::new();
        for handle in self.bridges.handles() {
            let Some(location) = self.tiles.location_of(handle) else {
                continue;
            };
            if let Some(bridge) = self.bridges.lookup(handle, &self.tiles) {
                bridge.capture_snapshot(&self.tiles);
                if let Some(snapshot) = bridge.take_snapshot() {
                    snapshots.push((location, snapshot));
                }
            }
        }
        self.bridges.drain();
        self.tiles.clear();
        let old = std::mem::replace(&mut self.engine, engine);
        log::info!(
            target: "registry",
            "reloading engine {} -> {} with {} tile snapshots",
            old.version(),
            self.engine.version(),
            snapshots.len()
        );

        let mut restored = 0;
        for (location, mut snapshot) in snapshots {
            let Some((definition, data)) = self.occupant(location) else {
                log::debug!(target: "tiles", "no managed block at {} after reload", location);
                continue;
            };
            let created = guard::value(definition.key(), location, "create_tile_entity", None, || {
                definition.create_tile_entity(&data, location)
            });
            let Some(state) = created else {
                continue;
            };
            let handle = self.tiles.insert(location, state);
            let native_id = self.engine.tile_entity_type(definition.key());
            snapshot.put_string("id", native_id.clone());
            put_location(&mut snapshot, location);
            let (bridge, _) = self.bridges.bind(handle, native_id, location);
            match bridge.load(&mut self.tiles, &snapshot) {
                Ok(()) => restored += 1,
                Err(e) => {
                    log::warn!(target: "tiles", "restoring tile entity at {} failed: {}", location, e);
                    self.release_tile(location);
                }
            }
        }
        (old, restored)
    }

    /// Drops definitions, pending ticks and every tile entity.
    pub fn shutdown(&mut self) {
        let bridges = self.bridges.drain().len();
        self.tiles.clear();
        self.scheduler.clear();
        self.entries.clear();
        self.order.clear();
        log::info!(target: "registry", "shut down; released {} tile entities", bridges);
    }
}

impl<E: EngineAdapter> BlockWorld for Registry<E> {
    fn definition_for(&self, key: &BlockKey) -> Option<Arc<dyn BlockDefinition>> {
        Registry::definition_for(self, key)
    }

    fn default_block_data_for(&self, definition: &dyn BlockDefinition) -> Option<BlockData> {
        Registry::default_block_data_for(self, definition)
    }

    fn block_data_at(&self, location: Location) -> Option<BlockData> {
        Registry::block_data_at(self, location)
    }

    fn set_block_data(
        &mut self,
        data: &BlockData,
        location: Location,
        apply_physics: bool,
    ) -> Result<(), BlockError> {
        Registry::set_block_data(self, data, location, apply_physics)
    }

    fn remove_block(&mut self, location: Location, apply_physics: bool) -> Result<(), BlockError> {
        Registry::remove_block(self, location, apply_physics)
    }

    fn apply_physics(&mut self, key: &BlockKey, location: Location) {
        Registry::apply_physics(self, key, location)
    }

    fn tick_later(&mut self, location: Location, key: &BlockKey, delay: u64) -> u64 {
        Registry::tick_later(self, location, key, delay)
    }

    fn tile_entity_at(&mut self, location: Location) -> Option<&mut (dyn TileEntityState + 'static)> {
        self.tiles.get_at_mut(location)
    }
}
