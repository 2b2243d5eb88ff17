use dimblock_geom::{Location, WorldId};
use hashbrown::HashMap;

use crate::{Compound, TileError, TileHandle, TileStore};

/// Key under which the abstract state's own fields are nested in the persisted form.
pub const STATE_TAG: &str = "state";

/// Writes the native position fields read back by [`TileEntityBridge::load`].
pub fn put_location(tag: &mut Compound, location: Location) {
    tag.put_long("world", i64::from(location.world.0));
    tag.put_int("x", location.x);
    tag.put_int("y", location.y);
    tag.put_int("z", location.z);
}

/// Engine-side adapter object for one tile entity state.
///
/// Holds the state's handle, never the state itself; every forwarding call resolves the
/// handle against the [`TileStore`] and becomes a no-op once the state is gone.
#[derive(Debug)]
pub struct TileEntityBridge {
    handle: TileHandle,
    native_id: String,
    location: Location,
    snapshot: Option<Compound>,
}

impl TileEntityBridge {
    fn new(handle: TileHandle, native_id: impl Into<String>, location: Location) -> Self {
        Self {
            handle,
            native_id: native_id.into(),
            location,
            snapshot: None,
        }
    }

    #[inline]
    pub fn handle(&self) -> TileHandle {
        self.handle
    }

    /// Native block entity type id this bridge was created for.
    pub fn native_id(&self) -> &str {
        &self.native_id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Reads native fields, then hands the nested state compound to the state.
    pub fn load(&mut self, store: &mut TileStore, tag: &Compound) -> Result<(), TileError> {
        if let Some(id) = tag.get_string("id") {
            self.native_id = id.to_string();
        }
        if tag.contains("x") {
            let world = match tag.get_long("world") {
                Some(w) => WorldId(u32::try_from(w).map_err(|_| TileError::WrongType {
                    field: "world".into(),
                    expected: "world id",
                    found: "out of range long",
                })?),
                None => self.location.world,
            };
            self.location = Location::new(
                world,
                tag.require_int("x")?,
                tag.require_int("y")?,
                tag.require_int("z")?,
            );
        }
        let state = store
            .get_mut(self.handle)
            .ok_or(TileError::Released(self.handle))?;
        let empty = Compound::new();
        state.load(tag.get_compound(STATE_TAG).unwrap_or(&empty))
    }

    /// Writes native fields and the state's own save into `tag`, returning the combined form.
    pub fn save(&self, store: &TileStore, mut tag: Compound) -> Compound {
        tag.put_string("id", self.native_id.clone());
        put_location(&mut tag, self.location);
        if let Some(state) = store.get(self.handle) {
            let mut nested = Compound::new();
            state.save(&mut nested);
            tag.put_compound(STATE_TAG, nested);
        }
        tag
    }

    pub fn tick(&self, store: &mut TileStore) {
        if let Some(state) = store.get_mut(self.handle) {
            state.tick();
        }
    }

    /// Keeps a full save aside so an abrupt adapter teardown does not lose unsaved state.
    pub fn capture_snapshot(&mut self, store: &TileStore) {
        self.snapshot = Some(self.save(store, Compound::new()));
    }

    pub fn last_snapshot(&self) -> Option<&Compound> {
        self.snapshot.as_ref()
    }

    pub fn take_snapshot(&mut self) -> Option<Compound> {
        self.snapshot.take()
    }
}

/// Identity map from tile entity state to its single live bridge.
///
/// Entries whose state has been released are treated as already removed and are pruned
/// the next time they are looked up.
#[derive(Debug, Default)]
pub struct BridgeMap {
    live: HashMap<TileHandle, TileEntityBridge>,
}

impl BridgeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Creates the bridge for `handle` and registers it. A bridge previously bound to the
    /// same state is detached and returned.
    pub fn bind(
        &mut self,
        handle: TileHandle,
        native_id: impl Into<String>,
        location: Location,
    ) -> (&mut TileEntityBridge, Option<TileEntityBridge>) {
        let previous = self.live.remove(&handle);
        if previous.is_some() {
            log::debug!(target: "tiles", "rebinding tile entity at {}", location);
        }
        let bridge = self
            .live
            .entry(handle)
            .or_insert_with(|| TileEntityBridge::new(handle, native_id, location));
        (bridge, previous)
    }

    pub fn lookup(&mut self, handle: TileHandle, store: &TileStore) -> Option<&mut TileEntityBridge> {
        if !store.contains(handle) {
            if self.live.remove(&handle).is_some() {
                log::trace!(target: "tiles", "pruned bridge of released state {:?}", handle);
            }
            return None;
        }
        self.live.get_mut(&handle)
    }

    pub fn detach(&mut self, handle: TileHandle) -> Option<TileEntityBridge> {
        self.live.remove(&handle)
    }

    /// Drops every entry whose state is gone; returns how many were pruned.
    pub fn reclaim(&mut self, store: &TileStore) -> usize {
        let before = self.live.len();
        self.live.retain(|h, _| store.contains(*h));
        before - self.live.len()
    }

    /// Bound handles in location order.
    pub fn handles(&self) -> Vec<TileHandle> {
        let mut v: Vec<(Location, TileHandle)> =
            self.live.values().map(|b| (b.location, b.handle)).collect();
        v.sort();
        v.into_iter().map(|(_, h)| h).collect()
    }

    /// Detaches every bridge at once, as an adapter teardown does.
    pub fn drain(&mut self) -> Vec<TileEntityBridge> {
        let mut v: Vec<TileEntityBridge> = self.live.drain().map(|(_, b)| b).collect();
        v.sort_by_key(|b| b.location);
        v
    }
}
