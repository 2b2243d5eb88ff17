use std::any::Any;

use dimblock_geom::Location;
use hashbrown::HashMap;

use crate::{Compound, TileError};

/// Abstract persisted, tickable state attached to one location.
pub trait TileEntityState: Any {
    /// Restore from what an earlier [`TileEntityState::save`] produced.
    fn load(&mut self, tag: &Compound) -> Result<(), TileError>;

    fn save(&self, tag: &mut Compound);

    /// Driven by the bridge, at most once per engine tick.
    fn tick(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn TileEntityState {
    pub fn downcast_ref<T: TileEntityState>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: TileEntityState>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Stable identity of a tile entity state: slot index plus generation.
///
/// A handle outlives its state; once the slot is released the generation moves on and
/// every old handle resolves to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileHandle {
    index: u32,
    generation: u32,
}

impl TileHandle {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

struct TileEntry {
    location: Location,
    state: Box<dyn TileEntityState>,
}

struct Slot {
    generation: u32,
    entry: Option<TileEntry>,
}

/// Arena owning every live tile entity state, indexed by handle and by location.
#[derive(Default)]
pub struct TileStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_location: HashMap<Location, TileHandle>,
}

impl TileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_location.is_empty()
    }

    /// Stores `state` at `location`, releasing whatever state was there before.
    pub fn insert(&mut self, location: Location, state: Box<dyn TileEntityState>) -> TileHandle {
        self.remove_at(location);
        let entry = TileEntry { location, state };
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                TileHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 1,
                    entry: Some(entry),
                });
                TileHandle {
                    index,
                    generation: 1,
                }
            }
        };
        self.by_location.insert(location, handle);
        handle
    }

    pub fn remove_at(&mut self, location: Location) -> Option<(TileHandle, Box<dyn TileEntityState>)> {
        let handle = self.by_location.remove(&location)?;
        self.release(handle).map(|state| (handle, state))
    }

    pub fn remove(&mut self, handle: TileHandle) -> Option<Box<dyn TileEntityState>> {
        let location = self.location_of(handle)?;
        self.by_location.remove(&location);
        self.release(handle)
    }

    fn release(&mut self, handle: TileHandle) -> Option<Box<dyn TileEntityState>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(handle.index);
        Some(entry.state)
    }

    fn entry(&self, handle: TileHandle) -> Option<&TileEntry> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    #[inline]
    pub fn contains(&self, handle: TileHandle) -> bool {
        self.entry(handle).is_some()
    }

    pub fn handle_at(&self, location: Location) -> Option<TileHandle> {
        self.by_location.get(&location).copied()
    }

    pub fn location_of(&self, handle: TileHandle) -> Option<Location> {
        self.entry(handle).map(|e| e.location)
    }

    pub fn get(&self, handle: TileHandle) -> Option<&(dyn TileEntityState + 'static)> {
        self.entry(handle).map(|e| e.state.as_ref())
    }

    pub fn get_mut(&mut self, handle: TileHandle) -> Option<&mut (dyn TileEntityState + 'static)> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_mut().map(|e| e.state.as_mut())
    }

    pub fn get_at_mut(&mut self, location: Location) -> Option<&mut (dyn TileEntityState + 'static)> {
        let handle = self.handle_at(location)?;
        self.get_mut(handle)
    }

    /// Live handles in location order, so callers visit tile entities deterministically.
    pub fn handles(&self) -> Vec<TileHandle> {
        let mut v: Vec<(Location, TileHandle)> =
            self.by_location.iter().map(|(l, h)| (*l, *h)).collect();
        v.sort_by_key(|(l, _)| *l);
        v.into_iter().map(|(_, h)| h).collect()
    }

    pub fn clear(&mut self) {
        for handle in self.handles() {
            self.remove(handle);
        }
    }
}
