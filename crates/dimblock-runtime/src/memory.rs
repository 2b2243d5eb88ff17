use dimblock_blocks::BlockError;
use dimblock_geom::{Location, WorldId};
use dimblock_tile::Compound;
use hashbrown::HashMap;
use serde::Deserialize;

use crate::{EngineAdapter, NativeBlock};

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryEngineConfig {
    /// Number of worlds; valid ids are `0..worlds`.
    pub worlds: u32,
    pub min_y: i32,
    /// Inclusive.
    pub max_y: i32,
    pub chunk_size: i32,
}

impl Default for MemoryEngineConfig {
    fn default() -> Self {
        Self {
            worlds: 1,
            min_y: -64,
            max_y: 319,
            chunk_size: 16,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEngineStats {
    pub chunk_entries: usize,
    pub blocks: usize,
    pub rev_entries: usize,
}

type ChunkKey = (WorldId, i32, i32, i32);

/// In-memory reference engine: chunk-bucketed native blocks with per-chunk revisions.
#[derive(Clone)]
pub struct MemoryEngine {
    config: MemoryEngineConfig,
    version: String,
    inner: HashMap<ChunkKey, HashMap<Location, NativeBlock>>,
    rev: HashMap<ChunkKey, u64>,
    counter: u64,
}

impl MemoryEngine {
    pub fn new(config: MemoryEngineConfig) -> Self {
        Self::with_version(config, "memory-1")
    }

    /// Engine with a custom revision label, e.g. to model an engine upgrade on reload.
    pub fn with_version(config: MemoryEngineConfig, version: impl Into<String>) -> Self {
        let size = config.chunk_size.max(1);
        Self {
            config: MemoryEngineConfig {
                chunk_size: size,
                ..config
            },
            version: version.into(),
            inner: HashMap::new(),
            rev: HashMap::new(),
            counter: 0,
        }
    }

    /// Same world under another revision label.
    pub fn relabeled(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn config(&self) -> &MemoryEngineConfig {
        &self.config
    }

    pub fn stats(&self) -> MemoryEngineStats {
        MemoryEngineStats {
            chunk_entries: self.inner.len(),
            blocks: self.inner.values().map(|m| m.len()).sum(),
            rev_entries: self.rev.len(),
        }
    }

    #[inline]
    fn chunk_key(&self, at: Location) -> ChunkKey {
        let s = self.config.chunk_size;
        (
            at.world,
            at.x.div_euclid(s),
            at.y.div_euclid(s),
            at.z.div_euclid(s),
        )
    }

    /// Latest change stamp of the chunk containing `at`; 0 if never touched.
    pub fn chunk_rev(&self, at: Location) -> u64 {
        self.rev.get(&self.chunk_key(at)).copied().unwrap_or(0)
    }

    /// Chunks changed after `stamp`, sorted.
    pub fn changed_since(&self, stamp: u64) -> Vec<ChunkKey> {
        let mut v: Vec<ChunkKey> = self
            .rev
            .iter()
            .filter(|(_, r)| **r > stamp)
            .map(|(k, _)| *k)
            .collect();
        v.sort();
        v
    }

    /// Current change counter.
    pub fn stamp(&self) -> u64 {
        self.counter
    }

    /// Every stored block of the chunk containing `at`, in location order.
    pub fn snapshot_for_chunk(&self, at: Location) -> Vec<(Location, NativeBlock)> {
        let mut out: Vec<(Location, NativeBlock)> = self
            .inner
            .get(&self.chunk_key(at))
            .map(|m| m.iter().map(|(k, v)| (*k, v.clone())).collect())
            .unwrap_or_default();
        out.sort_by_key(|(k, _)| *k);
        out
    }

    fn bump(&mut self, k: ChunkKey) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        self.rev.insert(k, self.counter);
        self.counter
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(MemoryEngineConfig::default())
    }
}

impl EngineAdapter for MemoryEngine {
    fn version(&self) -> &str {
        &self.version
    }

    fn is_valid_location(&self, location: Location) -> bool {
        location.world.0 < self.config.worlds
            && (self.config.min_y..=self.config.max_y).contains(&location.y)
    }

    fn set_native_block_at(&mut self, location: Location, block: Option<NativeBlock>) {
        let k = self.chunk_key(location);
        match block {
            Some(b) => {
                self.inner.entry(k).or_default().insert(location, b);
            }
            None => {
                let Some(m) = self.inner.get_mut(&k) else {
                    return;
                };
                if m.remove(&location).is_none() {
                    return;
                }
                if m.is_empty() {
                    self.inner.remove(&k);
                }
            }
        }
        self.bump(k);
    }

    fn native_block_at(&self, location: Location) -> Option<&NativeBlock> {
        self.inner
            .get(&self.chunk_key(location))
            .and_then(|m| m.get(&location))
    }

    fn serialize_compound(&self, tag: &Compound) -> Result<Vec<u8>, BlockError> {
        Ok(tag.to_json_bytes()?)
    }

    fn deserialize_compound(&self, bytes: &[u8]) -> Result<Compound, BlockError> {
        Ok(Compound::from_json_bytes(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimblock_blocks::ClientBlock;

    fn block(state: u32) -> NativeBlock {
        NativeBlock {
            key: "demo:lamp".parse().unwrap(),
            state,
            client: ClientBlock::default(),
        }
    }

    #[test]
    fn bounds_follow_config() {
        let e = MemoryEngine::default();
        assert!(e.is_valid_location(Location::new(WorldId(0), 5, -64, 5)));
        assert!(e.is_valid_location(Location::new(WorldId(0), 5, 319, 5)));
        assert!(!e.is_valid_location(Location::new(WorldId(0), 5, 320, 5)));
        assert!(!e.is_valid_location(Location::new(WorldId(1), 0, 0, 0)));
    }

    #[test]
    fn writes_bump_chunk_revisions() {
        let mut e = MemoryEngine::default();
        let a = Location::new(WorldId(0), -1, 0, 0);
        let b = Location::new(WorldId(0), 0, 0, 0);
        e.set_native_block_at(a, Some(block(1)));
        let after_a = e.stamp();
        e.set_native_block_at(b, Some(block(2)));
        assert_ne!(e.chunk_rev(a), e.chunk_rev(b));
        assert_eq!(e.changed_since(after_a), vec![(WorldId(0), 0, 0, 0)]);
        assert_eq!(e.native_block_at(b).map(|n| n.state), Some(2));
        assert_eq!(e.stats().chunk_entries, 2);
        let c = Location::new(WorldId(0), 15, 15, 15);
        e.set_native_block_at(c, Some(block(3)));
        let states: Vec<u32> = e.snapshot_for_chunk(b).into_iter().map(|(_, n)| n.state).collect();
        assert_eq!(states, vec![2, 3]);

        e.set_native_block_at(a, None);
        assert!(e.native_block_at(a).is_none());
        assert_eq!(e.stats().blocks, 2);

        let stamp = e.stamp();
        e.set_native_block_at(a, None);
        assert_eq!(e.stamp(), stamp);
    }

    #[test]
    fn compound_codec_roundtrip() {
        let e = MemoryEngine::default();
        let mut tag = Compound::new();
        tag.put_int("burn", 20);
        let bytes = e.serialize_compound(&tag).unwrap();
        assert_eq!(e.deserialize_compound(&bytes).unwrap(), tag);
        assert!(e.deserialize_compound(b"not json").is_err());
    }
}
