//! Minimal world addressing types shared by the block crates.
#![forbid(unsafe_code)]

use core::fmt;

use serde::{Deserialize, Serialize};

/// Engine-side identifier of a loaded world (dimension).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// Integer block position inside a world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub world: WorldId,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    #[inline]
    pub const fn new(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Self { world, x, y, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
            ..self
        }
    }

    /// `None` when any coordinate would leave the `i32` range.
    #[inline]
    pub fn checked_offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z.checked_add(dz)?,
            ..self
        })
    }

    /// The face-adjacent location in direction `face`.
    #[inline]
    pub fn relative(self, face: BlockFace) -> Self {
        let (dx, dy, dz) = face.offset();
        self.offset(dx, dy, dz)
    }

    #[inline]
    pub fn checked_relative(self, face: BlockFace) -> Option<Self> {
        let (dx, dy, dz) = face.offset();
        self.checked_offset(dx, dy, dz)
    }

    /// Iterates the face-adjacent neighbours in [`BlockFace::ALL`] order. Faces whose
    /// neighbour lies outside the coordinate range are skipped.
    pub fn neighbors(self) -> impl Iterator<Item = (BlockFace, Location)> {
        BlockFace::ALL
            .into_iter()
            .filter_map(move |f| self.checked_relative(f).map(|n| (f, n)))
    }

    /// Squared euclidean distance, saturating at `u64::MAX`.
    #[inline]
    pub fn distance_sq(self, other: Location) -> u64 {
        let sq = |a: i32, b: i32| u64::from(a.abs_diff(b)).pow(2);
        sq(self.x, other.x)
            .saturating_add(sq(self.y, other.y))
            .saturating_add(sq(self.z, other.z))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

impl From<(WorldId, i32, i32, i32)> for Location {
    fn from(value: (WorldId, i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2, value.3)
    }
}

/// Cube faces. Discriminants fix the visiting order used for neighbour updates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockFace {
    Up = 0,
    Down = 1,
    East = 2,
    West = 3,
    South = 4,
    North = 5,
}

impl BlockFace {
    pub const ALL: [BlockFace; 6] = [
        BlockFace::Up,
        BlockFace::Down,
        BlockFace::East,
        BlockFace::West,
        BlockFace::South,
        BlockFace::North,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            BlockFace::Up => (0, 1, 0),
            BlockFace::Down => (0, -1, 0),
            BlockFace::East => (1, 0, 0),
            BlockFace::West => (-1, 0, 0),
            BlockFace::South => (0, 0, 1),
            BlockFace::North => (0, 0, -1),
        }
    }

    #[inline]
    pub fn opposite(self) -> BlockFace {
        match self {
            BlockFace::Up => BlockFace::Down,
            BlockFace::Down => BlockFace::Up,
            BlockFace::East => BlockFace::West,
            BlockFace::West => BlockFace::East,
            BlockFace::South => BlockFace::North,
            BlockFace::North => BlockFace::South,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockFace::Up => "up",
            BlockFace::Down => "down",
            BlockFace::East => "east",
            BlockFace::West => "west",
            BlockFace::South => "south",
            BlockFace::North => "north",
        }
    }
}

impl fmt::Display for BlockFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_order_matches_discriminants() {
        for (i, f) in BlockFace::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn neighbors_are_adjacent_and_ordered() {
        let origin = Location::new(WorldId(2), 10, 64, -3);
        let got: Vec<_> = origin.neighbors().collect();
        assert_eq!(got.len(), 6);
        assert_eq!(got[0], (BlockFace::Up, Location::new(WorldId(2), 10, 65, -3)));
        assert_eq!(got[5], (BlockFace::North, Location::new(WorldId(2), 10, 64, -4)));
        for (_, n) in got {
            assert_eq!(origin.distance_sq(n), 1);
            assert_eq!(n.world, origin.world);
        }
    }

    #[test]
    fn neighbors_skip_faces_past_the_coordinate_edge() {
        let edge = Location::new(WorldId(0), i32::MAX, 0, i32::MIN);
        let faces: Vec<BlockFace> = edge.neighbors().map(|(f, _)| f).collect();
        assert_eq!(faces, vec![BlockFace::Up, BlockFace::Down, BlockFace::West, BlockFace::South]);
        assert_eq!(edge.checked_relative(BlockFace::East), None);
        let far = Location::new(WorldId(0), i32::MIN, 0, i32::MAX);
        assert_eq!(edge.distance_sq(far), u64::MAX);
    }

    #[test]
    fn display_includes_world() {
        let loc = Location::new(WorldId(1), 1, 2, 3);
        assert_eq!(loc.to_string(), "world#1(1, 2, 3)");
    }
}
