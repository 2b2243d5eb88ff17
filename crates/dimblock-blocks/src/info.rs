use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BlockData, BlockError, BlockKey};

/// Vanilla-style block state the client is shown in place of a custom block,
/// e.g. `minecraft:furnace[facing=north,lit=true]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClientBlock {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl ClientBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, prop: impl Into<String>, value: impl ToString) -> Self {
        self.properties.insert(prop.into(), value.to_string());
        self
    }

    /// Copies every property of `data` onto this client block.
    pub fn with_data(mut self, data: &BlockData) -> Self {
        self.properties.extend(data.properties());
        self
    }
}

impl Default for ClientBlock {
    fn default() -> Self {
        ClientBlock::new("minecraft:stone")
    }
}

impl fmt::Display for ClientBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.properties.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, (k, v)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("]")
    }
}

impl FromStr for ClientBlock {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || BlockError::InvalidKey(s.to_string());
        let (name, props) = match s.split_once('[') {
            Some((name, rest)) => (name, Some(rest.strip_suffix(']').ok_or_else(bad)?)),
            None => (s, None),
        };
        if name.is_empty() || !name.contains(':') {
            return Err(bad());
        }
        let mut out = ClientBlock::new(name);
        for pair in props.into_iter().flat_map(|p| p.split(',')).filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').ok_or_else(bad)?;
            out.properties.insert(k.trim().to_string(), v.trim().to_string());
        }
        Ok(out)
    }
}

impl Serialize for ClientBlock {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClientBlock {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const GREY: Rgb = Rgb::new(112, 112, 112);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(v: [u8; 3]) -> Self {
        Rgb::new(v[0], v[1], v[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PistonReaction {
    #[default]
    Normal,
    Destroy,
    Block,
    Ignore,
    PushOnly,
}

/// Static attributes of a block definition.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockInfo {
    pub key: BlockKey,
    pub client_block: ClientBlock,
    pub explosion_resistance: f32,
    pub map_color: Rgb,
    pub occluding: bool,
    pub destroyable_by_fluid: bool,
    pub causes_suffocation: bool,
    pub piston_reaction: PistonReaction,
}

impl BlockInfo {
    pub fn new(key: BlockKey) -> Self {
        Self {
            key,
            client_block: ClientBlock::default(),
            explosion_resistance: 6.0,
            map_color: Rgb::GREY,
            occluding: true,
            destroyable_by_fluid: false,
            causes_suffocation: true,
            piston_reaction: PistonReaction::Normal,
        }
    }

    pub fn with_client_block(mut self, client: ClientBlock) -> Self {
        self.client_block = client;
        self
    }

    pub fn with_explosion_resistance(mut self, v: f32) -> Self {
        self.explosion_resistance = v;
        self
    }

    pub fn with_map_color(mut self, c: Rgb) -> Self {
        self.map_color = c;
        self
    }

    pub fn with_occluding(mut self, v: bool) -> Self {
        self.occluding = v;
        self
    }

    pub fn with_piston_reaction(mut self, v: PistonReaction) -> Self {
        self.piston_reaction = v;
        self
    }
}
