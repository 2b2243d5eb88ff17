use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TileError;

/// One typed value inside a [`Compound`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Tag>),
    Compound(Compound),
}

impl Tag {
    pub fn type_name(&self) -> &'static str {
        match self {
            Tag::Byte(_) => "byte",
            Tag::Short(_) => "short",
            Tag::Int(_) => "int",
            Tag::Long(_) => "long",
            Tag::Float(_) => "float",
            Tag::Double(_) => "double",
            Tag::String(_) => "string",
            Tag::Bytes(_) => "bytes",
            Tag::List(_) => "list",
            Tag::Compound(_) => "compound",
        }
    }
}

/// Generic key -> typed value tree used as the persisted form of tile entities.
///
/// Keys iterate in sorted order so two saves of equal content serialize identically.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Compound {
    entries: BTreeMap<String, Tag>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.entries.insert(key.into(), tag)
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.entries.remove(key)
    }

    pub fn put_bool(&mut self, key: impl Into<String>, v: bool) {
        self.put(key, Tag::Byte(v as i8));
    }
    pub fn put_byte(&mut self, key: impl Into<String>, v: i8) {
        self.put(key, Tag::Byte(v));
    }
    pub fn put_int(&mut self, key: impl Into<String>, v: i32) {
        self.put(key, Tag::Int(v));
    }
    pub fn put_long(&mut self, key: impl Into<String>, v: i64) {
        self.put(key, Tag::Long(v));
    }
    pub fn put_float(&mut self, key: impl Into<String>, v: f32) {
        self.put(key, Tag::Float(v));
    }
    pub fn put_double(&mut self, key: impl Into<String>, v: f64) {
        self.put(key, Tag::Double(v));
    }
    pub fn put_string(&mut self, key: impl Into<String>, v: impl Into<String>) {
        self.put(key, Tag::String(v.into()));
    }
    pub fn put_compound(&mut self, key: impl Into<String>, v: Compound) {
        self.put(key, Tag::Compound(v));
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Tag::Byte(b) => Some(*b != 0),
            _ => None,
        }
    }
    pub fn get_byte(&self, key: &str) -> Option<i8> {
        match self.get(key)? {
            Tag::Byte(b) => Some(*b),
            _ => None,
        }
    }
    /// Integer read that widens bytes and shorts.
    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(int_of)
    }
    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Tag::Long(v) => Some(*v),
            other => int_of(other).map(i64::from),
        }
    }
    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            Tag::Float(v) => Some(*v),
            _ => None,
        }
    }
    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Tag::Double(v) => Some(*v),
            Tag::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Tag::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
    pub fn get_compound(&self, key: &str) -> Option<&Compound> {
        match self.get(key)? {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }
    pub fn get_list(&self, key: &str) -> Option<&[Tag]> {
        match self.get(key)? {
            Tag::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Like [`Compound::get_int`] but reports why the field could not be read.
    pub fn require_int(&self, key: &str) -> Result<i32, TileError> {
        let tag = self
            .get(key)
            .ok_or_else(|| TileError::MissingField(key.to_string()))?;
        int_of(tag).ok_or_else(|| TileError::WrongType {
            field: key.to_string(),
            expected: "int",
            found: tag.type_name(),
        })
    }

    pub fn require_string(&self, key: &str) -> Result<&str, TileError> {
        match self.get(key) {
            Some(Tag::String(s)) => Ok(s.as_str()),
            Some(other) => Err(TileError::WrongType {
                field: key.to_string(),
                expected: "string",
                found: other.type_name(),
            }),
            None => Err(TileError::MissingField(key.to_string())),
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TileError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TileError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[inline]
fn int_of(tag: &Tag) -> Option<i32> {
    match tag {
        Tag::Byte(v) => Some(i32::from(*v)),
        Tag::Short(v) => Some(i32::from(*v)),
        Tag::Int(v) => Some(*v),
        _ => None,
    }
}
