use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BlockError;

/// Concrete value of one block state property.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Int(i32),
    Name(String),
}

impl StateValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_int(&self) -> Option<i32> {
        match self {
            StateValue::Int(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_name(&self) -> Option<&str> {
        match self {
            StateValue::Name(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{b}"),
            StateValue::Int(i) => write!(f, "{i}"),
            StateValue::Name(s) => f.write_str(s),
        }
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        StateValue::Bool(v)
    }
}
impl From<i32> for StateValue {
    fn from(v: i32) -> Self {
        StateValue::Int(v)
    }
}
impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        StateValue::Name(v.to_string())
    }
}
impl From<String> for StateValue {
    fn from(v: String) -> Self {
        StateValue::Name(v)
    }
}

/// Set of values a property may take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateDomain {
    Named(Vec<String>),
    /// Inclusive range.
    Int { min: i32, max: i32 },
    Bool,
}

impl StateDomain {
    pub fn cardinality(&self) -> u64 {
        match self {
            StateDomain::Named(v) => v.len() as u64,
            StateDomain::Int { min, max } => (i64::from(*max) - i64::from(*min) + 1) as u64,
            StateDomain::Bool => 2,
        }
    }

    pub fn contains(&self, value: &StateValue) -> bool {
        self.index_of(value).is_some()
    }

    /// Position of `value` inside the domain, used for packing.
    pub fn index_of(&self, value: &StateValue) -> Option<u32> {
        match (self, value) {
            (StateDomain::Named(v), StateValue::Name(s)) => v.iter().position(|n| n == s).map(|i| i as u32),
            (StateDomain::Int { min, max }, StateValue::Int(i)) if (*min..=*max).contains(i) => {
                Some((i64::from(*i) - i64::from(*min)) as u32)
            }
            (StateDomain::Bool, StateValue::Bool(b)) => Some(*b as u32),
            _ => None,
        }
    }

    pub fn value_at(&self, index: u32) -> Option<StateValue> {
        match self {
            StateDomain::Named(v) => v.get(index as usize).map(|s| StateValue::Name(s.clone())),
            StateDomain::Int { min, max } => {
                let v = i64::from(*min) + i64::from(index);
                (v <= i64::from(*max)).then_some(StateValue::Int(v as i32))
            }
            StateDomain::Bool => match index {
                0 => Some(StateValue::Bool(false)),
                1 => Some(StateValue::Bool(true)),
                _ => None,
            },
        }
    }

    /// Reads the textual form used in configs and native block-state strings.
    pub fn parse(&self, s: &str) -> Option<StateValue> {
        let v = match self {
            StateDomain::Named(_) => StateValue::Name(s.to_string()),
            StateDomain::Int { .. } => StateValue::Int(s.parse().ok()?),
            StateDomain::Bool => StateValue::Bool(s.parse().ok()?),
        };
        self.contains(&v).then_some(v)
    }
}

/// One named, typed property a block exposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateDescriptor {
    name: String,
    domain: StateDomain,
    default: StateValue,
}

impl StateDescriptor {
    pub fn new(
        name: impl Into<String>,
        domain: StateDomain,
        default: impl Into<StateValue>,
    ) -> Result<Self, BlockError> {
        let name = name.into();
        let default = default.into();
        let invalid = |reason: String| BlockError::InvalidDescriptor {
            name: name.clone(),
            reason,
        };
        if name.is_empty() {
            return Err(invalid("empty name".into()));
        }
        match &domain {
            StateDomain::Named(v) if v.is_empty() => return Err(invalid("no values".into())),
            StateDomain::Named(v) => {
                for (i, n) in v.iter().enumerate() {
                    if v[..i].contains(n) {
                        return Err(invalid(format!("value `{n}` listed twice")));
                    }
                }
            }
            StateDomain::Int { min, max } if min > max => {
                return Err(invalid(format!("empty range {min}..={max}")));
            }
            _ => {}
        }
        if !domain.contains(&default) {
            return Err(invalid(format!("default `{default}` outside domain")));
        }
        Ok(Self {
            name,
            domain,
            default,
        })
    }

    pub fn named<S: AsRef<str>>(name: &str, values: &[S], default: &str) -> Result<Self, BlockError> {
        let values = values.iter().map(|s| s.as_ref().to_string()).collect();
        Self::new(name, StateDomain::Named(values), default)
    }

    pub fn int(name: &str, min: i32, max: i32, default: i32) -> Result<Self, BlockError> {
        Self::new(name, StateDomain::Int { min, max }, default)
    }

    pub fn boolean(name: &str, default: bool) -> Result<Self, BlockError> {
        Self::new(name, StateDomain::Bool, default)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &StateDomain {
        &self.domain
    }

    pub fn default_value(&self) -> &StateValue {
        &self.default
    }

    #[inline]
    pub fn accepts(&self, value: &StateValue) -> bool {
        self.domain.contains(value)
    }
}
