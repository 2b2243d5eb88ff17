use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{BlockError, BlockKey, StateSchema, StateValue};

/// Immutable snapshot of every property value of one block.
///
/// Always fully populated and valid against its schema; the only way to change a value is
/// [`BlockData::with`], which validates and returns a new snapshot.
#[derive(Clone)]
pub struct BlockData {
    schema: Arc<StateSchema>,
    values: Arc<[StateValue]>,
}

impl BlockData {
    /// `values` must already be validated against `schema`, in descriptor order.
    pub(crate) fn from_parts(schema: Arc<StateSchema>, values: Vec<StateValue>) -> Self {
        debug_assert_eq!(values.len(), schema.descriptors().len());
        Self {
            schema,
            values: values.into(),
        }
    }

    pub fn key(&self) -> &BlockKey {
        self.schema.key()
    }

    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    #[inline]
    pub(crate) fn values(&self) -> &[StateValue] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&StateValue> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(StateValue::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(StateValue::as_int)
    }

    pub fn get_name(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(StateValue::as_name)
    }

    /// Returns a copy with `name` set to `value`, validated against the schema.
    pub fn with(&self, name: &str, value: impl Into<StateValue>) -> Result<BlockData, BlockError> {
        let value = value.into();
        let i = self.schema.index_of(name).ok_or_else(|| {
            BlockError::transition(self.key(), format!("no state named `{name}`"))
        })?;
        let d = &self.schema.descriptors()[i];
        if !d.accepts(&value) {
            return Err(BlockError::transition(
                self.key(),
                format!("`{value}` is not a value of `{name}`"),
            ));
        }
        if self.values[i] == value {
            return Ok(self.clone());
        }
        let mut values = self.values.to_vec();
        values[i] = value;
        Ok(Self::from_parts(Arc::clone(&self.schema), values))
    }

    /// Property name/value pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.schema
            .descriptors()
            .iter()
            .map(|d| d.name())
            .zip(self.values.iter())
    }

    /// Textual properties, as used by native block-state strings.
    pub fn properties(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Native state id of this data under its schema's packed layout.
    pub fn state_id(&self) -> u32 {
        self.schema.pack(self)
    }

    /// Whether this data still matches `schema` value by value.
    pub fn conforms_to(&self, schema: &StateSchema) -> bool {
        self.key() == schema.key()
            && self.values.len() == schema.descriptors().len()
            && schema
                .descriptors()
                .iter()
                .all(|d| self.get(d.name()).is_some_and(|v| d.accepts(v)))
    }

    /// The same values laid out by `schema`, or `None` when they do not conform to it.
    ///
    /// State ids are packed by value index, so data built from another schema with the
    /// same key must be rebased before it is packed.
    pub fn rebased(&self, schema: &Arc<StateSchema>) -> Option<BlockData> {
        if Arc::ptr_eq(&self.schema, schema) {
            return Some(self.clone());
        }
        if !self.conforms_to(schema) {
            return None;
        }
        let values = schema
            .descriptors()
            .iter()
            .map(|d| self.get(d.name()).cloned())
            .collect::<Option<Vec<_>>>()?;
        Some(Self::from_parts(Arc::clone(schema), values))
    }
}

impl PartialEq for BlockData {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.values == other.values
    }
}

impl Eq for BlockData {}

impl Hash for BlockData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
        self.values.hash(state);
    }
}

impl fmt::Display for BlockData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())?;
        if self.values.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for BlockData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockData({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StateDescriptor;

    fn lamp() -> Arc<StateSchema> {
        StateSchema::new(
            "demo:lamp".parse().unwrap(),
            vec![
                StateDescriptor::boolean("lit", false).unwrap(),
                StateDescriptor::int("level", 0, 15, 7).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn with_returns_new_validated_snapshot() {
        let base = lamp().default_data();
        let lit = base.with("lit", true).unwrap();
        assert_eq!(base.get_bool("lit"), Some(false));
        assert_eq!(lit.get_bool("lit"), Some(true));
        assert_eq!(lit.get_int("level"), Some(7));
        assert_ne!(base, lit);
        assert_eq!(lit.to_string(), "demo:lamp[lit=true,level=7]");
    }

    #[test]
    fn with_rejects_unknown_names_and_foreign_values() {
        let base = lamp().default_data();
        assert!(matches!(
            base.with("color", "red"),
            Err(BlockError::IllegalStateTransition { .. })
        ));
        assert!(matches!(
            base.with("level", 16),
            Err(BlockError::IllegalStateTransition { .. })
        ));
        assert!(matches!(
            base.with("lit", 1),
            Err(BlockError::IllegalStateTransition { .. })
        ));
    }

    #[test]
    fn equality_ignores_schema_identity() {
        let a = lamp().default_data();
        let b = lamp().default_data();
        assert_eq!(a, b);
        assert!(a.conforms_to(b.schema()));
    }

    #[test]
    fn rebased_data_packs_by_the_target_layout() {
        let key: BlockKey = "demo:switch".parse().unwrap();
        let ab = StateSchema::new(
            key.clone(),
            vec![
                StateDescriptor::named("mode", &["a", "b"], "a").unwrap(),
                StateDescriptor::boolean("lit", false).unwrap(),
            ],
        )
        .unwrap();
        let ba = StateSchema::new(
            key,
            vec![
                StateDescriptor::boolean("lit", true).unwrap(),
                StateDescriptor::named("mode", &["b", "a"], "b").unwrap(),
            ],
        )
        .unwrap();
        let theirs = ba.default_data();
        let ours = theirs.rebased(&ab).unwrap();
        assert!(Arc::ptr_eq(ours.schema(), &ab));
        assert_eq!(ours.get_name("mode"), Some("b"));
        assert_eq!(ours.get_bool("lit"), Some(true));
        assert_eq!(ab.unpack(ours.state_id()).unwrap(), ours);
        assert_ne!(theirs.state_id(), ours.state_id());

        let narrow = StateSchema::new(
            "demo:switch".parse().unwrap(),
            vec![StateDescriptor::named("mode", &["a"], "a").unwrap(), StateDescriptor::boolean("lit", false).unwrap()],
        )
        .unwrap();
        assert!(theirs.rebased(&narrow).is_none());
    }
}
