use std::collections::HashMap;
use std::sync::Arc;

use crate::{BlockData, BlockError, BlockKey, StateDescriptor, StateValue};

/// Packed position of one property inside a native state id.
#[derive(Clone, Debug)]
pub struct StateField {
    pub descriptor: usize,
    pub bits: u32,
    pub offset: u32,
}

/// Compiled, immutable property layout of one block definition.
///
/// Descriptors keep their declared order; the packed layout sorts fields by name so the
/// native state id does not depend on declaration order.
#[derive(Debug)]
pub struct StateSchema {
    key: BlockKey,
    descriptors: Vec<StateDescriptor>,
    prop_index: HashMap<String, usize>,
    fields: Vec<StateField>,
    total_bits: u32,
}

impl StateSchema {
    pub fn new(key: BlockKey, descriptors: Vec<StateDescriptor>) -> Result<Arc<Self>, BlockError> {
        let mut prop_index: HashMap<String, usize> = HashMap::with_capacity(descriptors.len());
        for (i, d) in descriptors.iter().enumerate() {
            if prop_index.insert(d.name().to_string(), i).is_some() {
                return Err(BlockError::Registration {
                    key,
                    reason: format!("state `{}` declared twice", d.name()),
                });
            }
        }
        let (fields, total_bits) = compute_state_layout(&descriptors);
        if total_bits > 32 {
            return Err(BlockError::Registration {
                key,
                reason: format!("state space needs {total_bits} bits, at most 32 fit"),
            });
        }
        Ok(Arc::new(Self {
            key,
            descriptors,
            prop_index,
            fields,
            total_bits,
        }))
    }

    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    pub fn descriptors(&self) -> &[StateDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<&StateDescriptor> {
        self.index_of(name).map(|i| &self.descriptors[i])
    }

    #[inline]
    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.prop_index.get(name).copied()
    }

    pub fn fields(&self) -> &[StateField] {
        &self.fields
    }

    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// Number of distinct BlockData values this schema admits.
    pub fn state_count(&self) -> u64 {
        self.descriptors
            .iter()
            .map(|d| d.domain().cardinality())
            .product()
    }

    pub fn default_data(self: &Arc<Self>) -> BlockData {
        let values = self
            .descriptors
            .iter()
            .map(|d| d.default_value().clone())
            .collect();
        BlockData::from_parts(Arc::clone(self), values)
    }

    /// Builds data from textual properties; anything not given keeps its default.
    pub fn data_from_props(
        self: &Arc<Self>,
        props: &HashMap<String, String>,
    ) -> Result<BlockData, BlockError> {
        for name in props.keys() {
            if self.index_of(name).is_none() {
                return Err(BlockError::transition(
                    &self.key,
                    format!("no state named `{name}`"),
                ));
            }
        }
        let mut values = Vec::with_capacity(self.descriptors.len());
        for d in &self.descriptors {
            let v = match props.get(d.name()) {
                Some(raw) => d.domain().parse(raw).ok_or_else(|| {
                    BlockError::transition(
                        &self.key,
                        format!("`{raw}` is not a value of `{}`", d.name()),
                    )
                })?,
                None => d.default_value().clone(),
            };
            values.push(v);
        }
        Ok(BlockData::from_parts(Arc::clone(self), values))
    }

    /// Encodes `data` into its native state id.
    pub fn pack(&self, data: &BlockData) -> u32 {
        let mut acc: u32 = 0;
        for f in &self.fields {
            if f.bits == 0 {
                continue;
            }
            let d = &self.descriptors[f.descriptor];
            let sel = d.domain().index_of(&data.values()[f.descriptor]).unwrap_or(0);
            acc |= (sel & mask(f.bits)) << f.offset;
        }
        acc
    }

    /// Decodes a native state id. Ids that name a value outside a domain are rejected.
    pub fn unpack(self: &Arc<Self>, state: u32) -> Result<BlockData, BlockError> {
        if self.total_bits < 32 && state >> self.total_bits != 0 {
            return Err(BlockError::transition(
                &self.key,
                format!("state id {state:#x} has bits beyond the layout"),
            ));
        }
        let mut values: Vec<Option<StateValue>> = vec![None; self.descriptors.len()];
        for f in &self.fields {
            let d = &self.descriptors[f.descriptor];
            let idx = state.checked_shr(f.offset).unwrap_or(0) & mask(f.bits);
            let v = d.domain().value_at(idx).ok_or_else(|| {
                BlockError::transition(
                    &self.key,
                    format!("state id {state:#x} selects no value of `{}`", d.name()),
                )
            })?;
            values[f.descriptor] = Some(v);
        }
        Ok(BlockData::from_parts(
            Arc::clone(self),
            values.into_iter().flatten().collect(),
        ))
    }
}

#[inline]
fn mask(bits: u32) -> u32 {
    if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 }
}

fn compute_state_layout(descriptors: &[StateDescriptor]) -> (Vec<StateField>, u32) {
    let mut order: Vec<usize> = (0..descriptors.len()).collect();
    order.sort_by(|a, b| descriptors[*a].name().cmp(descriptors[*b].name()));
    let mut offset: u32 = 0;
    let mut fields = Vec::with_capacity(order.len());
    for i in order {
        let card = descriptors[i].domain().cardinality();
        let bits: u32 = if card <= 1 {
            0
        } else {
            64 - (card - 1).leading_zeros()
        };
        fields.push(StateField {
            descriptor: i,
            bits,
            offset,
        });
        offset = offset.saturating_add(bits);
    }
    (fields, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> BlockKey {
        "test:block".parse().unwrap()
    }

    #[test]
    fn layout_is_sorted_by_name_with_minimal_bits() {
        let schema = StateSchema::new(
            key(),
            vec![
                StateDescriptor::int("power", 0, 15, 0).unwrap(),
                StateDescriptor::boolean("lit", false).unwrap(),
                StateDescriptor::named("axis", &["x", "y", "z"], "y").unwrap(),
            ],
        )
        .unwrap();
        let f: Vec<(&str, u32, u32)> = schema
            .fields()
            .iter()
            .map(|f| (schema.descriptors()[f.descriptor].name(), f.bits, f.offset))
            .collect();
        assert_eq!(f, vec![("axis", 2, 0), ("lit", 1, 2), ("power", 4, 3)]);
        assert_eq!(schema.total_bits(), 7);
        assert_eq!(schema.state_count(), 3 * 2 * 16);
    }

    #[test]
    fn duplicate_state_names_fail_registration() {
        let err = StateSchema::new(
            key(),
            vec![StateDescriptor::boolean("lit", false).unwrap(), StateDescriptor::boolean("lit", true).unwrap()],
        )
        .unwrap_err();
        assert!(matches!(err, BlockError::Registration { .. }));
    }

    #[test]
    fn oversized_layout_is_rejected() {
        let err = StateSchema::new(
            key(),
            vec![
                StateDescriptor::int("a", i32::MIN, i32::MAX, 0).unwrap(),
                StateDescriptor::boolean("b", false).unwrap(),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, BlockError::Registration { .. }));
    }

    #[test]
    fn unpack_rejects_ids_outside_domains() {
        let schema = StateSchema::new(
            key(),
            vec![StateDescriptor::named("axis", &["x", "y", "z"], "y").unwrap()],
        )
        .unwrap();
        assert!(schema.unpack(2).is_ok());
        assert!(matches!(
            schema.unpack(3),
            Err(BlockError::IllegalStateTransition { .. })
        ));
        assert!(schema.unpack(0b100).is_err());
    }

    #[test]
    fn props_fill_missing_with_defaults() {
        let schema = StateSchema::new(
            key(),
            vec![
                StateDescriptor::named("p0", &["a", "b"], "a").unwrap(),
                StateDescriptor::named("p1", &["u"], "u").unwrap(),
                StateDescriptor::named("p2", &["x", "y", "z"], "x").unwrap(),
            ],
        )
        .unwrap();
        let props = HashMap::from([
            ("p0".to_string(), "b".to_string()),
            ("p2".to_string(), "z".to_string()),
        ]);
        let data = schema.data_from_props(&props).unwrap();
        assert_eq!(data.get_name("p0"), Some("b"));
        assert_eq!(data.get_name("p1"), Some("u"));
        assert_eq!(data.get_name("p2"), Some("z"));
        assert_eq!(schema.unpack(schema.pack(&data)).unwrap(), data);

        let bad = HashMap::from([("p9".to_string(), "a".to_string())]);
        assert!(schema.data_from_props(&bad).is_err());
    }
}
