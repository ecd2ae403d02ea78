//! Attribute value storage contracts.
//!
//! The engine reads and writes `(base_value, value)` pairs through these
//! traits only; hosts decide how values are laid out. [`AttributeTable`] is a
//! plain map-backed implementation for hosts without their own storage.

use std::collections::BTreeMap;

use crate::state::{AttributeReference, AttributeType, AttributeValues, EntityId};

/// Read access to attribute values, handed to modifiers while they apply.
pub trait AttributeReader {
    /// Returns the stored values, or `None` if the store has no slot.
    fn attribute_values(&self, attribute: AttributeReference) -> Option<AttributeValues>;
}

/// Read/write access used by the engine.
pub trait AttributeStore: AttributeReader {
    /// Overwrites the stored values. Returns false if the slot does not exist.
    fn set_attribute_values(
        &mut self,
        attribute: AttributeReference,
        values: AttributeValues,
    ) -> bool;
}

/// Map-backed attribute storage. Slots exist only after [`AttributeTable::insert`].
///
/// Slots are grouped per entity, so every map key is a plain integer id and
/// the table encodes to self-describing formats such as JSON as well as bincode.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeTable {
    entities: BTreeMap<EntityId, BTreeMap<AttributeType, AttributeValues>>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or resets) a slot with `value == base_value`.
    pub fn insert(&mut self, attribute: AttributeReference, base_value: f32) {
        self.entities
            .entry(attribute.entity)
            .or_default()
            .insert(attribute.attribute_type, AttributeValues::new(base_value));
    }

    pub fn get(&self, attribute: AttributeReference) -> Option<AttributeValues> {
        self.entities
            .get(&attribute.entity)?
            .get(&attribute.attribute_type)
            .copied()
    }

    /// Derived value of `attribute`, if the slot exists.
    pub fn value(&self, attribute: AttributeReference) -> Option<f32> {
        self.get(attribute).map(|values| values.value)
    }

    /// Drops every slot owned by `entity`. Returns the number of slots removed.
    pub fn remove_entity(&mut self, entity: EntityId) -> usize {
        self.entities.remove(&entity).map_or(0, |slots| slots.len())
    }

    pub fn len(&self) -> usize {
        self.entities.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.values().all(BTreeMap::is_empty)
    }
}

impl AttributeReader for AttributeTable {
    fn attribute_values(&self, attribute: AttributeReference) -> Option<AttributeValues> {
        self.get(attribute)
    }
}

impl AttributeStore for AttributeTable {
    fn set_attribute_values(
        &mut self,
        attribute: AttributeReference,
        values: AttributeValues,
    ) -> bool {
        let slot = self
            .entities
            .get_mut(&attribute.entity)
            .and_then(|slots| slots.get_mut(&attribute.attribute_type));
        match slot {
            Some(slot) => {
                *slot = values;
                true
            }
            None => false,
        }
    }
}
