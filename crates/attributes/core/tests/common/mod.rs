//! Shared fixtures for the scenario tests.
#![allow(dead_code)]

use attributes_core::{
    AttributeGraph, AttributeReader, AttributeReference, AttributeStore, AttributeTable,
    AttributeType, AttributeValues, EntityId, StatModifier,
};

pub const HEALTH: AttributeType = AttributeType(0);
pub const ARMOR: AttributeType = AttributeType(1);
pub const STRENGTH: AttributeType = AttributeType(2);

pub fn attr(entity: u32, attribute: AttributeType) -> AttributeReference {
    AttributeReference::new(EntityId(entity), attribute)
}

/// Installs a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Store wrapper that records every successful write in order.
///
/// Writes to attributes listed in `rejected` are refused.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub table: AttributeTable,
    pub writes: Vec<AttributeReference>,
    pub rejected: Vec<AttributeReference>,
}

impl RecordingStore {
    pub fn value(&self, attribute: AttributeReference) -> Option<f32> {
        self.table.value(attribute)
    }

    pub fn position(&self, attribute: AttributeReference) -> Option<usize> {
        self.writes.iter().position(|write| *write == attribute)
    }

    pub fn writes_to(&self, attribute: AttributeReference) -> usize {
        self.writes.iter().filter(|write| **write == attribute).count()
    }
}

impl AttributeReader for RecordingStore {
    fn attribute_values(&self, attribute: AttributeReference) -> Option<AttributeValues> {
        self.table.attribute_values(attribute)
    }
}

impl AttributeStore for RecordingStore {
    fn set_attribute_values(
        &mut self,
        attribute: AttributeReference,
        values: AttributeValues,
    ) -> bool {
        if self.rejected.contains(&attribute) {
            return false;
        }
        let written = self.table.set_attribute_values(attribute, values);
        if written {
            self.writes.push(attribute);
        }
        written
    }
}

/// Entities `1..=count`, each owning HEALTH, ARMOR and STRENGTH slots and buffers.
pub fn world(count: u32, base_value: f32) -> (RecordingStore, AttributeGraph<StatModifier>) {
    let mut store = RecordingStore::default();
    let mut graph = AttributeGraph::new();
    for entity in 1..=count {
        graph.register_owner(EntityId(entity));
        for attribute in [HEALTH, ARMOR, STRENGTH] {
            store.table.insert(attr(entity, attribute), base_value);
        }
    }
    (store, graph)
}
