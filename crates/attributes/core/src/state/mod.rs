//! Attribute data model: identifiers, values, modifiers and the observer graph.

pub mod common;
pub mod graph;
pub mod modifier;
pub mod observer;
pub mod owner;

pub use common::{AttributeReference, AttributeType, AttributeValues, EntityId};
pub use graph::{AttributeGraph, EntityAttributes};
pub use modifier::{
    Modifier, ModifierEntry, ModifierId, ModifierOutcome, ModifierReference, ModifierStack,
    ObservedAttributes,
};
pub use observer::{AttributeObserver, AttributeObserverCleanup};
pub use owner::AttributesOwner;
