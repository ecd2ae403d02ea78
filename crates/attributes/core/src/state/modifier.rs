//! Modifier payload contracts and per-entity modifier storage records.
//!
//! The engine never knows what a modifier does. It only asks the payload two
//! things: which attributes it reads, and to fold itself into a
//! [`ModifierStack`] given read access to attribute values.

use std::fmt;

use arrayvec::ArrayVec;

use super::{AttributeReference, AttributeType};
use crate::config::AttributeConfig;
use crate::store::AttributeReader;

/// Bounded list of attributes a modifier reads.
pub type ObservedAttributes =
    ArrayVec<AttributeReference, { AttributeConfig::MAX_OBSERVED_ATTRIBUTES }>;

/// Per-owner modifier identifier. `0` is never handed out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierId(pub u32);

impl ModifierId {
    pub const INVALID: Self = Self(0);

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable external handle to a stored modifier.
///
/// Storage positions change whenever a modifier is swap-removed, so handles
/// resolve by ID, never by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierReference {
    pub affected_attribute: AttributeReference,
    pub id: ModifierId,
}

impl ModifierReference {
    pub const fn new(affected_attribute: AttributeReference, id: ModifierId) -> Self {
        Self {
            affected_attribute,
            id,
        }
    }
}

impl fmt::Display for ModifierReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.affected_attribute, self.id)
    }
}

/// Result of applying a modifier to a stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierOutcome {
    /// The modifier contributed to the stack (or chose not to).
    Applied,
    /// A read dependency could not be resolved; the engine drops the modifier.
    Unresolved,
}

/// Accumulator that turns a base value and a set of applied modifiers into a
/// final value. The combination rule belongs entirely to the implementor.
pub trait ModifierStack: Default {
    /// Resets the accumulator before a recalculation pass.
    fn initialize(&mut self) {
        *self = Self::default();
    }

    /// Computes the derived value from `base_value` and everything applied so far.
    fn calculate_final_value(&self, base_value: f32) -> f32;
}

/// Payload of a modifier instance.
pub trait Modifier {
    type Stack: ModifierStack;

    /// Pushes every attribute this modifier reads into `observed`.
    ///
    /// Implementations should use `try_push`; the list holds at most
    /// [`AttributeConfig::MAX_OBSERVED_ATTRIBUTES`] entries.
    fn observed_attributes(&self, observed: &mut ObservedAttributes);

    /// Folds this modifier into `stack`, reading dependencies through `reader`.
    fn apply<R: AttributeReader + ?Sized>(
        &self,
        stack: &mut Self::Stack,
        reader: &R,
    ) -> ModifierOutcome;

    /// Convenience wrapper collecting [`Modifier::observed_attributes`].
    fn collect_observed(&self) -> ObservedAttributes {
        let mut observed = ObservedAttributes::new();
        self.observed_attributes(&mut observed);
        observed
    }
}

/// A stored modifier: ID and affected attribute type plus its payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierEntry<M> {
    pub id: ModifierId,
    pub affected_attribute_type: AttributeType,
    pub modifier: M,
}

impl<M> ModifierEntry<M> {
    pub fn new(id: ModifierId, affected_attribute_type: AttributeType, modifier: M) -> Self {
        Self {
            id,
            affected_attribute_type,
            modifier,
        }
    }

    /// Returns true if this entry is the one `reference` points at.
    #[inline]
    pub fn matches(&self, reference: &ModifierReference) -> bool {
        self.id == reference.id
            && self.affected_attribute_type == reference.affected_attribute.attribute_type
    }
}
