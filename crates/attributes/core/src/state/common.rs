use std::fmt;

/// Unique identifier for any entity that can own or observe attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Integer slot identifier of an attribute on its owner (e.g. health, armor).
///
/// Hosts usually define their own enum and convert with `AttributeType::from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeType(pub i32);

impl From<i32> for AttributeType {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Addresses exactly one attribute slot: an owner entity plus an attribute type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeReference {
    pub entity: EntityId,
    pub attribute_type: AttributeType,
}

impl AttributeReference {
    pub const fn new(entity: EntityId, attribute_type: AttributeType) -> Self {
        Self {
            entity,
            attribute_type,
        }
    }
}

impl fmt::Display for AttributeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.attribute_type)
    }
}

/// Stored pair of base value and derived value.
///
/// `value` is a cache: it is always recomputed from `base_value` and the
/// modifiers currently applied to the attribute.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeValues {
    pub base_value: f32,
    pub value: f32,
}

impl AttributeValues {
    /// Values for an attribute with no modifiers applied yet.
    pub const fn new(base_value: f32) -> Self {
        Self {
            base_value,
            value: base_value,
        }
    }
}
