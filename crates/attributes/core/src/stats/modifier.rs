use crate::state::{AttributeReference, Modifier, ModifierOutcome, ObservedAttributes};
use crate::store::AttributeReader;

use super::StatStack;

/// A single modifier payload for [`StatStack`].
///
/// Constant variants never read other attributes. Attribute-driven variants
/// read the source's derived `value` and become unresolved once the source
/// slot is gone, at which point the engine drops them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatModifier {
    /// Flat additive bonus (applied first)
    Flat(f32),

    /// Percentage increase (summed with other %Inc, then multiplied)
    Increased(f32),

    /// Multiplicative "more" modifier (50.0 = ×1.5)
    More(f32),

    /// Multiplicative "less" modifier (10.0 = ×0.9)
    Less(f32),

    /// Adds `factor × source.value` as a flat bonus.
    AddAttribute {
        source: AttributeReference,
        factor: f32,
    },

    /// Multiplies the result by `source.value`.
    MultiplyByAttribute { source: AttributeReference },

    /// Clamps the final value.
    Clamp { min: f32, max: f32 },
}

impl StatModifier {
    pub fn flat(value: f32) -> Self {
        Self::Flat(value)
    }

    pub fn increased(percent: f32) -> Self {
        Self::Increased(percent)
    }

    pub fn more(percent: f32) -> Self {
        Self::More(percent)
    }

    pub fn less(percent: f32) -> Self {
        Self::Less(percent)
    }

    pub fn add_attribute(source: AttributeReference, factor: f32) -> Self {
        Self::AddAttribute { source, factor }
    }

    pub fn multiply_by_attribute(source: AttributeReference) -> Self {
        Self::MultiplyByAttribute { source }
    }

    pub fn clamp(min: f32, max: f32) -> Self {
        Self::Clamp { min, max }
    }

    /// Attribute this modifier reads, if any.
    pub fn source(&self) -> Option<AttributeReference> {
        match self {
            Self::AddAttribute { source, .. } | Self::MultiplyByAttribute { source } => {
                Some(*source)
            }
            _ => None,
        }
    }
}

impl Modifier for StatModifier {
    type Stack = StatStack;

    fn observed_attributes(&self, observed: &mut ObservedAttributes) {
        if let Some(source) = self.source() {
            let _ = observed.try_push(source);
        }
    }

    fn apply<R: AttributeReader + ?Sized>(
        &self,
        stack: &mut StatStack,
        reader: &R,
    ) -> ModifierOutcome {
        match self {
            Self::Flat(value) => stack.add_flat(*value),
            Self::Increased(percent) => stack.add_increased(*percent),
            Self::More(percent) => stack.add_more(*percent),
            Self::Less(percent) => stack.add_less(*percent),
            Self::Clamp { min, max } => stack.clamp_to(*min, *max),
            Self::AddAttribute { source, factor } => {
                let Some(values) = reader.attribute_values(*source) else {
                    return ModifierOutcome::Unresolved;
                };
                stack.add_flat(values.value * factor);
            }
            Self::MultiplyByAttribute { source } => {
                let Some(values) = reader.attribute_values(*source) else {
                    return ModifierOutcome::Unresolved;
                };
                stack.multiply(values.value);
            }
        }
        ModifierOutcome::Applied
    }
}
