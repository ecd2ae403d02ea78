//! Reference accumulator following the layered bonus order:
//! Flat → %Inc → More → Less → Clamp
//!
//! The engine does not depend on this order; hosts with different arithmetic
//! implement [`ModifierStack`] themselves.

use crate::state::ModifierStack;

/// Accumulates modifier contributions for a single recalculation.
///
/// # Formula
/// ```text
/// result = clamp((base + flat) × (1 + increased/100) × more × less, min, max)
/// ```
///
/// # Example
/// ```
/// # use attributes_core::stats::StatStack;
/// # use attributes_core::ModifierStack;
/// let mut stack = StatStack::default();
/// stack.add_flat(5.0);        // +5
/// stack.add_increased(20.0);  // +20%
/// stack.add_increased(15.0);  // +15% (summed)
/// stack.add_more(50.0);       // ×1.5
/// stack.add_less(10.0);       // ×0.9
///
/// // (10 + 5) × 1.35 × 1.5 × 0.9
/// let result = stack.calculate_final_value(10.0);
/// assert!((result - 27.3375).abs() < 1e-4);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StatStack {
    flat: f32,
    increased: f32,
    more: f32,
    less: f32,
    min: f32,
    max: f32,
}

impl Default for StatStack {
    fn default() -> Self {
        Self {
            flat: 0.0,
            increased: 0.0,
            more: 1.0,
            less: 1.0,
            min: f32::NEG_INFINITY,
            max: f32::INFINITY,
        }
    }
}

impl StatStack {
    /// Flat additive bonus (applied first)
    pub fn add_flat(&mut self, value: f32) {
        self.flat += value;
    }

    /// Percentage increase, summed with other increases (20.0 = +20%)
    pub fn add_increased(&mut self, percent: f32) {
        self.increased += percent;
    }

    /// Sequential "more" multiplier (50.0 = ×1.5)
    pub fn add_more(&mut self, percent: f32) {
        self.more *= 1.0 + percent / 100.0;
    }

    /// Sequential "less" multiplier (10.0 = ×0.9)
    pub fn add_less(&mut self, percent: f32) {
        self.less *= 1.0 - percent / 100.0;
    }

    /// Raw multiplier folded into the "more" product.
    pub fn multiply(&mut self, factor: f32) {
        self.more *= factor;
    }

    /// Narrows the clamp bounds. Several clamps intersect.
    pub fn clamp_to(&mut self, min: f32, max: f32) {
        self.min = self.min.max(min);
        self.max = self.max.min(max);
    }
}

impl ModifierStack for StatStack {
    fn calculate_final_value(&self, base_value: f32) -> f32 {
        let after_flat = base_value + self.flat;
        let after_inc = after_flat * (1.0 + self.increased / 100.0);
        let after_more = after_inc * self.more;
        let after_less = after_more * self.less;

        // Disjoint clamps (min > max) resolve to the lower bound.
        if self.min > self.max {
            return self.min;
        }
        after_less.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_returns_base() {
        let stack = StatStack::default();
        assert_eq!(stack.calculate_final_value(42.0), 42.0);
    }

    #[test]
    fn flat_applies_before_multipliers() {
        let mut stack = StatStack::default();
        stack.multiply(2.0);
        stack.add_flat(10.0);

        assert_eq!(stack.calculate_final_value(100.0), 220.0);
    }

    #[test]
    fn initialize_resets_accumulated_bonuses() {
        let mut stack = StatStack::default();
        stack.add_flat(10.0);
        stack.clamp_to(0.0, 5.0);
        stack.initialize();

        assert_eq!(stack, StatStack::default());
    }

    #[test]
    fn clamps_intersect() {
        let mut stack = StatStack::default();
        stack.add_flat(500.0);
        stack.clamp_to(0.0, 300.0);
        stack.clamp_to(10.0, 250.0);

        assert_eq!(stack.calculate_final_value(0.0), 250.0);
    }
}
