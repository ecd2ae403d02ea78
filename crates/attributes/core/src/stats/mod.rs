//! Reference modifier arithmetic.
//!
//! [`StatStack`] accumulates bonuses in the order
//! `Flat → %Inc → More → Less → Clamp`, and [`StatModifier`] is the sum type of
//! payloads that feed it, including attribute-driven variants that create
//! observer edges.

pub mod modifier;
pub mod stack;

pub use modifier::StatModifier;
pub use stack::StatStack;
