//! Deferred attribute commands.
//!
//! Code that cannot borrow the graph (parallel systems, event handlers,
//! network replay) records [`AttributeCommand`]s into an
//! [`AttributeCommandBuffer`]. The host plays the buffer back later through
//! the same [`AttributeChanger`] entry points used for immediate mutation.
//!
//! Commands are plain values: they carry references and modifier payloads,
//! never borrows, so buffers can be sent across threads or encoded to bytes.

pub mod buffer;
pub mod notification;

pub use buffer::{AttributeCommandBuffer, PlaybackReport};
pub use notification::{ModifierNotification, NotificationBuffers, NotificationTarget};

use crate::engine::AttributeChanger;
use crate::error::{AttributeError, Result};
use crate::state::{AttributeReference, EntityId, Modifier, ModifierReference};
use crate::store::AttributeStore;

/// One recorded engine mutation.
///
/// Every variant recalculates automatically when processed, except
/// `AddModifier` which honours its own `auto_recalculate` flag.
#[derive(Clone, Debug, PartialEq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AttributeCommand<M> {
    SetBaseValue {
        attribute: AttributeReference,
        value: f32,
    },
    AddBaseValue {
        attribute: AttributeReference,
        delta: f32,
    },
    RecalculateAttributeAndAllObservers {
        attribute: AttributeReference,
    },
    RecalculateAllObservers {
        attribute: AttributeReference,
    },
    AddModifier {
        attribute: AttributeReference,
        modifier: M,
        auto_recalculate: bool,
        /// Receives the new handle once the modifier is stored.
        notify: Option<NotificationTarget>,
    },
    RemoveModifier {
        reference: ModifierReference,
    },
    RemoveAllModifiersOnEntity {
        entity: EntityId,
    },
    RemoveAllModifiersAffectingAttribute {
        attribute: AttributeReference,
    },
    RemoveAllModifiersObservingEntity {
        entity: EntityId,
        observed_entity: EntityId,
    },
    RemoveAllModifiersObservingAttribute {
        entity: EntityId,
        observed_attribute: AttributeReference,
    },
}

impl<M> AttributeCommand<M> {
    /// Snake-case name of the variant, used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Entity whose buffers or slots the command mutates.
    pub fn target_entity(&self) -> EntityId {
        match self {
            Self::SetBaseValue { attribute, .. }
            | Self::AddBaseValue { attribute, .. }
            | Self::RecalculateAttributeAndAllObservers { attribute }
            | Self::RecalculateAllObservers { attribute }
            | Self::AddModifier { attribute, .. }
            | Self::RemoveAllModifiersAffectingAttribute { attribute } => attribute.entity,
            Self::RemoveModifier { reference } => reference.affected_attribute.entity,
            Self::RemoveAllModifiersOnEntity { entity }
            | Self::RemoveAllModifiersObservingEntity { entity, .. }
            | Self::RemoveAllModifiersObservingAttribute { entity, .. } => *entity,
        }
    }
}

impl<M: Modifier> AttributeCommand<M> {
    /// Replays the command through `changer`.
    ///
    /// A command whose target entity no longer exists is not applied and
    /// fails with [`AttributeError::StaleCommandTarget`]. Base-value commands
    /// only need the attribute slot; everything else needs the entity's
    /// modifier/observer buffers.
    pub fn process<St>(
        self,
        changer: &mut AttributeChanger<'_, M, St>,
        notifications: &mut NotificationBuffers,
    ) -> Result<()>
    where
        St: AttributeStore + ?Sized,
    {
        if !self.target_exists(changer) {
            return Err(stale(self.name(), self.target_entity()));
        }

        match self {
            Self::SetBaseValue { attribute, value } => {
                changer.set_base_value(attribute, value, true)
            }
            Self::AddBaseValue { attribute, delta } => {
                changer.add_base_value(attribute, delta, true)
            }
            Self::RecalculateAttributeAndAllObservers { attribute } => {
                changer.recalculate_attribute_and_all_observers(attribute)
            }
            Self::RecalculateAllObservers { attribute } => {
                changer.recalculate_all_observers(attribute)
            }
            Self::AddModifier {
                attribute,
                modifier,
                auto_recalculate,
                notify,
            } => {
                let reference = changer.add_modifier(attribute, modifier, auto_recalculate)?;
                if let Some(target) = notify {
                    notifications.push(
                        target.entity,
                        ModifierNotification {
                            reference,
                            correlation_id: target.correlation_id,
                        },
                    );
                }
                Ok(())
            }
            Self::RemoveModifier { reference } => changer.remove_modifier(reference, true),
            Self::RemoveAllModifiersOnEntity { entity } => changer
                .remove_all_modifiers_on_entity(entity, true)
                .map(drop),
            Self::RemoveAllModifiersAffectingAttribute { attribute } => changer
                .remove_all_modifiers_affecting_attribute(attribute, true)
                .map(drop),
            Self::RemoveAllModifiersObservingEntity {
                entity,
                observed_entity,
            } => changer
                .remove_all_modifiers_observing_entity(entity, observed_entity, true)
                .map(drop),
            Self::RemoveAllModifiersObservingAttribute {
                entity,
                observed_attribute,
            } => changer
                .remove_all_modifiers_observing_attribute(entity, observed_attribute, true)
                .map(drop),
        }
    }

    fn target_exists<St>(&self, changer: &AttributeChanger<'_, M, St>) -> bool
    where
        St: AttributeStore + ?Sized,
    {
        match self {
            Self::SetBaseValue { attribute, .. } | Self::AddBaseValue { attribute, .. } => {
                changer.store().attribute_values(*attribute).is_some()
            }
            _ => changer.graph().contains(self.target_entity()),
        }
    }
}

fn stale(command: &'static str, entity: EntityId) -> AttributeError {
    #[cfg(debug_assertions)]
    tracing::warn!(command, %entity, "deferred command targets a missing entity");
    AttributeError::StaleCommandTarget { command, entity }
}
