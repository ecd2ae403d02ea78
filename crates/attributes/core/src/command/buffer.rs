//! Recording and playback of deferred commands.

use super::{AttributeCommand, NotificationBuffers, NotificationTarget};
use crate::engine::AttributeChanger;
use crate::error::AttributeError;
use crate::state::{AttributeGraph, AttributeReference, EntityId, Modifier, ModifierReference};
use crate::store::AttributeStore;

/// Ordered list of commands waiting for a serial playback phase.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeCommandBuffer<M> {
    commands: Vec<AttributeCommand<M>>,
}

impl<M> Default for AttributeCommandBuffer<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`AttributeCommandBuffer::playback`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackReport {
    pub applied: usize,
    pub failed: usize,
    /// Errors in playback order, one per failed command.
    pub errors: Vec<AttributeError>,
}

impl PlaybackReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl<M> AttributeCommandBuffer<M> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: AttributeCommand<M>) {
        self.commands.push(command);
    }

    pub fn set_base_value(&mut self, attribute: AttributeReference, value: f32) {
        self.push(AttributeCommand::SetBaseValue { attribute, value });
    }

    pub fn add_base_value(&mut self, attribute: AttributeReference, delta: f32) {
        self.push(AttributeCommand::AddBaseValue { attribute, delta });
    }

    pub fn recalculate_attribute_and_all_observers(&mut self, attribute: AttributeReference) {
        self.push(AttributeCommand::RecalculateAttributeAndAllObservers { attribute });
    }

    pub fn recalculate_all_observers(&mut self, attribute: AttributeReference) {
        self.push(AttributeCommand::RecalculateAllObservers { attribute });
    }

    pub fn add_modifier(&mut self, attribute: AttributeReference, modifier: M) {
        self.push(AttributeCommand::AddModifier {
            attribute,
            modifier,
            auto_recalculate: true,
            notify: None,
        });
    }

    /// Like [`Self::add_modifier`], reporting the new handle to `target` on success.
    pub fn add_modifier_with_notification(
        &mut self,
        attribute: AttributeReference,
        modifier: M,
        target: NotificationTarget,
    ) {
        self.push(AttributeCommand::AddModifier {
            attribute,
            modifier,
            auto_recalculate: true,
            notify: Some(target),
        });
    }

    pub fn remove_modifier(&mut self, reference: ModifierReference) {
        self.push(AttributeCommand::RemoveModifier { reference });
    }

    pub fn remove_all_modifiers_on_entity(&mut self, entity: EntityId) {
        self.push(AttributeCommand::RemoveAllModifiersOnEntity { entity });
    }

    pub fn remove_all_modifiers_affecting_attribute(&mut self, attribute: AttributeReference) {
        self.push(AttributeCommand::RemoveAllModifiersAffectingAttribute { attribute });
    }

    pub fn remove_all_modifiers_observing_entity(
        &mut self,
        entity: EntityId,
        observed_entity: EntityId,
    ) {
        self.push(AttributeCommand::RemoveAllModifiersObservingEntity {
            entity,
            observed_entity,
        });
    }

    pub fn remove_all_modifiers_observing_attribute(
        &mut self,
        entity: EntityId,
        observed_attribute: AttributeReference,
    ) {
        self.push(AttributeCommand::RemoveAllModifiersObservingAttribute {
            entity,
            observed_attribute,
        });
    }

    /// Moves every command of `other` to the end of this buffer.
    pub fn append(&mut self, other: &mut Self) {
        self.commands.append(&mut other.commands);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeCommand<M>> {
        self.commands.iter()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl<M: Modifier> AttributeCommandBuffer<M> {
    /// Queues one recalculation per surviving observer of destroyed entities.
    ///
    /// Consumes the cleanup records in `graph`. Returns how many commands were queued.
    pub fn record_orphaned_cleanups(&mut self, graph: &mut AttributeGraph<M>) -> usize {
        let observers = graph.drain_orphaned_cleanups();
        for observer in &observers {
            self.recalculate_attribute_and_all_observers(*observer);
        }
        observers.len()
    }

    /// Processes and removes every command in recording order.
    ///
    /// A failing command does not stop playback; its error is collected in
    /// the report and logged at a level matching its severity.
    pub fn playback<St>(
        &mut self,
        changer: &mut AttributeChanger<'_, M, St>,
        notifications: &mut NotificationBuffers,
    ) -> PlaybackReport
    where
        St: AttributeStore + ?Sized,
    {
        let mut report = PlaybackReport::default();
        for command in self.commands.drain(..) {
            let name = command.name();
            match command.process(changer, notifications) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    if error.severity().is_recoverable() {
                        tracing::debug!(command = name, %error, "deferred command skipped");
                    } else {
                        tracing::warn!(
                            command = name,
                            code = error.error_code(),
                            severity = error.severity().as_str(),
                            %error,
                            "deferred command failed"
                        );
                    }
                    report.failed += 1;
                    report.errors.push(error);
                }
            }
        }

        if report.applied + report.failed > 0 {
            tracing::trace!(
                applied = report.applied,
                failed = report.failed,
                "played back attribute commands"
            );
        }
        report
    }
}

#[cfg(feature = "serde")]
impl<M> AttributeCommandBuffer<M>
where
    M: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Encodes the recorded commands with bincode.
    pub fn to_bytes(&self) -> crate::error::Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| AttributeError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        bincode::deserialize(bytes).map_err(|e| AttributeError::Serialization(e.to_string()))
    }
}
