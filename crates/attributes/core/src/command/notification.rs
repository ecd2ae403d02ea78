//! Per-entity inboxes for results of deferred commands.

use std::collections::HashMap;

use crate::state::{EntityId, ModifierReference};

/// Where to report the handle of a deferred `AddModifier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NotificationTarget {
    pub entity: EntityId,
    /// Caller-chosen token echoed back in the notification.
    pub correlation_id: u64,
}

impl NotificationTarget {
    pub const fn new(entity: EntityId, correlation_id: u64) -> Self {
        Self {
            entity,
            correlation_id,
        }
    }
}

/// Reports the handle a deferred `AddModifier` produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierNotification {
    pub reference: ModifierReference,
    pub correlation_id: u64,
}

/// Notification buffers keyed by receiving entity.
///
/// Only registered entities receive notifications; pushes to anyone else are
/// dropped, mirroring a receiver that was destroyed before playback.
#[derive(Clone, Debug, Default)]
pub struct NotificationBuffers {
    buffers: HashMap<EntityId, Vec<ModifierNotification>>,
}

impl NotificationBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer for `entity`. Returns false if one exists.
    pub fn register(&mut self, entity: EntityId) -> bool {
        if self.buffers.contains_key(&entity) {
            return false;
        }
        self.buffers.insert(entity, Vec::new());
        true
    }

    pub fn unregister(&mut self, entity: EntityId) -> Option<Vec<ModifierNotification>> {
        self.buffers.remove(&entity)
    }

    pub fn is_registered(&self, entity: EntityId) -> bool {
        self.buffers.contains_key(&entity)
    }

    /// Appends `notification` to `entity`'s buffer. Returns false if unregistered.
    pub fn push(&mut self, entity: EntityId, notification: ModifierNotification) -> bool {
        let Some(buffer) = self.buffers.get_mut(&entity) else {
            tracing::debug!(
                %entity,
                reference = %notification.reference,
                "dropping notification for unregistered entity"
            );
            return false;
        };
        buffer.push(notification);
        true
    }

    pub fn pending(&self, entity: EntityId) -> &[ModifierNotification] {
        self.buffers
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Takes every pending notification of `entity`, oldest first.
    pub fn drain(&mut self, entity: EntityId) -> Vec<ModifierNotification> {
        self.buffers
            .get_mut(&entity)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}
