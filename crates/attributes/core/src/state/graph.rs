//! Per-entity attribute buffers and the observer graph spanning them.

use std::collections::{BTreeMap, HashMap};

use super::observer::{self, AttributeObserver, AttributeObserverCleanup};
use super::{
    AttributeReference, AttributesOwner, EntityId, Modifier, ModifierEntry, ModifierReference,
    ObservedAttributes,
};
use crate::error::{AttributeError, Result};

/// Buffers created together when an entity becomes an attribute owner.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityAttributes<M> {
    pub owner: AttributesOwner,
    /// Modifiers in insertion order, except where swap-back removal reordered them.
    pub modifiers: Vec<ModifierEntry<M>>,
    /// Incoming edges: attributes that must be recomputed when ours change.
    pub observers: Vec<AttributeObserver>,
}

impl<M> EntityAttributes<M> {
    pub fn new() -> Self {
        Self {
            owner: AttributesOwner::new(),
            modifiers: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Observer edges whose observed attribute type is `attribute`'s.
    pub fn observers_of(
        &self,
        attribute: AttributeReference,
    ) -> impl Iterator<Item = &AttributeObserver> + '_ {
        self.observers
            .iter()
            .filter(move |edge| edge.observed_attribute_type == attribute.attribute_type)
    }
}

impl<M> Default for EntityAttributes<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// All attribute owners plus the cleanup records that outlive them.
///
/// Edges are plain [`AttributeReference`] values, so the graph stays valid when
/// buffers grow or entries are swap-removed.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeGraph<M> {
    entities: HashMap<EntityId, EntityAttributes<M>>,
    cleanups: BTreeMap<EntityId, Vec<AttributeObserverCleanup>>,
    /// Observers whose dependency owner was destroyed, awaiting the next drain.
    orphaned_observers: Vec<AttributeReference>,
}

impl<M> Default for AttributeGraph<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> AttributeGraph<M> {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            cleanups: BTreeMap::new(),
            orphaned_observers: Vec::new(),
        }
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn entity(&self, entity: EntityId) -> Option<&EntityAttributes<M>> {
        self.entities.get(&entity)
    }

    pub fn entity_mut(&mut self, entity: EntityId) -> Option<&mut EntityAttributes<M>> {
        self.entities.get_mut(&entity)
    }

    pub(crate) fn entity_or_missing(
        &mut self,
        entity: EntityId,
    ) -> Result<&mut EntityAttributes<M>> {
        self.entities
            .get_mut(&entity)
            .ok_or(AttributeError::MissingBuffers { entity })
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn modifiers(&self, entity: EntityId) -> Option<&[ModifierEntry<M>]> {
        self.entities
            .get(&entity)
            .map(|attributes| attributes.modifiers.as_slice())
    }

    pub fn observers(&self, entity: EntityId) -> Option<&[AttributeObserver]> {
        self.entities
            .get(&entity)
            .map(|attributes| attributes.observers.as_slice())
    }

    /// Resolves a handle to its modifier, wherever swap-back moved it.
    pub fn modifier(&self, reference: &ModifierReference) -> Option<&ModifierEntry<M>> {
        self.entities
            .get(&reference.affected_attribute.entity)?
            .modifiers
            .iter()
            .find(|entry| entry.matches(reference))
    }

    /// Reference count of the edge "`observer` observes `observed`" (0 if absent).
    pub fn observer_count(
        &self,
        observer: AttributeReference,
        observed: AttributeReference,
    ) -> u32 {
        self.entities
            .get(&observed.entity)
            .and_then(|attributes| {
                attributes
                    .observers
                    .iter()
                    .find(|edge| edge.is_edge(observer, observed.attribute_type))
            })
            .map_or(0, |edge| edge.count)
    }

    /// Foreign observers recorded against `entity`.
    pub fn cleanup_entries(&self, entity: EntityId) -> &[AttributeObserverCleanup] {
        self.cleanups
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records that `observer` depends on `observed`.
    ///
    /// Cross-entity edges also leave a cleanup entry on the observed entity.
    pub fn add_or_increment_observer(
        &mut self,
        observer: AttributeReference,
        observed: AttributeReference,
    ) -> Result<()> {
        let attributes = self.entity_or_missing(observed.entity)?;
        observer::add_or_increment(
            &mut attributes.observers,
            observer,
            observed.attribute_type,
        );

        if observer.entity != observed.entity {
            let entries = self.cleanups.entry(observed.entity).or_default();
            let entry = AttributeObserverCleanup {
                observer_attribute: observer,
            };
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        Ok(())
    }

    /// Releases one reference of the edge "`observer` observes `observed`".
    ///
    /// Missing buffers or edges are ignored: the observed entity may already
    /// have been destroyed. Returns true if the edge was removed.
    pub fn remove_or_decrement_observer(
        &mut self,
        observer: AttributeReference,
        observed: AttributeReference,
    ) -> bool {
        let Some(attributes) = self.entities.get_mut(&observed.entity) else {
            return false;
        };
        if !observer::remove_or_decrement(
            &mut attributes.observers,
            observer,
            observed.attribute_type,
        ) {
            return false;
        }

        let still_observing = attributes
            .observers
            .iter()
            .any(|edge| edge.observer_attribute == observer);
        if observer.entity != observed.entity && !still_observing {
            self.prune_cleanup(observed.entity, observer);
        }
        true
    }

    /// Releases every edge a modifier on `observer` created.
    pub fn release_observed(
        &mut self,
        observer: AttributeReference,
        observed: &ObservedAttributes,
    ) {
        for observed_attribute in observed {
            self.remove_or_decrement_observer(observer, *observed_attribute);
        }
    }

    fn prune_cleanup(&mut self, observed_entity: EntityId, observer: AttributeReference) {
        if let Some(entries) = self.cleanups.get_mut(&observed_entity) {
            if let Some(index) = entries
                .iter()
                .position(|entry| entry.observer_attribute == observer)
            {
                entries.swap_remove(index);
            }
            if entries.is_empty() {
                self.cleanups.remove(&observed_entity);
            }
        }
    }
}

impl<M: Modifier> AttributeGraph<M> {
    /// Creates the owner, modifier and observer buffers for `entity`.
    ///
    /// Returns false if the entity already owns attributes. Cleanup records
    /// left behind by a destroyed entity with the same id are orphaned first,
    /// so the new owner never inherits dependencies of the old one.
    pub fn register_owner(&mut self, entity: EntityId) -> bool {
        if self.entities.contains_key(&entity) {
            return false;
        }
        if self.cleanups.contains_key(&entity) {
            tracing::debug!(%entity, "entity id reused before cleanup pass");
            self.orphan_cleanups(entity);
        }
        self.entities.insert(entity, EntityAttributes::new());
        true
    }

    /// Drops every buffer of `entity` except its cleanup records.
    ///
    /// Edges the entity's own modifiers registered on other entities are
    /// released first, so no observer registration outlives its modifier.
    pub fn destroy_entity(&mut self, entity: EntityId) -> Option<EntityAttributes<M>> {
        let attributes = self.entities.remove(&entity)?;

        for entry in &attributes.modifiers {
            let observer = AttributeReference::new(entity, entry.affected_attribute_type);
            let observed = entry.modifier.collect_observed();
            self.release_observed(observer, &observed);
        }

        tracing::debug!(
            %entity,
            modifiers = attributes.modifiers.len(),
            foreign_observers = self.cleanup_entries(entity).len(),
            "destroyed attribute owner"
        );
        Some(attributes)
    }

    /// Consumes the cleanup records of destroyed entities.
    ///
    /// Returns each surviving observer attribute that lost a dependency, once,
    /// sorted. The modifiers that read the destroyed entity are already gone
    /// from those observers; recalculating them brings their values up to date.
    pub fn drain_orphaned_cleanups(&mut self) -> Vec<AttributeReference> {
        let destroyed: Vec<EntityId> = self
            .cleanups
            .keys()
            .copied()
            .filter(|entity| !self.entities.contains_key(entity))
            .collect();
        for entity in destroyed {
            self.orphan_cleanups(entity);
        }

        let mut observers = std::mem::take(&mut self.orphaned_observers);
        observers.retain(|observer| self.entities.contains_key(&observer.entity));
        observers.sort_unstable();
        observers.dedup();
        observers
    }

    /// Drops the modifiers that read the destroyed `entity` and queues their
    /// owners for recalculation.
    ///
    /// The observer edges of those modifiers lived on `entity` and vanished
    /// with it; edges they held on other entities are released here.
    fn orphan_cleanups(&mut self, entity: EntityId) {
        let Some(entries) = self.cleanups.remove(&entity) else {
            return;
        };

        for entry in entries {
            let observer = entry.observer_attribute;
            let Some(attributes) = self.entities.get_mut(&observer.entity) else {
                continue;
            };

            let mut released: Vec<ObservedAttributes> = Vec::new();
            for index in (0..attributes.modifiers.len()).rev() {
                let candidate = &attributes.modifiers[index];
                if candidate.affected_attribute_type != observer.attribute_type {
                    continue;
                }
                let observed = candidate.modifier.collect_observed();
                if observed.iter().any(|dependency| dependency.entity == entity) {
                    attributes.modifiers.swap_remove(index);
                    released.push(observed);
                }
            }
            for observed in &released {
                self.release_observed(observer, observed);
            }

            tracing::trace!(
                %entity,
                %observer,
                dropped = released.len(),
                "orphaned observer of destroyed entity"
            );
            self.orphaned_observers.push(observer);
        }
        tracing::debug!(%entity, "consumed cleanup records of destroyed entity");
    }
}
