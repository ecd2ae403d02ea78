//! Adding and removing modifiers, and keeping observer edges in step.
//!
//! Every stored modifier holds exactly one reference on each edge
//! `(affected attribute, observed attribute)` it reads, so the edge count
//! always equals the number of live modifiers depending on it.

use super::AttributeChanger;
use crate::error::{AttributeError, Result};
use crate::state::{
    AttributeReference, EntityId, Modifier, ModifierEntry, ModifierReference, ObservedAttributes,
};
use crate::store::AttributeStore;

impl<M, St> AttributeChanger<'_, M, St>
where
    M: Modifier,
    St: AttributeStore + ?Sized,
{
    /// Stores `modifier` on `attribute` and registers its dependencies.
    ///
    /// Every check (buffers, slots, cycles, IDs) runs before anything is
    /// mutated, so a rejected add leaves the graph untouched. Once the modifier
    /// is stored its handle is returned, even if the recalculation that
    /// follows fails; that failure is logged.
    pub fn add_modifier(
        &mut self,
        attribute: AttributeReference,
        modifier: M,
        auto_recalculate: bool,
    ) -> Result<ModifierReference> {
        if !self.graph.contains(attribute.entity) {
            return Err(AttributeError::MissingBuffers {
                entity: attribute.entity,
            });
        }
        self.values_or_missing(attribute)?;

        let observed = modifier.collect_observed();
        for dependency in &observed {
            if !self.graph.contains(dependency.entity) {
                tracing::debug!(%attribute, %dependency, "dependency owner has no buffers");
                return Err(AttributeError::MissingBuffers {
                    entity: dependency.entity,
                });
            }
            if self.would_create_cycle(attribute, *dependency)? {
                tracing::warn!(
                    %attribute,
                    %dependency,
                    "rejecting modifier: dependency would create a cycle"
                );
                return Err(AttributeError::CycleDetected {
                    attribute,
                    observed: *dependency,
                });
            }
        }

        let limit = self.config.max_modifier_id;
        let attributes = self.graph.entity_or_missing(attribute.entity)?;
        let previous_counter = attributes.owner.modifier_id_counter;
        let Some(id) = attributes
            .owner
            .allocate_id(&attributes.modifiers, limit)
        else {
            tracing::error!(
                entity = %attribute.entity,
                limit,
                live = attributes.modifiers.len(),
                "modifier ids exhausted"
            );
            return Err(AttributeError::ModifierIdsExhausted {
                entity: attribute.entity,
                limit,
            });
        };
        if previous_counter.checked_add(1) != Some(id.0) {
            tracing::debug!(entity = %attribute.entity, id = %id, "recycled modifier id");
        }

        attributes
            .modifiers
            .push(ModifierEntry::new(id, attribute.attribute_type, modifier));
        for dependency in &observed {
            self.graph.add_or_increment_observer(attribute, *dependency)?;
        }

        let reference = ModifierReference::new(attribute, id);
        tracing::trace!(%reference, dependencies = observed.len(), "added modifier");

        if auto_recalculate {
            self.recalculate_after_commit(attribute);
        }
        Ok(reference)
    }

    /// Removes the modifier `reference` points at and releases its edges.
    pub fn remove_modifier(
        &mut self,
        reference: ModifierReference,
        auto_recalculate: bool,
    ) -> Result<()> {
        let attribute = reference.affected_attribute;
        let attributes = self.graph.entity_or_missing(attribute.entity)?;
        let index = attributes
            .modifiers
            .iter()
            .position(|entry| entry.matches(&reference))
            .ok_or(AttributeError::ModifierNotFound { reference })?;

        let entry = attributes.modifiers.swap_remove(index);
        let observed = entry.modifier.collect_observed();
        self.graph.release_observed(attribute, &observed);
        tracing::trace!(%reference, "removed modifier");

        if auto_recalculate {
            self.recalculate_after_commit(attribute);
        }
        Ok(())
    }

    /// Removes every modifier stored on `entity`. Returns how many were removed.
    pub fn remove_all_modifiers_on_entity(
        &mut self,
        entity: EntityId,
        auto_recalculate: bool,
    ) -> Result<usize> {
        self.remove_modifiers_where(entity, auto_recalculate, |_, _| true)
    }

    /// Removes every modifier affecting `attribute`.
    pub fn remove_all_modifiers_affecting_attribute(
        &mut self,
        attribute: AttributeReference,
        auto_recalculate: bool,
    ) -> Result<usize> {
        self.remove_modifiers_where(attribute.entity, auto_recalculate, |entry, _| {
            entry.affected_attribute_type == attribute.attribute_type
        })
    }

    /// Removes every modifier on `entity` that reads any attribute of `observed_entity`.
    pub fn remove_all_modifiers_observing_entity(
        &mut self,
        entity: EntityId,
        observed_entity: EntityId,
        auto_recalculate: bool,
    ) -> Result<usize> {
        self.remove_modifiers_where(entity, auto_recalculate, |_, observed| {
            observed
                .iter()
                .any(|dependency| dependency.entity == observed_entity)
        })
    }

    /// Removes every modifier on `entity` that reads `observed_attribute`.
    pub fn remove_all_modifiers_observing_attribute(
        &mut self,
        entity: EntityId,
        observed_attribute: AttributeReference,
        auto_recalculate: bool,
    ) -> Result<usize> {
        self.remove_modifiers_where(entity, auto_recalculate, |_, observed| {
            observed.contains(&observed_attribute)
        })
    }

    fn remove_modifiers_where<F>(
        &mut self,
        entity: EntityId,
        auto_recalculate: bool,
        mut predicate: F,
    ) -> Result<usize>
    where
        F: FnMut(&ModifierEntry<M>, &ObservedAttributes) -> bool,
    {
        let attributes = self.graph.entity_or_missing(entity)?;

        let mut removed: Vec<(AttributeReference, ObservedAttributes)> = Vec::new();
        for index in (0..attributes.modifiers.len()).rev() {
            let entry = &attributes.modifiers[index];
            let observed = entry.modifier.collect_observed();
            if !predicate(entry, &observed) {
                continue;
            }
            let entry = attributes.modifiers.swap_remove(index);
            removed.push((
                AttributeReference::new(entity, entry.affected_attribute_type),
                observed,
            ));
        }

        let mut affected: Vec<AttributeReference> = Vec::new();
        for (attribute, observed) in &removed {
            self.graph.release_observed(*attribute, observed);
            if !affected.contains(attribute) {
                affected.push(*attribute);
            }
        }
        tracing::trace!(%entity, removed = removed.len(), "removed modifiers");

        if auto_recalculate {
            for attribute in affected {
                self.recalculate_after_commit(attribute);
            }
        }
        Ok(removed.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::AttributeChanger;
    use crate::error::AttributeError;
    use crate::state::{AttributeGraph, AttributeReference, AttributeType, EntityId, ModifierId};
    use crate::stats::StatModifier;
    use crate::store::AttributeTable;
    use crate::AttributeConfig;

    const HEALTH: AttributeType = AttributeType(0);
    const ARMOR: AttributeType = AttributeType(1);

    fn attr(entity: u32, attribute: AttributeType) -> AttributeReference {
        AttributeReference::new(EntityId(entity), attribute)
    }

    fn setup(entities: u32) -> (AttributeTable, AttributeGraph<StatModifier>) {
        let mut table = AttributeTable::new();
        let mut graph = AttributeGraph::new();
        for entity in 1..=entities {
            graph.register_owner(EntityId(entity));
            table.insert(attr(entity, HEALTH), 100.0);
            table.insert(attr(entity, ARMOR), 2.0);
        }
        (table, graph)
    }

    #[test]
    fn rejected_cycle_stores_nothing() {
        let (mut table, mut graph) = setup(2);
        let mut changer = AttributeChanger::new(&mut table, &mut graph);
        changer
            .add_modifier(attr(1, HEALTH), StatModifier::add_attribute(attr(2, HEALTH), 1.0), true)
            .unwrap();

        let error = changer
            .add_modifier(attr(2, HEALTH), StatModifier::add_attribute(attr(1, HEALTH), 1.0), true)
            .unwrap_err();

        assert!(matches!(error, AttributeError::CycleDetected { .. }));
        assert!(graph.modifiers(EntityId(2)).unwrap().is_empty());
        assert!(graph.observers(EntityId(1)).unwrap().is_empty());
        assert_eq!(graph.observer_count(attr(1, HEALTH), attr(2, HEALTH)), 1);
    }

    #[test]
    fn dependency_without_buffers_is_rejected() {
        let (mut table, mut graph) = setup(1);
        table.insert(attr(7, ARMOR), 3.0);
        let mut changer = AttributeChanger::new(&mut table, &mut graph);

        let modifier = StatModifier::multiply_by_attribute(attr(7, ARMOR));
        let error = changer
            .add_modifier(attr(1, HEALTH), modifier, true)
            .unwrap_err();

        assert_eq!(error, AttributeError::MissingBuffers { entity: EntityId(7) });
        assert!(graph.modifiers(EntityId(1)).unwrap().is_empty());
    }

    #[test]
    fn exhausted_ids_fail_without_storing() {
        let (mut table, mut graph) = setup(1);
        let config = AttributeConfig::new().with_max_modifier_id(2);
        let mut changer = AttributeChanger::with_config(&mut table, &mut graph, config);

        changer
            .add_modifier(attr(1, HEALTH), StatModifier::flat(1.0), false)
            .unwrap();
        let second = changer
            .add_modifier(attr(1, HEALTH), StatModifier::flat(2.0), false)
            .unwrap();
        let error = changer
            .add_modifier(attr(1, HEALTH), StatModifier::flat(3.0), false)
            .unwrap_err();
        assert!(matches!(error, AttributeError::ModifierIdsExhausted { .. }));

        changer.remove_modifier(second, false).unwrap();
        let recycled = changer
            .add_modifier(attr(1, HEALTH), StatModifier::flat(4.0), false)
            .unwrap();
        assert_eq!(recycled.id, ModifierId(2));
        assert_eq!(graph.modifiers(EntityId(1)).unwrap().len(), 2);
    }

    #[test]
    fn remove_unknown_modifier_is_not_found() {
        let (mut table, mut graph) = setup(1);
        let mut changer = AttributeChanger::new(&mut table, &mut graph);
        let reference = crate::ModifierReference::new(attr(1, HEALTH), ModifierId(42));

        let error = changer.remove_modifier(reference, true).unwrap_err();

        assert_eq!(error, AttributeError::ModifierNotFound { reference });
    }

    #[test]
    fn scoped_removals_only_touch_their_scope() {
        let (mut table, mut graph) = setup(3);
        let mut changer = AttributeChanger::new(&mut table, &mut graph);
        let target = attr(1, HEALTH);
        changer.add_modifier(target, StatModifier::flat(10.0), true).unwrap();
        changer
            .add_modifier(target, StatModifier::add_attribute(attr(2, HEALTH), 0.5), true)
            .unwrap();
        changer
            .add_modifier(target, StatModifier::add_attribute(attr(2, ARMOR), 1.0), true)
            .unwrap();
        changer
            .add_modifier(target, StatModifier::add_attribute(attr(3, ARMOR), 1.0), true)
            .unwrap();
        changer
            .add_modifier(attr(1, ARMOR), StatModifier::flat(1.0), true)
            .unwrap();
        // 100 + 10 + 50 + 2 + 2
        assert_eq!(changer.store().value(target), Some(164.0));

        let removed = changer
            .remove_all_modifiers_observing_attribute(EntityId(1), attr(2, ARMOR), true)
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(changer.store().value(target), Some(162.0));

        let removed = changer
            .remove_all_modifiers_observing_entity(EntityId(1), EntityId(2), true)
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(changer.store().value(target), Some(112.0));

        let removed = changer
            .remove_all_modifiers_affecting_attribute(target, true)
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(changer.store().value(target), Some(100.0));
        assert_eq!(changer.store().value(attr(1, ARMOR)), Some(3.0));

        let removed = changer
            .remove_all_modifiers_on_entity(EntityId(1), true)
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(changer.store().value(attr(1, ARMOR)), Some(2.0));

        assert!(graph.observers(EntityId(2)).unwrap().is_empty());
        assert!(graph.observers(EntityId(3)).unwrap().is_empty());
        assert!(graph.cleanup_entries(EntityId(2)).is_empty());
        assert!(graph.cleanup_entries(EntityId(3)).is_empty());
    }
}
