//! Recalculation of a single attribute and propagation to its observers.

use std::collections::HashSet;

use super::AttributeChanger;
use crate::error::Result;
use crate::state::{AttributeReference, Modifier, ModifierEntry, ModifierOutcome, ModifierStack};
use crate::store::AttributeStore;

impl<M, St> AttributeChanger<'_, M, St>
where
    M: Modifier,
    St: AttributeStore + ?Sized,
{
    /// Recomputes `attribute` from its modifiers, then every attribute that
    /// transitively observes it.
    ///
    /// Observers are recomputed once each, dependencies before dependents.
    /// Observers whose slot or buffers have vanished are skipped.
    pub fn recalculate_attribute_and_all_observers(
        &mut self,
        attribute: AttributeReference,
    ) -> Result<()> {
        self.recalculate_attribute(attribute)?;
        self.recalculate_all_observers(attribute)
    }

    /// Recomputes every transitive observer of `attribute` but not `attribute` itself.
    pub fn recalculate_all_observers(&mut self, attribute: AttributeReference) -> Result<()> {
        let order = self.cascade_order(attribute);
        if order.is_empty() {
            return Ok(());
        }

        tracing::trace!(%attribute, observers = order.len(), "propagating change");
        for observer in order {
            match self.recalculate_attribute(observer) {
                Ok(()) => {}
                Err(error) if error.severity().is_recoverable() => {
                    tracing::debug!(%observer, %error, "skipping observer during cascade");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }

    /// Replays the modifiers of one attribute and stores the new derived value.
    ///
    /// Modifiers are applied from last-added to first-added. A modifier whose
    /// dependencies cannot be read is swap-removed in the same pass and its
    /// observer edges are released, even if the store then rejects the write.
    pub(crate) fn recalculate_attribute(&mut self, attribute: AttributeReference) -> Result<()> {
        let mut values = self.values_or_missing(attribute)?;
        let attributes = self.graph.entity_or_missing(attribute.entity)?;

        let mut stack = M::Stack::default();
        stack.initialize();

        let mut dropped: Vec<ModifierEntry<M>> = Vec::new();
        for index in (0..attributes.modifiers.len()).rev() {
            let entry = &attributes.modifiers[index];
            if entry.affected_attribute_type != attribute.attribute_type {
                continue;
            }
            if entry.modifier.apply(&mut stack, &*self.store) == ModifierOutcome::Unresolved {
                // Elements above `index` were already visited, so swap-back is safe here.
                dropped.push(attributes.modifiers.swap_remove(index));
            }
        }

        values.value = stack.calculate_final_value(values.base_value);

        for entry in dropped {
            tracing::trace!(
                %attribute,
                modifier = %entry.id,
                "dropping modifier with unresolved dependency"
            );
            let observed = entry.modifier.collect_observed();
            self.graph.release_observed(attribute, &observed);
        }
        self.write_values(attribute, values)
    }

    /// Direct observers of `attribute` (edges filtered by observed type).
    pub(crate) fn direct_observers(
        &self,
        attribute: AttributeReference,
    ) -> Vec<AttributeReference> {
        self.graph
            .entity(attribute.entity)
            .map(|attributes| {
                attributes
                    .observers_of(attribute)
                    .map(|edge| edge.observer_attribute)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Transitive observers of `root` in dependency order (reverse post-order).
    ///
    /// Every observer appears once, after all of the observers it depends on
    /// within this cascade, so diamonds are recomputed a single time. The walk
    /// uses an explicit stack and a visited set, so it terminates on any graph
    /// and chain length is not limited.
    pub(crate) fn cascade_order(&self, root: AttributeReference) -> Vec<AttributeReference> {
        let mut visited = HashSet::from([root]);
        let mut post_order = Vec::new();
        let mut stack = vec![(root, self.direct_observers(root), 0usize)];

        while let Some((node, children, next)) = stack.last_mut() {
            if let Some(child) = children.get(*next).copied() {
                *next += 1;
                if visited.insert(child) {
                    let grandchildren = self.direct_observers(child);
                    stack.push((child, grandchildren, 0));
                }
            } else {
                let node = *node;
                stack.pop();
                if node != root {
                    post_order.push(node);
                }
            }
        }

        post_order.reverse();
        post_order
    }
}
