//! Cycle rejection for new dependency edges.

use std::collections::HashSet;

use super::AttributeChanger;
use crate::error::{AttributeError, Result};
use crate::state::{AttributeReference, Modifier};
use crate::store::AttributeStore;

impl<M, St> AttributeChanger<'_, M, St>
where
    M: Modifier,
    St: AttributeStore + ?Sized,
{
    /// Returns true if making `attribute` observe `observed` would close a loop.
    ///
    /// That is the case when the two are the same attribute, or when
    /// `observed` already (directly or transitively) observes `attribute`.
    pub fn would_create_cycle(
        &self,
        attribute: AttributeReference,
        observed: AttributeReference,
    ) -> Result<bool> {
        if attribute == observed {
            return Ok(true);
        }
        let mut visited = HashSet::new();
        self.is_observed_by(attribute, observed, 0, &mut visited)
    }

    /// Depth-first walk over the observer edges of `attribute`, looking for `candidate`.
    ///
    /// `visited` keeps shared sub-graphs from being walked twice, and the depth
    /// guard bounds the walk even if a cycle slipped into the graph.
    fn is_observed_by(
        &self,
        attribute: AttributeReference,
        candidate: AttributeReference,
        depth: usize,
        visited: &mut HashSet<AttributeReference>,
    ) -> Result<bool> {
        if depth > self.config.max_graph_depth {
            tracing::warn!(%attribute, depth, "observer walk exceeds depth guard");
            return Err(AttributeError::GraphTooDeep { attribute, depth });
        }

        for observer in self.direct_observers(attribute) {
            if observer == candidate {
                return Ok(true);
            }
            if visited.insert(observer)
                && self.is_observed_by(observer, candidate, depth + 1, visited)?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::AttributeChanger;
    use crate::state::{AttributeGraph, AttributeReference, AttributeType, EntityId};
    use crate::stats::StatModifier;
    use crate::store::AttributeTable;

    fn attr(entity: u32, attribute: i32) -> AttributeReference {
        AttributeReference::new(EntityId(entity), AttributeType(attribute))
    }

    fn setup() -> (AttributeTable, AttributeGraph<StatModifier>) {
        let mut table = AttributeTable::new();
        let mut graph = AttributeGraph::new();
        for entity in 1..=3 {
            graph.register_owner(EntityId(entity));
            for attribute in 0..2 {
                table.insert(attr(entity, attribute), 1.0);
            }
        }
        (table, graph)
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let (mut table, mut graph) = setup();
        let changer = AttributeChanger::new(&mut table, &mut graph);

        assert!(changer.would_create_cycle(attr(1, 0), attr(1, 0)).unwrap());
        assert!(!changer.would_create_cycle(attr(1, 0), attr(1, 1)).unwrap());
    }

    #[test]
    fn transitive_dependency_is_a_cycle() {
        let (mut table, mut graph) = setup();
        let mut changer = AttributeChanger::new(&mut table, &mut graph);

        // 2 reads 1, 3 reads 2.
        changer
            .add_modifier(attr(2, 0), StatModifier::add_attribute(attr(1, 0), 1.0), true)
            .unwrap();
        changer
            .add_modifier(attr(3, 0), StatModifier::add_attribute(attr(2, 0), 1.0), true)
            .unwrap();

        assert!(changer.would_create_cycle(attr(1, 0), attr(3, 0)).unwrap());
        assert!(changer.would_create_cycle(attr(1, 0), attr(2, 0)).unwrap());
        assert!(!changer.would_create_cycle(attr(3, 0), attr(1, 0)).unwrap());
        // Other attribute types on the same entities are independent.
        assert!(!changer.would_create_cycle(attr(1, 1), attr(3, 0)).unwrap());
    }

    #[test]
    fn depth_guard_bounds_the_walk() {
        let (mut table, mut graph) = setup();
        let mut changer = AttributeChanger::new(&mut table, &mut graph);
        changer
            .add_modifier(attr(2, 0), StatModifier::add_attribute(attr(1, 0), 1.0), true)
            .unwrap();
        changer
            .add_modifier(attr(3, 0), StatModifier::add_attribute(attr(2, 0), 1.0), true)
            .unwrap();

        let config = crate::AttributeConfig::new().with_max_graph_depth(0);
        let changer = AttributeChanger::with_config(&mut table, &mut graph, config);
        let error = changer.would_create_cycle(attr(1, 0), attr(1, 1)).unwrap_err();

        assert_eq!(error.error_code(), "graph_too_deep");
        assert!(!changer.would_create_cycle(attr(3, 0), attr(1, 1)).unwrap());
    }
}
