use super::{AttributeReference, AttributeType};

/// Dependency edge stored on the owner of the observed attribute.
///
/// Reads as "recompute `observer_attribute` whenever this entity's
/// `observed_attribute_type` changes". `count` is the number of live modifiers
/// that introduced this dependency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeObserver {
    pub observer_attribute: AttributeReference,
    pub observed_attribute_type: AttributeType,
    pub count: u32,
}

impl AttributeObserver {
    pub const fn new(
        observer_attribute: AttributeReference,
        observed_attribute_type: AttributeType,
    ) -> Self {
        Self {
            observer_attribute,
            observed_attribute_type,
            count: 1,
        }
    }

    #[inline]
    pub fn is_edge(
        &self,
        observer_attribute: AttributeReference,
        observed_attribute_type: AttributeType,
    ) -> bool {
        self.observer_attribute == observer_attribute
            && self.observed_attribute_type == observed_attribute_type
    }
}

/// Foreign observer recorded on an observed entity.
///
/// Survives destruction of the entity's other buffers so the cleanup pass
/// knows which attributes elsewhere lost a dependency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeObserverCleanup {
    pub observer_attribute: AttributeReference,
}

/// Increments the `(observer, observed_type)` edge or appends it with count 1.
///
/// Returns true when a new edge was appended.
pub fn add_or_increment(
    observers: &mut Vec<AttributeObserver>,
    observer_attribute: AttributeReference,
    observed_attribute_type: AttributeType,
) -> bool {
    if let Some(edge) = observers
        .iter_mut()
        .find(|edge| edge.is_edge(observer_attribute, observed_attribute_type))
    {
        edge.count += 1;
        return false;
    }

    observers.push(AttributeObserver::new(
        observer_attribute,
        observed_attribute_type,
    ));
    true
}

/// Decrements the `(observer, observed_type)` edge, swap-removing it at zero.
///
/// Returns true when the edge was removed.
pub fn remove_or_decrement(
    observers: &mut Vec<AttributeObserver>,
    observer_attribute: AttributeReference,
    observed_attribute_type: AttributeType,
) -> bool {
    let Some(index) = observers
        .iter()
        .position(|edge| edge.is_edge(observer_attribute, observed_attribute_type))
    else {
        return false;
    };

    let edge = &mut observers[index];
    edge.count = edge.count.saturating_sub(1);
    if edge.count == 0 {
        observers.swap_remove(index);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EntityId;

    fn reference(entity: u32, attribute: i32) -> AttributeReference {
        AttributeReference::new(EntityId(entity), AttributeType(attribute))
    }

    #[test]
    fn shared_edge_survives_until_last_release() {
        let mut observers = Vec::new();
        let observer = reference(1, 0);

        assert!(add_or_increment(&mut observers, observer, AttributeType(2)));
        assert!(!add_or_increment(&mut observers, observer, AttributeType(2)));
        assert_eq!(observers.len(), 1);
        assert_eq!(observers[0].count, 2);

        assert!(!remove_or_decrement(&mut observers, observer, AttributeType(2)));
        assert_eq!(observers[0].count, 1);
        assert!(remove_or_decrement(&mut observers, observer, AttributeType(2)));
        assert!(observers.is_empty());
    }

    #[test]
    fn edges_are_keyed_by_observed_type() {
        let mut observers = Vec::new();
        let observer = reference(1, 0);

        add_or_increment(&mut observers, observer, AttributeType(2));
        add_or_increment(&mut observers, observer, AttributeType(3));

        assert_eq!(observers.len(), 2);
        assert!(!remove_or_decrement(&mut observers, observer, AttributeType(4)));
        assert_eq!(observers.len(), 2);
    }
}
