use super::{ModifierEntry, ModifierId};

/// Per-entity record that hands out modifier IDs.
///
/// The counter only grows until it reaches the configured ceiling. After that
/// IDs are recycled from gaps left by removed modifiers, re-validated against
/// every ID still in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributesOwner {
    pub modifier_id_counter: u32,
}

impl AttributesOwner {
    pub const fn new() -> Self {
        Self {
            modifier_id_counter: 0,
        }
    }

    /// Reserves the next modifier ID not used by `modifiers`.
    ///
    /// Returns `None` only when every ID in `1..=limit` is taken.
    pub fn allocate_id<M>(
        &mut self,
        modifiers: &[ModifierEntry<M>],
        limit: u32,
    ) -> Option<ModifierId> {
        let limit = limit.max(1);
        let in_use = |id: u32| modifiers.iter().any(|entry| entry.id.0 == id);

        if let Some(next) = self
            .modifier_id_counter
            .checked_add(1)
            .filter(|next| *next <= limit)
            && !in_use(next)
        {
            self.modifier_id_counter = next;
            return Some(ModifierId(next));
        }

        let mut used: Vec<u32> = modifiers
            .iter()
            .map(|entry| entry.id.0)
            .filter(|id| (1..=limit).contains(id))
            .collect();
        used.sort_unstable();
        used.dedup();

        // Prefer IDs above the counter so recently freed IDs are not reused first.
        let counter = self.modifier_id_counter.min(limit);
        let recycled = first_gap(&used, u64::from(counter) + 1, u64::from(limit))
            .or_else(|| first_gap(&used, 1, u64::from(counter)))?;

        self.modifier_id_counter = recycled;
        Some(ModifierId(recycled))
    }
}

/// Smallest value in `low..=high` missing from the sorted, deduplicated `used`.
fn first_gap(used: &[u32], low: u64, high: u64) -> Option<u32> {
    let mut candidate = low;
    for &id in used {
        let id = u64::from(id);
        if id < candidate {
            continue;
        }
        if id > candidate {
            break;
        }
        candidate += 1;
    }
    if candidate <= high {
        u32::try_from(candidate).ok()
    } else {
        None
    }
}
