//! Recalculation engine.
//!
//! [`AttributeChanger`] is the only entry point that mutates attribute values,
//! modifiers and observer edges. It exclusively borrows the attribute store
//! and the graph for its lifetime, so one changer scope is one atomic cascade:
//! nothing else can observe the graph half-updated.
//!
//! # Operation flow
//!
//! ```text
//! mutation (base value / add / remove modifier)
//!      ↓
//! modifier + observer buffers updated
//!      ↓
//! target attribute recomputed from its modifiers
//!      ↓
//! every transitive observer recomputed, in dependency order
//! ```

mod cascade;
mod cycle;
mod modifiers;

use crate::config::AttributeConfig;
use crate::error::{AttributeError, Result};
use crate::state::{AttributeGraph, AttributeReference, AttributeValues, Modifier};
use crate::store::AttributeStore;

/// Drives value changes, modifier application, cascades and cycle rejection.
pub struct AttributeChanger<'w, M, St: ?Sized> {
    store: &'w mut St,
    graph: &'w mut AttributeGraph<M>,
    config: AttributeConfig,
}

impl<'w, M, St> AttributeChanger<'w, M, St>
where
    M: Modifier,
    St: AttributeStore + ?Sized,
{
    pub fn new(store: &'w mut St, graph: &'w mut AttributeGraph<M>) -> Self {
        Self::with_config(store, graph, AttributeConfig::default())
    }

    pub fn with_config(
        store: &'w mut St,
        graph: &'w mut AttributeGraph<M>,
        config: AttributeConfig,
    ) -> Self {
        Self {
            store,
            graph,
            config,
        }
    }

    pub fn store(&self) -> &St {
        self.store
    }

    pub fn graph(&self) -> &AttributeGraph<M> {
        self.graph
    }

    pub fn config(&self) -> &AttributeConfig {
        &self.config
    }

    /// Overwrites the base value of `attribute`.
    ///
    /// With `auto_recalculate` and registered buffers the attribute and all
    /// its observers are recomputed. Without buffers there are no modifiers,
    /// so the derived value simply follows the base value.
    ///
    /// Fails only if the slot is missing or rejects the base value. Once the
    /// base value is stored, a failing recalculation is logged and the call
    /// still succeeds.
    pub fn set_base_value(
        &mut self,
        attribute: AttributeReference,
        base_value: f32,
        auto_recalculate: bool,
    ) -> Result<()> {
        let values = self.values_or_missing(attribute)?;
        self.write_base_value(attribute, values, base_value, auto_recalculate)
    }

    /// Adds `delta` to the base value of `attribute`. See [`Self::set_base_value`].
    pub fn add_base_value(
        &mut self,
        attribute: AttributeReference,
        delta: f32,
        auto_recalculate: bool,
    ) -> Result<()> {
        let values = self.values_or_missing(attribute)?;
        let base_value = values.base_value + delta;
        self.write_base_value(attribute, values, base_value, auto_recalculate)
    }

    fn write_base_value(
        &mut self,
        attribute: AttributeReference,
        mut values: AttributeValues,
        base_value: f32,
        auto_recalculate: bool,
    ) -> Result<()> {
        values.base_value = base_value;
        let has_buffers = self.graph.contains(attribute.entity);
        if !has_buffers {
            values.value = base_value;
        }
        self.write_values(attribute, values)?;

        if auto_recalculate && has_buffers {
            self.recalculate_after_commit(attribute);
        }
        Ok(())
    }

    /// Cascades from `attribute` after a mutation that has already been stored.
    ///
    /// The mutation stays in place whatever happens here, so errors are logged
    /// instead of returned. A vanished slot is expected during teardown.
    pub(crate) fn recalculate_after_commit(&mut self, attribute: AttributeReference) {
        match self.recalculate_attribute_and_all_observers(attribute) {
            Ok(()) => {}
            Err(error) if error.severity().is_recoverable() => {
                tracing::debug!(%attribute, %error, "skipping recalculation after change");
            }
            Err(error) => {
                tracing::warn!(
                    %attribute,
                    code = error.error_code(),
                    %error,
                    "recalculation after committed change failed"
                );
            }
        }
    }

    pub(crate) fn values_or_missing(
        &self,
        attribute: AttributeReference,
    ) -> Result<AttributeValues> {
        self.store
            .attribute_values(attribute)
            .ok_or(AttributeError::MissingAttribute { attribute })
    }

    pub(crate) fn write_values(
        &mut self,
        attribute: AttributeReference,
        values: AttributeValues,
    ) -> Result<()> {
        if self.store.set_attribute_values(attribute, values) {
            return Ok(());
        }
        tracing::warn!(%attribute, "attribute store rejected write");
        Err(AttributeError::StoreRejected { attribute })
    }
}
