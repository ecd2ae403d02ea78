//! Error infrastructure for attributes-core.
//!
//! Every engine operation is a local, non-panicking computation. Failures are
//! returned as [`AttributeError`] and classified by [`ErrorSeverity`] so hosts
//! can decide whether to ignore, log, or escalate them.
//!
//! # Design Principles
//!
//! - **Check before mutate**: rejected requests (missing slots, cycles, exhausted
//!   IDs) fail before anything is stored
//! - **Committed means committed**: once a mutation is stored, a failing
//!   follow-up recalculation is logged and the call still returns `Ok`
//! - **Rich Context**: errors carry the attribute or entity they concern
//! - **Severity Classification**: missing slots are expected under destruction races

use crate::state::{AttributeReference, EntityId, ModifierReference};

/// How a caller should treat an [`AttributeError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// The addressed slot, buffer or handle is gone.
    ///
    /// Examples: modifier removed twice, observer recalculated after its
    /// owner was destroyed. Expected during entity teardown; safe to ignore.
    Recoverable,

    /// The request would break a graph invariant and was refused.
    ///
    /// Examples: dependency that closes a cycle, deferred command aimed at an
    /// entity that was never materialized.
    Validation,

    /// Store or graph disagree with what the engine expects.
    ///
    /// Examples: store refused a write to a slot it reported, dependency walk
    /// deeper than the configured guard.
    Internal,

    /// The owner cannot take further modifiers.
    ///
    /// Examples: every modifier ID up to the configured ceiling is in use.
    Fatal,
}

impl ErrorSeverity {
    /// Snake-case name used as a structured log field.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Missing targets only; the caller can drop the request and move on.
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// True for severities that point at a host or engine bug.
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Errors surfaced by the recalculation engine and the command layer.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AttributeError {
    #[error("attribute store has no slot for {attribute}")]
    MissingAttribute { attribute: AttributeReference },

    #[error("entity {entity} has no modifier/observer buffers")]
    MissingBuffers { entity: EntityId },

    #[error("modifier {reference} not found")]
    ModifierNotFound { reference: ModifierReference },

    #[error("adding a dependency of {attribute} on {observed} would create a cycle")]
    CycleDetected {
        attribute: AttributeReference,
        observed: AttributeReference,
    },

    #[error("observer graph below {attribute} exceeds depth {depth}")]
    GraphTooDeep {
        attribute: AttributeReference,
        depth: usize,
    },

    #[error("entity {entity} has no free modifier ids (limit {limit})")]
    ModifierIdsExhausted { entity: EntityId, limit: u32 },

    #[error("attribute store rejected write to {attribute}")]
    StoreRejected { attribute: AttributeReference },

    #[error("deferred {command} command targets missing entity {entity}")]
    StaleCommandTarget {
        command: &'static str,
        entity: EntityId,
    },

    #[error("command buffer encoding failed: {0}")]
    Serialization(String),
}

impl AttributeError {
    /// Returns the severity level of this error.
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingAttribute { .. }
            | Self::MissingBuffers { .. }
            | Self::ModifierNotFound { .. } => ErrorSeverity::Recoverable,
            Self::CycleDetected { .. } | Self::StaleCommandTarget { .. } => {
                ErrorSeverity::Validation
            }
            Self::GraphTooDeep { .. } | Self::StoreRejected { .. } | Self::Serialization(_) => {
                ErrorSeverity::Internal
            }
            Self::ModifierIdsExhausted { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns a static string identifier for this error variant.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAttribute { .. } => "missing_attribute",
            Self::MissingBuffers { .. } => "missing_buffers",
            Self::ModifierNotFound { .. } => "modifier_not_found",
            Self::CycleDetected { .. } => "cycle_detected",
            Self::GraphTooDeep { .. } => "graph_too_deep",
            Self::ModifierIdsExhausted { .. } => "modifier_ids_exhausted",
            Self::StoreRejected { .. } => "store_rejected",
            Self::StaleCommandTarget { .. } => "stale_command_target",
            Self::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T> = core::result::Result<T, AttributeError>;
