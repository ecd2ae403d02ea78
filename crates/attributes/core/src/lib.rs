//! Attribute values, modifiers and the observer graph that keeps them consistent.
//!
//! Entities own numeric attributes. Each attribute has a base value and a
//! derived value computed by replaying the modifiers that affect it. A
//! modifier may read other attributes, which registers an observer edge so a
//! change to the source is propagated to everything that depends on it.
//!
//! # Architecture
//!
//! ```text
//! AttributeStore      (host-owned base/derived values)
//!        ↑ read/write
//! AttributeChanger    (engine: cascade, cycle rejection, modifier CRUD)
//!        ↓ &mut
//! AttributeGraph      (per-entity owner, modifier and observer buffers)
//!
//! AttributeCommandBuffer ──playback──▶ AttributeChanger
//! ```
//!
//! - [`state`]: identifiers, modifier entries, observer edges and the graph
//! - [`engine`]: [`AttributeChanger`], the only mutation entry point
//! - [`command`]: deferred commands, buffers and notifications
//! - [`store`]: value storage traits and the map-backed [`AttributeTable`]
//! - [`stats`]: the reference modifier arithmetic ([`StatStack`], [`StatModifier`])

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod stats;
pub mod store;

pub use command::{
    AttributeCommand, AttributeCommandBuffer, ModifierNotification, NotificationBuffers,
    NotificationTarget, PlaybackReport,
};
pub use config::AttributeConfig;
pub use engine::AttributeChanger;
pub use error::{AttributeError, ErrorSeverity, Result};
pub use state::{
    AttributeGraph, AttributeObserver, AttributeObserverCleanup, AttributeReference,
    AttributeType, AttributeValues, AttributesOwner, EntityAttributes, EntityId, Modifier,
    ModifierEntry, ModifierId, ModifierOutcome, ModifierReference, ModifierStack,
    ObservedAttributes,
};
pub use stats::{StatModifier, StatStack};
pub use store::{AttributeReader, AttributeStore, AttributeTable};
