//! # Ballast Server
//! The authoritative side of the ballast replication protocol: an ordered,
//! acknowledged log of entity events per connected user, validation of client
//! inventory and component claims, and distance and speed based throttling of
//! position updates.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;
pub mod shared {
    pub use ballast_shared::{
        AccessPolicy, Character, ComponentKind, ComponentState, EventId, EventKind, EventPayload,
        GameInstant, Inventory, InventoryAccess, InventoryOwner, InventorySlotClaim, Item,
        NetEntityId, RangeAccessPolicy, Vec2, World, WorldError,
    };
}

mod components;
mod error;
mod event_log;
mod events;
mod interest;
mod reconciler;
mod server;
mod user;

pub use components::merge_component_claim;
pub use error::{DisconnectReason, ProtocolError, ServerError};
pub use event_log::{EntityEventLog, EventLogConfig, EventLogError, RetentionMode};
pub use events::{
    ComponentClaim, ComponentClaimEvent, ConnectEvent, DisconnectEvent, Event, Events,
    ReconcileEvent,
};
pub use interest::{InterestThrottle, RecipientInterestState, ThrottleConfig, UpdateInterval};
pub use reconciler::{
    ClaimError, InventoryChange, InventoryReconciler, ReconcileConfig, ReconcileOutcome,
    Rejection, RejectionReason, Requester, AUDIT_TARGET,
};
pub use server::{Server, ServerConfig};
pub use user::{User, UserKey};
