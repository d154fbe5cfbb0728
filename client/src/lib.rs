//! # Ballast Client
//! Keeps a replica of the server's world, shows local inventory and
//! component changes immediately, claims them from the server and reconciles
//! with the authoritative answer once a short correction window has passed.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use ballast_shared::{
        ComponentKind, ComponentState, EventId, EventPayload, GameInstant, NetEntityId, World,
    };
}

mod client;
mod client_config;
mod error;
mod prediction;

pub use client::{BufferedComponent, Client, MAX_PENDING_CLAIMS};
pub use client_config::ClientConfig;
pub use error::ClientError;
pub use prediction::{CorrectionWindow, PredictionCorrector, Resolution};
