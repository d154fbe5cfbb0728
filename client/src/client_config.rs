use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// How long authoritative component states are held back after a local
    /// change to the same component. Zero applies them immediately.
    pub correction_delay: Duration,
    /// How long authoritative inventory states are held back after the client
    /// claimed a change to that inventory
    pub inventory_sync_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            correction_delay: Duration::from_millis(300),
            inventory_sync_delay: Duration::from_secs(1),
        }
    }
}
