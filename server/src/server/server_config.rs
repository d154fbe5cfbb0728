use std::{default::Default, time::Duration};

use crate::{event_log::EventLogConfig, interest::ThrottleConfig, reconciler::ReconcileConfig};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Retention and resend behaviour of the entity event log
    pub event_log: EventLogConfig,
    /// Used to configure how often positions are sent to each user
    pub throttle: ThrottleConfig,
    /// Used to configure how client inventory claims are validated
    pub reconcile: ReconcileConfig,
    /// A user that leaves an event unacknowledged for this long is
    /// disconnected
    pub ack_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            event_log: EventLogConfig::default(),
            throttle: ThrottleConfig::default(),
            reconcile: ReconcileConfig::default(),
            ack_timeout: Duration::from_secs(10),
        }
    }
}
