mod error;
mod event_log;

pub use error::EventLogError;
pub use event_log::{EntityEventLog, EventLogConfig, RetentionMode};
