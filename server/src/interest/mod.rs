mod throttle;

pub use throttle::{InterestThrottle, RecipientInterestState, ThrottleConfig, UpdateInterval};
