pub mod harness;

pub use assertions::{assert_clients_converged, assert_replica_matches};
pub use harness::{Direction, TestHarness};

pub const TICK: std::time::Duration = std::time::Duration::from_millis(50);

/// Installs a test logger once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
