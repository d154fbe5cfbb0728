mod error;
mod outcome;
mod reconciler;

pub use error::ClaimError;
pub use outcome::{InventoryChange, ReconcileOutcome, Rejection, RejectionReason, Requester};
pub use reconciler::{InventoryReconciler, ReconcileConfig, AUDIT_TARGET};
