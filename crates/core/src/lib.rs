//! Job tracking state for the replicator console.
//!
//! Everything here is synchronous and owns no I/O: the engine crate performs
//! the HTTP calls and feeds results into a [`TaskBoard`].

pub mod active;
pub mod board;
pub mod job;
pub mod orphan;
pub mod reconcile;
pub mod store;
pub mod view;

pub use active::ActiveSet;
pub use board::TaskBoard;
pub use job::{JobKey, LifecycleState, StatusPayload};
pub use orphan::{OrphanCandidate, OrphanList};
pub use reconcile::{ReconcileReport, Reconciler, StatusBatch};
pub use store::{JobRecord, StatusStore};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
