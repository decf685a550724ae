//! Asynchronous side of the replicator console.
//!
//! A [`Tracker`] owns the shared task board and drives it from three
//! producers: job starts, orphan re-links and the periodic status poll.

mod backend;
mod initiator;
mod relink;
mod scheduler;
mod state;
mod tracker;

pub use backend::ReplicationBackend;
pub use initiator::{JobInitiator, StartOutcome};
pub use relink::{OrphanRelink, RelinkError, RelinkOutcome};
pub use scheduler::{DEFAULT_POLL_INTERVAL, PollScheduler};
pub use state::TrackerEvent;
pub use tracker::{Tracker, TrackerSettings};
