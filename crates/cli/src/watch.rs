use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;

use replicator_engine::{ReplicationBackend, Tracker, TrackerEvent};

use crate::output::describe_event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    /// Every tracked job finished or was dropped.
    Settled,
    Interrupted,
}

/// Print engine events until polling stops on its own or Ctrl-C is pressed.
pub async fn follow<B: ReplicationBackend>(
    tracker: &Tracker<B>,
    events: &mut UnboundedReceiver<TrackerEvent>,
    filter: &str,
) -> Result<WatchEnd> {
    if !tracker.scheduler().is_running() {
        print_pending(events, filter);
        return Ok(WatchEnd::Settled);
    }

    println!("Watching replication status (Ctrl-C to stop)...");
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    return Ok(WatchEnd::Settled);
                };
                let stopped = event == TrackerEvent::PollingStopped;
                if let Some(line) = describe_event(&event, filter) {
                    println!("{line}");
                }
                if stopped && !tracker.scheduler().is_running() {
                    print_pending(events, filter);
                    return Ok(WatchEnd::Settled);
                }
            }
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl-C")?;
                tracker.shutdown();
                println!();
                println!("Stopped watching. Jobs keep running on the server.");
                return Ok(WatchEnd::Interrupted);
            }
        }
    }
}

fn print_pending(events: &mut UnboundedReceiver<TrackerEvent>, filter: &str) {
    while let Ok(event) = events.try_recv() {
        if let Some(line) = describe_event(&event, filter) {
            println!("{line}");
        }
    }
}
