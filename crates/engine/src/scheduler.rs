//! The single repeating status poll.
//!
//! Idle until a job is tracked. `start` spawns one poll loop that fires
//! immediately and then every `interval`; the loop stops itself once a
//! reconciliation leaves the active set empty. Ticks run one after another
//! in the same task, so a tick is never issued while the previous request is
//! still outstanding.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use replicator_core::ReconcileReport;

use crate::backend::ReplicationBackend;
use crate::state::{EngineState, EventSink, SharedState, TrackerEvent};

/// Default cadence of status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct PollScheduler<B> {
    backend: Arc<B>,
    state: SharedState,
    events: EventSink,
    interval: Duration,
}

impl<B> Clone for PollScheduler<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            state: self.state.clone(),
            events: self.events.clone(),
            interval: self.interval,
        }
    }
}

impl<B: ReplicationBackend> PollScheduler<B> {
    pub(crate) fn new(
        backend: Arc<B>,
        state: SharedState,
        events: EventSink,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            state,
            events,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().poll.running
    }

    /// Start polling if there is anything to poll and no loop is running.
    ///
    /// Returns `true` when a new loop was spawned. Calling this while polling
    /// is a no-op.
    pub fn start(&self) -> bool {
        let (generation, stop_rx) = {
            let mut state = self.state.lock();
            if state.poll.running || state.board.active().is_empty() {
                return false;
            }
            let (stop_tx, stop_rx) = watch::channel(false);
            state.poll.generation += 1;
            state.poll.running = true;
            state.poll.stop = Some(stop_tx);
            (state.poll.generation, stop_rx)
        };

        info!("Starting status polling every {:?}", self.interval);
        self.events.emit(TrackerEvent::PollingStarted);

        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(generation, stop_rx).await });
        true
    }

    /// Stop polling. A request already in flight is not aborted; its result
    /// is still merged when it arrives.
    pub fn stop(&self) -> bool {
        {
            let mut state = self.state.lock();
            if !state.poll.running {
                return false;
            }
            state.poll.halt();
        }
        info!("Stopping status polling");
        self.events.emit(TrackerEvent::PollingStopped);
        true
    }

    async fn run(self, generation: u64, mut stop_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop_rx.changed() => {
                    debug!("Poll loop {generation} stopped while idle");
                    return;
                }
            }
            if !self.tick(generation).await {
                return;
            }
        }
    }

    /// One request/response cycle. Returns whether the loop should continue.
    async fn tick(&self, generation: u64) -> bool {
        {
            let mut state = self.state.lock();
            if !state.poll.is_current(generation) {
                return false;
            }
            if state.board.active().is_empty() {
                state.poll.halt();
                drop(state);
                info!("Polling: no active jobs, stopping");
                self.events.emit(TrackerEvent::PollingStopped);
                return false;
            }
            debug!(
                "Polling: fetching status for {} active job(s)",
                state.board.active().len()
            );
        }

        let result = self.backend.replay_status().await;

        let (events, keep_polling, stopped) = {
            let mut state = self.state.lock();
            let events = match result {
                Ok(batch) => {
                    let report = state.board.reconcile(&batch, Utc::now());
                    report_events(&state, &report)
                }
                Err(e) => {
                    warn!("Polling: error fetching status: {e}");
                    vec![TrackerEvent::PollFailed(e.to_string())]
                }
            };

            let current = state.poll.is_current(generation);
            let stopped = current && state.board.active().is_empty();
            if stopped {
                state.poll.halt();
            }
            (events, current && !stopped, stopped)
        };

        self.events.emit_all(events);
        if stopped {
            info!("Polling: all jobs settled, stopping");
            self.events.emit(TrackerEvent::PollingStopped);
        }
        keep_polling
    }
}

fn report_events(state: &EngineState, report: &ReconcileReport) -> Vec<TrackerEvent> {
    let record = |key: &replicator_core::JobKey| state.board.record(key.as_str()).cloned();
    let mut events = Vec::new();
    for key in &report.updated {
        if let Some(rec) = record(key) {
            if report.finished.contains(key) {
                events.push(TrackerEvent::JobFinished(rec));
            } else {
                events.push(TrackerEvent::JobUpdated(rec));
            }
        }
    }
    for key in &report.dropped {
        if let Some(rec) = record(key) {
            events.push(TrackerEvent::JobDropped(rec));
        }
    }
    events
}
