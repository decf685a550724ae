use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use tracing::warn;

use replicator_api::HostSummary;
use replicator_core::JobKey;
use replicator_core::view::filter_records;
use replicator_engine::StartOutcome;

use crate::output::{render_records, render_task_detail};
use crate::session::Session;
use crate::watch::{WatchEnd, follow};

/// Start replication for each host id, then follow until the jobs settle
pub async fn run_replicate(
    server: Option<&str>,
    host_ids: &[String],
    name: Option<&str>,
    detach: bool,
) -> Result<()> {
    let session = Session::open(server)?;
    let tracker = &session.tracker;
    let mut events = tracker.subscribe();

    let keys: Vec<JobKey> = host_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(JobKey::from)
        .collect();
    if keys.is_empty() {
        bail!("Please select at least one host to replicate.");
    }

    let names = match name {
        Some(name) if keys.len() == 1 => HashMap::from([(keys[0].clone(), name.to_string())]),
        _ => match tracker.source_hosts().await {
            Ok(hosts) => names_by_id(&hosts),
            Err(e) => {
                warn!("Could not load host names: {e}");
                HashMap::new()
            }
        },
    };

    let mut tracked = 0usize;
    for key in keys {
        let display_name = names
            .get(&key)
            .cloned()
            .unwrap_or_else(|| format!("Host {key}"));
        match tracker.start_job(key, &display_name).await {
            StartOutcome::Initiated { message } => {
                tracked += 1;
                println!("{display_name}: {message}");
            }
            StartOutcome::AlreadyRunning { message } => {
                tracked += 1;
                println!("{display_name}: {message}");
            }
            StartOutcome::Failed { reason } => {
                eprintln!("Error starting replication for {display_name}: {reason}");
            }
        }
    }

    if tracked == 0 {
        bail!("No replication job was started");
    }
    if detach {
        println!("Replication started. Follow it with `replicator watch`.");
        tracker.shutdown();
        return Ok(());
    }

    let end = follow(tracker, &mut events, "").await?;
    if end == WatchEnd::Settled {
        println!();
        let records = tracker.records();
        print!("{}", render_records(&records.iter().collect::<Vec<_>>()));
    }
    Ok(())
}

/// One-shot status table, or the detail of one task with `--host`
pub async fn run_status(
    server: Option<&str>,
    host: Option<&str>,
    filter: Option<&str>,
    hide_completed: bool,
) -> Result<()> {
    let session = Session::open(server)?;
    let tracker = &session.tracker;

    if let Some(host) = host {
        let batch = tracker
            .status_for(host.trim())
            .await
            .with_context(|| format!("Error fetching status for host {host}"))?;
        if batch.is_empty() {
            println!("No replication task for host {host}.");
        }
        for (key, payload) in &batch {
            print!("{}", render_task_detail(key, payload));
        }
        return Ok(());
    }

    let active = tracker
        .load_snapshot()
        .await
        .context("Error loading replication status")?;
    let total = tracker.records().len();
    if hide_completed {
        tracker.clear_completed();
    }

    let records = tracker.records();
    let shown = filter_records(&records, filter.unwrap_or_default());
    print!("{}", render_records(&shown));
    println!();
    println!("{total} task(s), {active} still active");
    Ok(())
}

/// Load current tasks and follow them until they settle
pub async fn run_watch(server: Option<&str>, filter: Option<&str>) -> Result<()> {
    let session = Session::open(server)?;
    let tracker = &session.tracker;
    let filter = filter.unwrap_or_default();
    let mut events = tracker.subscribe();

    let active = tracker
        .load_snapshot()
        .await
        .context("Error loading replication status")?;
    // The snapshot announces every record; the table below covers them.
    // Polling starts only after the drain so no tick is swallowed.
    while events.try_recv().is_ok() {}

    let records = tracker.records();
    print!("{}", render_records(&filter_records(&records, filter)));
    if active == 0 {
        println!();
        println!("No active replication tasks.");
        return Ok(());
    }
    println!();

    tracker.scheduler().start();
    if follow(tracker, &mut events, filter).await? == WatchEnd::Settled {
        println!();
        println!("All tasks settled.");
    }
    Ok(())
}

/// Rebuild the item mapping for an existing task
pub async fn run_rebuild_mapping(server: Option<&str>, source_host_id: &str) -> Result<()> {
    let source_host_id = source_host_id.trim();
    if source_host_id.is_empty() {
        bail!("Please provide a Source Host ID.");
    }
    let session = Session::open(server)?;
    let message = session
        .tracker
        .rebuild_mapping(source_host_id)
        .await
        .with_context(|| format!("Error rebuilding mapping for host {source_host_id}"))?;
    println!("{message}");
    Ok(())
}

fn names_by_id(hosts: &[HostSummary]) -> HashMap<JobKey, String> {
    hosts
        .iter()
        .map(|h| (JobKey::from(h.hostid.as_str()), h.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_names_are_keyed_by_id() {
        let hosts = vec![
            HostSummary {
                hostid: "10084".into(),
                name: "Zabbix server".into(),
                interfaces: Vec::new(),
            },
            HostSummary {
                hostid: "10090".into(),
                name: "edge-router".into(),
                interfaces: Vec::new(),
            },
        ];

        let names = names_by_id(&hosts);

        assert_eq!(names.get("10090").map(String::as_str), Some("edge-router"));
        assert_eq!(names.len(), 2);
    }
}
