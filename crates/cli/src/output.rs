//! Plain-text rendering for terminal output.

use chrono::DateTime;

use replicator_api::HostSummary;
use replicator_core::job::classify;
use replicator_core::{JobKey, JobRecord, LifecycleState, OrphanCandidate, StatusPayload};
use replicator_engine::TrackerEvent;

/// Fixed-width state label.
pub fn badge(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Pending => "[PENDING]  ",
        LifecycleState::Running => "[RUNNING]  ",
        LifecycleState::Completed => "[COMPLETED]",
        LifecycleState::Failed => "[FAILED]   ",
        LifecycleState::Error => "[ERROR]    ",
        LifecycleState::Unknown => "[UNKNOWN]  ",
    }
}

/// One line per record: badge, key, name, timestamp and last message.
pub fn render_records(records: &[&JobRecord]) -> String {
    if records.is_empty() {
        return "No replication tasks.\n".to_string();
    }
    let key_width = records
        .iter()
        .map(|r| r.key.as_str().len())
        .max()
        .unwrap_or(0);
    let name_width = records
        .iter()
        .map(|r| r.display_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for r in records {
        out.push_str(&format!(
            "{} {:<kw$}  {:<nw$}  {}  {}\n",
            badge(r.state),
            r.key.as_str(),
            r.display_name,
            r.last_updated.format("%H:%M:%S"),
            r.last_message,
            kw = key_width,
            nw = name_width,
        ));
    }
    out
}

pub fn render_record(record: &JobRecord) -> String {
    format!(
        "{} {} ({}): {}",
        badge(record.state),
        record.display_name,
        record.key,
        record.last_message
    )
}

/// Detail view of one entry from the service's status report.
pub fn render_task_detail(key: &JobKey, payload: &StatusPayload) -> String {
    let message = payload.display_message();
    let mut out = format!(
        "{} {key}: {message}\n",
        badge(classify(Some(payload), &message))
    );
    let name = payload.dest_host_name.as_deref();
    if let Some(dest_id) = payload.dest_host_id.as_deref() {
        out.push_str(&format!(
            "  Destination: {} (id {dest_id})\n",
            name.unwrap_or("-")
        ));
    } else if let Some(name) = name {
        out.push_str(&format!("  Destination: {name}\n"));
    }
    if let Some(started) = payload.start_time {
        out.push_str(&format!("  Started:     {}\n", format_unix_time(started)));
    }
    match &payload.progress {
        Some(serde_json::Value::Number(p)) => out.push_str(&format!("  Progress:    {p}%\n")),
        Some(serde_json::Value::String(p)) => out.push_str(&format!("  Progress:    {p}\n")),
        Some(serde_json::Value::Null) | None => {}
        Some(other) => out.push_str(&format!("  Progress:    {other}\n")),
    }
    out
}

/// UTC rendering of a Unix-seconds timestamp; falls back to the raw number.
fn format_unix_time(secs: f64) -> String {
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9) as u32;
    match DateTime::from_timestamp(whole as i64, nanos) {
        Some(at) if secs.is_finite() => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => secs.to_string(),
    }
}

pub fn render_hosts(hosts: &[HostSummary]) -> String {
    if hosts.is_empty() {
        return "No hosts found on the source Zabbix.\n".to_string();
    }
    let width = hosts.iter().map(|h| h.hostid.len()).max().unwrap_or(0);
    let mut out = String::new();
    for host in hosts {
        out.push_str(&format!(
            "{:<width$}  {}\n",
            host.hostid,
            host.display_label()
        ));
    }
    out.push_str(&format!("\nTotal: {} host(s)\n", hosts.len()));
    out
}

pub fn render_orphans(orphans: &[OrphanCandidate]) -> String {
    if orphans.is_empty() {
        return "No orphaned hosts found.\n".to_string();
    }
    let mut out = String::new();
    for o in orphans {
        let hint = o
            .source_host_id_hint
            .as_deref()
            .map(|h| format!("  (source hint: {h})"))
            .unwrap_or_default();
        out.push_str(&format!("{}  {}{}\n", o.dest_host_id, o.dest_host_name, hint));
    }
    out
}

/// Line for an engine event, or `None` when it is filtered out or not worth printing.
pub fn describe_event(event: &TrackerEvent, filter: &str) -> Option<String> {
    let shown = |r: &JobRecord| replicator_core::view::matches_filter(r, filter);
    match event {
        TrackerEvent::JobRegistered(r) | TrackerEvent::JobUpdated(r) if shown(r) => {
            Some(render_record(r))
        }
        TrackerEvent::JobFinished(r) if shown(r) => Some(format!("{}  (finished)", render_record(r))),
        TrackerEvent::JobDropped(r) if shown(r) => {
            Some(format!("{}  (no longer reported)", render_record(r)))
        }
        TrackerEvent::PollFailed(reason) => Some(format!("Status poll failed: {reason}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replicator_api::HostInterface;
    use replicator_core::testing;
    use replicator_core::TaskBoard;

    fn board() -> TaskBoard {
        let mut board = TaskBoard::new(0);
        board.register_job(JobKey::from("10084"), "Core-Switch-01", "Initiated", testing::at(0));
        board.register_job(JobKey::from("7"), "web", "Initiated", testing::at(0));
        board
    }

    #[test]
    fn badges_share_one_width() {
        let all = [
            LifecycleState::Pending,
            LifecycleState::Running,
            LifecycleState::Completed,
            LifecycleState::Failed,
            LifecycleState::Error,
            LifecycleState::Unknown,
        ];
        assert!(all.iter().all(|s| badge(*s).len() == badge(LifecycleState::Completed).len()));
    }

    #[test]
    fn records_are_aligned() {
        let board = board();
        let records = board.records();
        let refs: Vec<&JobRecord> = records.iter().collect();

        let text = render_records(&refs);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[PENDING]   10084  Core-Switch-01  12:00:00  Initiated"));
        assert!(lines[1].starts_with("[PENDING]   7      web             12:00:00  Initiated"));
    }

    #[test]
    fn empty_tables_say_so() {
        assert_eq!(render_records(&[]), "No replication tasks.\n");
        assert_eq!(render_orphans(&[]), "No orphaned hosts found.\n");
    }

    #[test]
    fn task_detail_lists_known_fields() {
        let payload = StatusPayload {
            dest_host_id: Some("20011".into()),
            dest_host_name: Some("Core-Switch-01".into()),
            start_time: Some(1743508800.5),
            progress: Some(serde_json::json!(42.5)),
            ..StatusPayload::new("running", "Replaying history")
        };

        let text = render_task_detail(&JobKey::from("10084"), &payload);

        assert_eq!(
            text,
            "[RUNNING]   10084: Replaying history\n\
             \x20 Destination: Core-Switch-01 (id 20011)\n\
             \x20 Started:     2025-04-01 12:00:00 UTC\n\
             \x20 Progress:    42.5%\n"
        );
    }

    #[test]
    fn task_detail_keeps_unusual_values_readable() {
        let payload = StatusPayload {
            start_time: Some(f64::NAN),
            progress: Some(serde_json::json!({"items": 120, "done": 40})),
            ..StatusPayload::new("running", "Replaying history")
        };

        let text = render_task_detail(&JobKey::from("10084"), &payload);

        assert!(text.contains("  Started:     NaN\n"));
        assert!(text.contains("  Progress:    {\"done\":40,\"items\":120}\n"));
    }

    #[test]
    fn hosts_use_interface_labels() {
        let hosts = vec![HostSummary {
            hostid: "10084".into(),
            name: "Zabbix server".into(),
            interfaces: vec![HostInterface {
                interface_type: "2".into(),
                ip: Some("10.0.0.5".into()),
                dns: None,
            }],
        }];
        let text = render_hosts(&hosts);
        assert!(text.starts_with("10084  Zabbix server (10.0.0.5)\n"));
        assert!(text.ends_with("Total: 1 host(s)\n"));
    }

    #[test]
    fn orphan_lines_show_hint() {
        let text = render_orphans(&[testing::orphan("10", "srv1", Some("5"))]);
        assert_eq!(text, "10  srv1  (source hint: 5)\n");
    }

    #[test]
    fn events_respect_filter() {
        let board = board();
        let rec = board.record("7").unwrap().clone();
        let event = TrackerEvent::JobFinished(rec);

        assert!(describe_event(&event, "web").unwrap().ends_with("(finished)"));
        assert!(describe_event(&event, "switch").is_none());
        assert!(describe_event(&TrackerEvent::PollingStarted, "").is_none());
    }
}
