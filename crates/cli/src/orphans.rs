use anyhow::{Context, Result, bail};

use replicator_core::OrphanCandidate;

use crate::output::{render_orphans, render_record};
use crate::session::Session;
use crate::watch::follow;

/// Discover and list orphaned destination hosts
pub async fn run_orphans(server: Option<&str>) -> Result<()> {
    let session = Session::open(server)?;
    let orphans = session
        .tracker
        .discover_orphans()
        .await
        .context("Error checking for orphaned hosts")?;
    print!("{}", render_orphans(&orphans));
    if !orphans.is_empty() {
        println!();
        println!("Re-link one with `replicator relink <DEST_HOST_ID> --source <SOURCE_HOST_ID>`.");
    }
    Ok(())
}

/// Re-link an orphan to its source host and follow the replay
pub async fn run_relink(
    server: Option<&str>,
    dest_host_id: &str,
    source: Option<&str>,
    detach: bool,
) -> Result<()> {
    let session = Session::open(server)?;
    let tracker = &session.tracker;
    let mut events = tracker.subscribe();

    let orphans = tracker
        .discover_orphans()
        .await
        .context("Error checking for orphaned hosts")?;
    let source_host_id = resolve_source(&orphans, dest_host_id.trim(), source)?;

    let outcome = tracker
        .relink(dest_host_id, &source_host_id)
        .await
        .context("Error during re-linking")?;
    println!("{}", outcome.message);
    println!("{}", render_record(&outcome.record));

    if detach {
        tracker.shutdown();
        return Ok(());
    }
    // Registration was already printed above.
    while events.try_recv().is_ok() {}
    follow(tracker, &mut events, "").await?;
    Ok(())
}

/// Explicit `--source` wins; otherwise fall back to the hint recovered
/// from the destination host.
fn resolve_source(
    orphans: &[OrphanCandidate],
    dest_host_id: &str,
    source: Option<&str>,
) -> Result<String> {
    if let Some(source) = source.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(source.to_string());
    }
    let Some(orphan) = orphans.iter().find(|o| o.dest_host_id == dest_host_id) else {
        bail!("Destination host {dest_host_id} is not in the orphaned host list; pass --source");
    };
    match orphan.source_host_id_hint.as_deref() {
        Some(hint) if !hint.is_empty() => Ok(hint.to_string()),
        _ => bail!(
            "No source host id known for {} ({dest_host_id}); pass --source",
            orphan.dest_host_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replicator_core::testing::orphan;

    #[test]
    fn explicit_source_wins_over_hint() {
        let orphans = vec![orphan("10", "srv1", Some("5"))];
        assert_eq!(resolve_source(&orphans, "10", Some(" 6 ")).unwrap(), "6");
    }

    #[test]
    fn hint_fills_in_missing_source() {
        let orphans = vec![orphan("10", "srv1", Some("5"))];
        assert_eq!(resolve_source(&orphans, "10", None).unwrap(), "5");
        assert_eq!(resolve_source(&orphans, "10", Some("")).unwrap(), "5");
    }

    #[test]
    fn unknown_orphan_needs_explicit_source() {
        let orphans = vec![orphan("10", "srv1", None)];
        assert!(resolve_source(&orphans, "10", None).is_err());
        assert!(resolve_source(&orphans, "11", None).is_err());
    }
}
