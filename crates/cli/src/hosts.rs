use anyhow::{Context, Result};

use crate::output::render_hosts;
use crate::session::Session;

/// Push the `[zabbix]` settings to the service, then list source hosts
pub async fn run_connect(server: Option<&str>) -> Result<()> {
    let session = Session::open(server)?;
    // Blank settings are left out; the service fills them from its own
    // environment or rejects the request listing what is missing.
    let fields = session.config.zabbix.to_config_fields();

    println!("Connecting to {}...", session.config.server.url);
    let hosts = session
        .tracker
        .connect(&fields)
        .await
        .context("Error saving configuration")?;
    println!("Configuration saved. Source hosts loaded.");
    println!();
    print!("{}", render_hosts(&hosts));
    Ok(())
}

/// List hosts on the source Zabbix
pub async fn run_hosts(server: Option<&str>) -> Result<()> {
    let session = Session::open(server)?;
    let hosts = session
        .tracker
        .source_hosts()
        .await
        .context("Error loading source hosts")?;
    print!("{}", render_hosts(&hosts));
    Ok(())
}
