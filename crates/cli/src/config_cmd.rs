use anyhow::{Result, bail};

use replicator_runtime_config::{ReplicatorConfig, config_path, load_config, save_config};

/// Print the effective configuration
pub fn show_config() -> Result<()> {
    let path = config_path()?;
    let config = load_config()?;

    if path.exists() {
        println!("Config file: {}", path.display());
    } else {
        println!("Config file: {} (not created yet, showing defaults)", path.display());
    }
    println!();
    print!("{}", render_config(&config));
    Ok(())
}

/// Update the config file with the given values
pub fn set_config(server: Option<&str>, interval: Option<u64>, grace: Option<u32>) -> Result<()> {
    let mut config = load_config()?;
    apply_changes(&mut config, server, interval, grace)?;
    let path = save_config(&config)?;
    println!("Config saved to {}", path.display());
    print!("{}", render_config(&config));
    Ok(())
}

fn apply_changes(
    config: &mut ReplicatorConfig,
    server: Option<&str>,
    interval: Option<u64>,
    grace: Option<u32>,
) -> Result<()> {
    if let Some(url) = server {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("Server URL must start with http:// or https:// (got '{url}')");
        }
        config.server.url = url.to_string();
    }
    if let Some(secs) = interval {
        if secs == 0 {
            bail!("Poll interval must be at least 1 second");
        }
        config.polling.interval_secs = secs;
    }
    if let Some(polls) = grace {
        config.polling.missing_grace_polls = polls;
    }
    Ok(())
}

fn render_config(config: &ReplicatorConfig) -> String {
    let masked = |token: &str| {
        if token.is_empty() {
            "(not set)".to_string()
        } else {
            "********".to_string()
        }
    };
    let or_unset = |value: &str| {
        if value.is_empty() {
            "(not set)".to_string()
        } else {
            value.to_string()
        }
    };
    let z = &config.zabbix;
    let mut out = String::new();
    out.push_str(&format!("Server:          {}\n", config.server.url));
    out.push_str(&format!("Timeout:         {}s\n", config.server.timeout_secs));
    out.push_str(&format!("Poll interval:   {}s\n", config.polling.interval_secs));
    out.push_str(&format!(
        "Missing grace:   {} poll(s)\n",
        config.polling.missing_grace_polls
    ));
    out.push_str(&format!("Source Zabbix:   {}\n", or_unset(&z.source_url)));
    out.push_str(&format!("Source token:    {}\n", masked(&z.source_token)));
    out.push_str(&format!("Dest Zabbix:     {}\n", or_unset(&z.dest_url)));
    out.push_str(&format!("Dest token:      {}\n", masked(&z.dest_token)));
    out.push_str(&format!(
        "Trapper:         {}:{}\n",
        or_unset(&z.dest_trapper_host),
        z.dest_trapper_port
    ));
    out
}
