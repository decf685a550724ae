mod config_cmd;
mod hosts;
mod jobs;
mod orphans;
mod output;
mod session;
mod watch;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "replicator",
    version,
    about = "Console for the Zabbix replicator service - start, watch and re-link host replications"
)]
struct Cli {
    /// Replicator service URL for this invocation (overrides the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push the Zabbix connection settings and list the source hosts
    Connect,

    /// List hosts on the source Zabbix
    Hosts,

    /// Start replicating one or more source hosts
    Replicate {
        /// Source host ids
        #[arg(required = true)]
        host_ids: Vec<String>,

        /// Display name (only used when a single host is given)
        #[arg(long)]
        name: Option<String>,

        /// Return right after the jobs are accepted instead of watching them
        #[arg(long)]
        detach: bool,
    },

    /// Show replication task status
    Status {
        /// Show only this task, straight from the service
        #[arg(long)]
        host: Option<String>,

        /// Only show tasks whose name or id contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Leave completed tasks out of the table
        #[arg(long)]
        hide_completed: bool,
    },

    /// Follow running tasks until they settle (Ctrl-C to leave)
    Watch {
        /// Only print tasks whose name or id contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// List destination hosts with no replication task behind them
    Orphans,

    /// Bind an orphaned destination host to a source host and replay it
    Relink {
        /// Destination host id
        dest_host_id: String,

        /// Source host id (defaults to the id recovered from the destination host)
        #[arg(long)]
        source: Option<String>,

        /// Return right after the re-link is accepted
        #[arg(long)]
        detach: bool,
    },

    /// Rebuild the item mapping of an existing replication task
    RebuildMapping {
        /// Source host id
        source_host_id: String,
    },

    /// Show or set configuration (`--server` stores the service URL)
    Config {
        /// Set the status poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,

        /// Set how many polls a task may be missing before it is dropped
        #[arg(long)]
        grace: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into())
                .add_directive(
                    "replicator=info"
                        .parse()
                        .unwrap_or_else(|_| tracing::Level::INFO.into()),
                ),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let server = cli.server.as_deref();

    let result = match cli.command {
        Commands::Connect => hosts::run_connect(server).await,
        Commands::Hosts => hosts::run_hosts(server).await,
        Commands::Replicate {
            host_ids,
            name,
            detach,
        } => jobs::run_replicate(server, &host_ids, name.as_deref(), detach).await,
        Commands::Status {
            host,
            filter,
            hide_completed,
        } => jobs::run_status(server, host.as_deref(), filter.as_deref(), hide_completed).await,
        Commands::Watch { filter } => jobs::run_watch(server, filter.as_deref()).await,
        Commands::Orphans => orphans::run_orphans(server).await,
        Commands::Relink {
            dest_host_id,
            source,
            detach,
        } => orphans::run_relink(server, &dest_host_id, source.as_deref(), detach).await,
        Commands::RebuildMapping { source_host_id } => {
            jobs::run_rebuild_mapping(server, &source_host_id).await
        }
        Commands::Config { interval, grace } => {
            if server.is_none() && interval.is_none() && grace.is_none() {
                config_cmd::show_config()
            } else {
                config_cmd::set_config(server, interval, grace)
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replicate_accepts_several_hosts() {
        let cli = Cli::parse_from(["replicator", "replicate", "10084", "10090", "--detach"]);
        match cli.command {
            Commands::Replicate {
                host_ids, detach, ..
            } => {
                assert_eq!(host_ids, vec!["10084", "10090"]);
                assert!(detach);
            }
            _ => panic!("expected replicate"),
        }
    }

    #[test]
    fn server_override_is_global() {
        let cli = Cli::parse_from(["replicator", "status", "--server", "http://svc:5000"]);
        assert_eq!(cli.server.as_deref(), Some("http://svc:5000"));
    }

    #[test]
    fn config_server_flag_reaches_config_command() {
        let cli = Cli::parse_from(["replicator", "config", "--server", "http://svc:5000"]);
        assert!(matches!(cli.command, Commands::Config { interval: None, grace: None }));
        assert_eq!(cli.server.as_deref(), Some("http://svc:5000"));
    }

    #[test]
    fn replicate_requires_a_host() {
        assert!(Cli::try_parse_from(["replicator", "replicate"]).is_err());
    }
}
