//! cfscaled — the cfscale daemon.
//!
//! Polls the Cloud Foundry API on a fixed interval and nudges each
//! application's instance count one step toward its configured
//! utilization band. Also serves a small operational API (health,
//! status, Prometheus metrics).
//!
//! # Usage
//!
//! ```text
//! cfscaled run --api-url https://api.sys.example.com --rules-file rules.toml
//! AUTOSCALER_RULES='[...]' CF_API_URL=https://api.sys.example.com cfscaled run
//! cfscaled validate --rules-file rules.toml
//! ```

mod daemon;
mod rules_source;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cfscale_platform::ClientConfig;

use crate::daemon::DaemonConfig;
use crate::rules_source::RulesSource;

const DEFAULT_LOG_FILTER: &str = "info,cfscaled=debug,cfscale=debug";

#[derive(Parser)]
#[command(name = "cfscaled", about = "cfscale autoscaler daemon", version)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the autoscaler loop and the operational API.
    Run {
        /// Base URL of the Cloud Foundry API (http or https).
        #[arg(long, env = "CF_API_URL")]
        api_url: String,

        /// Accept any TLS certificate from the API.
        #[arg(long, env = "SKIP_SSL_VALIDATION")]
        skip_ssl_validation: bool,

        /// Bearer token sent with every platform request.
        #[arg(long, env = "CF_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Port for the operational API.
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,

        /// Seconds between autoscaler iterations.
        #[arg(long, env = "AUTOSCALE_INTERVAL", default_value = "30")]
        interval: u64,

        /// Per-request timeout for platform calls, in seconds.
        #[arg(long, default_value = "10")]
        request_timeout: u64,

        /// Rules file (`.toml` or `.json`).
        #[arg(long)]
        rules_file: Option<PathBuf>,

        /// Inline JSON array of rules.
        #[arg(long = "rules", env = "AUTOSCALER_RULES", hide_env_values = true)]
        rules_json: Option<String>,
    },
    /// Validate a rules file and print the normalized rule set.
    Validate {
        /// Rules file (`.toml` or `.json`).
        #[arg(long)]
        rules_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Run {
            api_url,
            skip_ssl_validation,
            token,
            port,
            interval,
            request_timeout,
            rules_file,
            rules_json,
        } => {
            let source = RulesSource::resolve(rules_file, rules_json)?;
            let rules = source.load()?;

            let config = DaemonConfig {
                port,
                interval: Duration::from_secs(interval),
                client: ClientConfig {
                    api_url,
                    token,
                    timeout: Duration::from_secs(request_timeout),
                    skip_ssl_validation,
                },
            };
            daemon::run_daemon(rules, config).await
        }
        Command::Validate { rules_file } => {
            let rules = RulesSource::File(rules_file).load()?;
            println!("{}", serde_json::to_string_pretty(rules.rules())?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
