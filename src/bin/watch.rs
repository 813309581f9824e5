use std::time::Duration;

use agent_watch::{
    config::{Config, read_config_file},
    monitors::Monitor,
    util::get_config_path,
};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(name = "agent-watch", about = "Probe agents, evaluate alert rules, print a dashboard")]
struct Args {
    /// Config file (falls back to $AGENT_WATCH_CONFIG, then built-in defaults)
    #[arg(short, long)]
    file: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run one cycle and print the dashboard
    Check {
        /// Print measurements, alerts and dashboard as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run cycles continuously until interrupted
    Watch {
        /// Seconds between cycles (overrides the config file)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Send a synthetic test alert
    AlertTest {
        /// Channel id to deliver to (defaults to every notified channel)
        #[arg(short, long)]
        channel: Option<String>,

        /// Alert message
        #[arg(default_value = "Test alert from agent-watch")]
        message: String,
    },
}

fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = filter::Targets::new().with_targets(vec![("agent_watch", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn load_config(file: Option<String>) -> anyhow::Result<Config> {
    match file.or_else(get_config_path) {
        Some(path) => read_config_file(&path).with_context(|| format!("failed to load {path}")),
        None => {
            warn!("no config file given, watching the default local agents");
            Ok(Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = load_config(args.file)?.resolve()?;
    let mut monitor = Monitor::from_config(&config)?;

    match args.command {
        Command::Check { json } => {
            let outcome = monitor.run_cycle().await;
            let dashboard = monitor.dashboard();
            if json {
                let output = json!({
                    "measurements": outcome.measurements,
                    "alerts": outcome.alerts,
                    "resources": outcome.resources,
                    "dashboard": dashboard,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{dashboard}");
            }
        }
        Command::Watch { interval: secs } => {
            let period = secs.map(Duration::from_secs).unwrap_or(config.interval);
            if period.is_zero() {
                bail!("interval must be greater than 0");
            }
            let cycles = monitor
                .watch(period, shutdown_signal(), |monitor, _| {
                    println!("{}", monitor.dashboard())
                })
                .await;
            info!("stopped after {cycles} cycles");
        }
        Command::AlertTest { channel, message } => {
            let report = monitor.send_test_alert(channel.as_deref(), &message).await;
            for id in &report.delivered {
                println!("Test alert sent to {id}");
            }
            if report.all_failed() {
                bail!("test alert could not be delivered to any channel");
            }
        }
    }

    Ok(())
}

/// Resolves on the first Ctrl-C
///
/// The listener is installed once and stays registered while cycles run.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
