//! netwatch CLI: argument handling and the two run modes.

mod args;
mod chat;
mod commands;

use anyhow::{Context, Result};
use args::Args;
use chat::StdoutChat;
use clap::Parser;
use netwatch_core::types::Snapshot;
use netwatch_core::Config;
use netwatch_monitor::adapters::{ChartRenderer, ChatTarget, ChatTransport, NoopRenderer};
use netwatch_monitor::publish::{format, Publisher, SnapshotSource};
use netwatch_monitor::Monitor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Extra wait in one-shot mode so the stream can deliver some updates.
const WARMUP_DELAY: Duration = Duration::from_secs(5);

/// Cooperative-shutdown grace after cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Entry point used by the binary.
pub async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;

    if args.run {
        run_monitor(config, args.config.clone()).await
    } else {
        run_once(config, &args).await
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// One-shot check: boot, warm up briefly, print the merged status.
async fn run_once(config: Config, args: &Args) -> Result<()> {
    let monitor = Monitor::boot(config)
        .await
        .context("monitor boot failed")?;

    let token = CancellationToken::new();
    let handles = monitor.spawn(&token);

    info!(wait = ?WARMUP_DELAY, "collecting BGP updates");
    tokio::time::sleep(WARMUP_DELAY).await;

    let snapshot = monitor.observe().await;

    println!("{}", format::header_section(&snapshot));
    println!("{}", format::asn_section(&snapshot));
    println!("{}", format::dns_section(&snapshot));

    if args.charts {
        save_charts(&snapshot, &args.output, &NoopRenderer);
    }

    token.cancel();
    tokio::time::sleep(SHUTDOWN_GRACE).await;
    drop(handles);
    Ok(())
}

/// Long-running monitor with periodic publication and an interactive
/// command loop, until interrupted.
async fn run_monitor(config: Config, config_path: std::path::PathBuf) -> Result<()> {
    let channel = config.chat_channel.as_deref().map(ChatTarget::channel);
    if channel.is_none() {
        warn!("no channel configured, periodic channel publication disabled");
    }
    if config.chat_token.is_none() {
        warn!("no chat token configured, wire a chat transport adapter for real delivery");
    }

    let monitor = Monitor::boot(config.clone())
        .await
        .context("monitor boot failed")?;

    let token = CancellationToken::new();
    let mut handles = monitor.spawn(&token);

    let source: Arc<dyn SnapshotSource> = monitor.clone();
    let chat: Arc<dyn ChatTransport> = Arc::new(StdoutChat);
    let charts: Arc<dyn ChartRenderer> = Arc::new(NoopRenderer);
    let publisher = Arc::new(Publisher::new(source, chat, charts, channel, config.interval));

    {
        let publisher = publisher.clone();
        let publish_token = token.clone();
        handles.push(tokio::spawn(async move { publisher.run(publish_token).await }));
    }

    {
        let publisher = publisher.clone();
        let command_config = config.clone();
        let command_token = token.clone();
        handles.push(tokio::spawn(async move {
            commands::run_commands(publisher, command_config, config_path, command_token).await;
        }));
    }

    info!("netwatch running, interrupt to stop");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for interrupt")?;

    info!("shutting down");
    token.cancel();
    tokio::time::sleep(SHUTDOWN_GRACE).await;
    drop(handles);
    Ok(())
}

/// Write chart PNGs next to the one-shot output.
fn save_charts(snapshot: &Snapshot, output: &Path, renderer: &dyn ChartRenderer) {
    let stamp = snapshot.taken_at.format("%Y%m%d_%H%M%S");

    match snapshot.traffic.as_ref() {
        Some(sample) => match renderer.render_traffic(sample) {
            Some(png) => {
                let path = output.join(format!("traffic_{stamp}.png"));
                match std::fs::write(&path, png) {
                    Ok(()) => println!("traffic chart saved: {}", path.display()),
                    Err(e) => warn!(error = %e, "failed to save traffic chart"),
                }
            }
            None => println!("traffic chart skipped: no chart renderer configured"),
        },
        None => println!("traffic chart skipped: no sample available"),
    }

    match snapshot.asn_traffic.as_deref().filter(|e| !e.is_empty()) {
        Some(entries) => match renderer.render_asn_traffic(entries) {
            Some(png) => {
                let path = output.join(format!("asn_traffic_{stamp}.png"));
                match std::fs::write(&path, png) {
                    Ok(()) => println!("ASN traffic chart saved: {}", path.display()),
                    Err(e) => warn!(error = %e, "failed to save ASN traffic chart"),
                }
            }
            None => println!("ASN traffic chart skipped: no chart renderer configured"),
        },
        None => println!("ASN traffic chart skipped: no sample available"),
    }
}
