//! Interactive stdin commands for the long-running monitor.
//!
//! The console surface of the chat-side control loop: retune the
//! publication cadence (persisted to the config file) or request an
//! immediate status without restarting anything.

use netwatch_core::config::format_duration;
use netwatch_core::Config;
use netwatch_monitor::adapters::ChatTarget;
use netwatch_monitor::publish::Publisher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Chat id used for interactive `status` output on the console transport.
const CONSOLE_CHAT: i64 = 0;

const HELP: &str = "commands: interval <minutes>, status, help";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    SetInterval(Duration),
    Status,
    Help,
    Invalid(String),
    Empty,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => Command::Empty,
        Some("interval") => match parts.next().and_then(|v| v.parse::<u64>().ok()) {
            Some(minutes) if minutes >= 1 => {
                Command::SetInterval(Duration::from_secs(minutes * 60))
            }
            _ => Command::Invalid(String::from("usage: interval <minutes> (minimum 1)")),
        },
        Some("status") => Command::Status,
        Some("help") => Command::Help,
        Some(other) => Command::Invalid(format!("unknown command {other:?}, try \"help\"")),
    }
}

/// Read commands from stdin until cancellation or end of input.
///
/// `interval` takes effect on the running publisher within a second and
/// is written back to the config file so it survives a restart.
pub async fn run_commands(
    publisher: Arc<Publisher>,
    mut config: Config,
    config_path: PathBuf,
    token: CancellationToken,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        let line = tokio::select! {
            () = token.cancelled() => return,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            // Stdin closed (or unreadable): commands are done, the
            // monitor keeps running.
            _ => return,
        };

        match parse_command(line.trim()) {
            Command::SetInterval(interval) => {
                publisher.set_interval(interval);
                config.interval = interval;
                match config.save(&config_path) {
                    Ok(()) => info!(
                        interval = %format_duration(interval),
                        path = %config_path.display(),
                        "publication interval updated and saved"
                    ),
                    Err(e) => warn!(
                        error = %e,
                        path = %config_path.display(),
                        "interval updated but config save failed"
                    ),
                }
                println!("publication interval set to {}", format_duration(interval));
            }
            Command::Status => {
                publisher.publish_to(&ChatTarget::Chat(CONSOLE_CHAT)).await;
            }
            Command::Help => println!("{HELP}"),
            Command::Invalid(message) => println!("{message}"),
            Command::Empty => {}
        }
    }
}
