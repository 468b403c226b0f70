//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

/// Network reachability observatory.
///
/// Default behavior is a one-shot check: boot the monitors, wait a few
/// seconds for BGP updates, print the merged status and exit. Pass
/// --run for the long-running monitor with periodic publication.
#[derive(Parser, Debug)]
#[command(name = "netwatch")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Save charts as PNG files in one-shot mode; inert unless a chart
    /// renderer adapter is wired in
    #[arg(long)]
    pub charts: bool,

    /// Directory for chart images
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Keep running: periodic probing and publication until interrupted
    #[arg(long)]
    pub run: bool,

    /// Increase log verbosity
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::parse_from(["netwatch"]);
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert_eq!(args.output, PathBuf::from("."));
        assert!(!args.charts);
        assert!(!args.run);
    }

    #[test]
    fn flags_parse() {
        let args = Args::parse_from([
            "netwatch", "--run", "--charts", "-o", "/tmp/charts", "-c", "/etc/netwatch.json",
        ]);
        assert!(args.run);
        assert!(args.charts);
        assert_eq!(args.output, PathBuf::from("/tmp/charts"));
        assert_eq!(args.config, PathBuf::from("/etc/netwatch.json"));
    }
}
