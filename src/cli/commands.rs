//! CLI command definitions using clap.
//!
//! - run: the resident loop (default)
//! - fetch: one fetch, printed to the console
//! - sync: one clock sync
//! - probe: network diagnostics

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// trainsign - subway arrival display controller
#[derive(Parser, Debug)]
#[command(name = "trainsign")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    pub stderr: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the display loop (default)
    Run,

    /// Fetch arrivals once and print them
    Fetch {
        /// Sync the clock before fetching
        #[arg(short, long)]
        sync: bool,
    },

    /// Sync the clock once and print the UTC offset
    Sync,

    /// Check interface, signal and internet reachability
    Probe {
        /// URL to fetch instead of the configured probe URL
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["trainsign"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.is_verbose());
        assert!(!cli.stderr);
    }

    #[test]
    fn test_run_with_global_flags() {
        let cli =
            Cli::try_parse_from(["trainsign", "run", "--config", "/etc/trainsign.yml", "-v", "--stderr"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Run));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/trainsign.yml")));
        assert!(cli.is_verbose());
        assert!(cli.stderr);
    }

    #[test]
    fn test_fetch_with_sync() {
        let cli = Cli::try_parse_from(["trainsign", "fetch", "--sync"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Fetch { sync: true }));
    }

    #[test]
    fn test_probe_url() {
        let cli = Cli::try_parse_from(["trainsign", "probe", "--url", "http://example.com"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Probe {
                url: Some("http://example.com".to_string())
            })
        );
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        assert!(Cli::try_parse_from(["trainsign", "reboot"]).is_err());
    }
}
