//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Herald - Discord chat-bot backend
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(about = "Discord chat-bot backend with prefix commands", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "herald.toml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Connect to Discord and serve commands until Ctrl+C
    Run,

    /// Load and validate the configuration, then print the resolved intents
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from(["herald", "check-config", "--config", "bot.toml", "-v"]);
        assert_eq!(cli.command, Commands::CheckConfig);
        assert_eq!(cli.config, PathBuf::from("bot.toml"));
        assert!(cli.verbose);
        assert!(!cli.json_logs);
    }

    #[test]
    fn config_defaults_to_herald_toml() {
        let cli = Cli::parse_from(["herald", "run", "--json-logs"]);
        assert_eq!(cli.command, Commands::Run);
        assert_eq!(cli.config, PathBuf::from("herald.toml"));
        assert!(cli.json_logs);
    }
}
