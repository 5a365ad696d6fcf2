//! Herald CLI binary.
//!
//! - `run` connects to Discord and answers prefix commands until Ctrl+C
//! - `check-config` validates the configuration and prints the resolved intents

use clap::Parser;
use herald_core::{HeraldConfig, TOKEN_ENV};
use herald_discord::{HeraldBot, resolve_intents};
use herald_error::HeraldResult;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

mod cli;
mod commands;
mod observability;

use cli::{Cli, Commands};
use commands::CommandFramework;
use observability::{LoggingConfig, init_logging};

/// Load the file if present, then overlay the environment.
fn load_config(cli: &Cli) -> HeraldResult<HeraldConfig> {
    let mut config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading configuration");
        HeraldConfig::from_file(&cli.config)?
    } else {
        info!(
            path = %cli.config.display(),
            "No configuration file, using defaults and {}", TOKEN_ENV
        );
        HeraldConfig::default()
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

async fn run(config: HeraldConfig) -> HeraldResult<()> {
    let discord = config.discord();
    let framework = Arc::new(CommandFramework::new(discord.command_prefix.clone()));
    let bot = HeraldBot::new(discord, framework).await?;
    bot.serve().await
}

fn check_config(config: &HeraldConfig) {
    let discord = config.discord();
    let intents = resolve_intents(discord.initial_intents, &discord.intents);

    println!("Configuration OK");
    println!("  initial intents:    {:?}", discord.initial_intents);
    println!("  resolved intents:   {:?}", intents);
    println!("  message size limit: {}", discord.effective_message_size_limit());
    println!("  command prefix:     {:?}", discord.command_prefix);
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = init_logging(&LoggingConfig::new(cli.verbose, cli.json_logs)) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::CheckConfig => check_config(&config),
        Commands::Run => {
            if let Err(e) = run(config).await {
                error!(error = %e, "Herald stopped with an error");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
