//! dextd - driver extension activation controller
//!
//! Drives one activation or deactivation through the scripted extension
//! manager and reports the resulting status.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dext_shared::{ActivationStatus, DextError, State};
use dextd::config::Config;
use dextd::scripted::{parse_script, ScriptedExtensionManager};
use dextd::{logging, service};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "dextd")]
#[command(about = "Driver extension activation controller", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to /etc/dextd/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extension identifier (overrides the config)
    #[arg(long, global = true)]
    identifier: Option<String>,

    /// Print the final status as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate the extension
    Activate {
        /// Callbacks to replay: replace, approve, finish, reboot, fail[:code]
        #[arg(long, default_value = "approve,finish")]
        script: String,

        /// How long to wait for the attempt to settle
        #[arg(long, default_value_t = 2000)]
        wait_ms: u64,
    },

    /// Deactivate the extension (state is not tracked)
    Deactivate {
        /// Callbacks to replay for the deactivation request
        #[arg(long, default_value = "finish")]
        script: String,
    },

    /// List every state with its status text
    States,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e.downcast_ref::<DextError>().map_or(1, DextError::exit_code);
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let (config, source) = Config::load_with_source(cli.config.as_deref());
    logging::init(&config.log.level)?;
    source.log();

    let identifier = cli
        .identifier
        .unwrap_or_else(|| config.extension.identifier.clone());
    info!("dextd v{} managing {}", env!("CARGO_PKG_VERSION"), identifier);

    match cli.command {
        Commands::States => {
            for state in State::ALL {
                println!("{:<18} {}", state.to_string(), state.status_text().replace('\n', " "));
            }
            Ok(0)
        }

        Commands::Activate { script, wait_ms } => {
            let manager = ScriptedExtensionManager::new(parse_script(&script)?);
            let handle = service::spawn(manager, identifier, &config.controller);
            handle.activate()?;

            let settled = handle.wait_until(|s| {
                matches!(s.state, State::Activated | State::ActivationError)
            });
            match tokio::time::timeout(Duration::from_millis(wait_ms), settled).await {
                Ok(status) => {
                    status?;
                }
                Err(_) => warn!("Activation still pending after {} ms", wait_ms),
            }

            // Callbacks queued behind the settling one are applied during
            // stop, so report the state it ends in.
            let stopped = handle.stop().await?;
            info!("Applied {} transitions", stopped.history.len());
            let status = stopped.status;
            print_status(&status, cli.json)?;

            Ok(if status.state == State::Activated { 0 } else { 1 })
        }

        Commands::Deactivate { script } => {
            let manager = ScriptedExtensionManager::new(Vec::new())
                .with_deactivation_script(parse_script(&script)?);
            let handle = service::spawn(manager, identifier, &config.controller);
            handle.deactivate()?;

            // Deactivation outcomes are logged, never modeled.
            let stopped = handle.stop().await?;
            print_status(&stopped.status, cli.json)?;
            Ok(0)
        }
    }
}

fn print_status(status: &ActivationStatus, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
    } else {
        println!("{}", status.text);
    }
    Ok(())
}
