// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// navbridge: Walking routes and place lookup from the command line.
//
// Entry point. Initialises logging, loads the config and runs one command
// through the navigation module. Results are printed as GeoJSON on stdout;
// rejections as `{code, message, kind}` JSON on stderr.

mod cli;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use navbridge_core::error::{NavBridgeError, Result};
use navbridge_core::rejection::Rejection;

use cli::{Cli, Command, ConfigAction};
use services::app_services::{AppServices, load_config, persist_config};
use services::data_dir;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("navbridge starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            let rejection = Rejection::from(&e);
            match serde_json::to_string(&rejection) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{}: {}", rejection.code, rejection.message),
            }
            ExitCode::FAILURE
        }
    }
}

fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(data_dir::config_path(&data_dir::data_dir()?)),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = resolve_config_path(cli.config)?;
    let mut config = load_config(&config_path)?;

    match cli.command {
        Command::Route { waypoints, profile } => {
            if let Some(profile) = profile {
                config.travel_profile = profile;
            }
            let services = AppServices::start(config_path, config)?;
            let result = services.route(&waypoints).await;
            services.shutdown();
            println!("{}", result?.geo_json);
        }
        Command::Geocode { point, language } => {
            let services = AppServices::start(config_path, config)?;
            let result = services.geocode(point, &language).await;
            services.shutdown();
            println!("{}", result?.geo_json);
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            }
            ConfigAction::Path => {
                println!("{}", config_path.display());
            }
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    return Err(NavBridgeError::Config(format!(
                        "{} already exists (use --force to overwrite)",
                        config_path.display()
                    )));
                }
                persist_config(&config_path, &navbridge_core::BridgeConfig::default())?;
                println!("{}", config_path.display());
            }
            ConfigAction::SetToken { token } => {
                config.access_token = Some(token);
                persist_config(&config_path, &config)?;
            }
        },
    }
    Ok(())
}
