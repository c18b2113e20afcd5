// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use navbridge_core::types::{Coordinate, TravelProfile};

#[derive(Debug, Parser)]
#[command(name = "navbridge", version)]
#[command(about = "Walking routes and place lookup through the navigation bridge")]
#[command(long_about = "Walking routes and place lookup through the navigation bridge.

Coordinates are always longitude first:
  navbridge route -w 114.1869509,22.3528619 -w 114.1893649,22.3522368
  navbridge geocode 114.19,22.35 --language zh

The access token is read from the config file or MAPBOX_ACCESS_TOKEN.")]
pub struct Cli {
    /// Config file (defaults to the navbridge data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Route through two or more waypoints and print the LineString
    Route {
        /// Waypoint as lon,lat; repeat in travel order
        #[arg(short = 'w', long = "waypoint", required = true, num_args = 1, allow_hyphen_values = true)]
        waypoints: Vec<Coordinate>,

        /// walking, cycling, driving or driving-traffic
        #[arg(short, long)]
        profile: Option<TravelProfile>,
    },
    /// Look up places around a point
    Geocode {
        /// Point as lon,lat
        #[arg(allow_hyphen_values = true)]
        point: Coordinate,

        /// Language for place names
        #[arg(short, long, default_value = "en")]
        language: String,
    },
    /// Inspect or write the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Store the access token in the config file
    SetToken { token: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn route_waypoints_parse_longitude_first() {
        let cli = Cli::try_parse_from([
            "navbridge",
            "route",
            "-w",
            "114.1869509,22.3528619",
            "--waypoint",
            "114.1893649,22.3522368",
            "--profile",
            "cycling",
        ])
        .unwrap();
        match cli.command {
            Command::Route { waypoints, profile } => {
                assert_eq!(waypoints.len(), 2);
                assert_eq!(waypoints[0].to_pair(), [114.1869509, 22.3528619]);
                assert_eq!(profile, Some(TravelProfile::Cycling));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn negative_coordinates_are_values() {
        let cli = Cli::try_parse_from(["navbridge", "geocode", "-l", "fr", "-122.42,37.77"]).unwrap();
        match cli.command {
            Command::Geocode { point, language } => {
                assert_eq!(point.to_pair(), [-122.42, 37.77]);
                assert_eq!(language, "fr");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn malformed_waypoint_is_refused() {
        assert!(Cli::try_parse_from(["navbridge", "route", "-w", "114.18"]).is_err());
    }
}
