//! `cfpilot` - fly a Crazyflie through waypoints or voice commands

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio::io::BufReader;

use crazyflie_pilot::logging::{init_logging, Verbosity};
use crazyflie_pilot::voice::{run_voice_session, LineCommandSource};
use crazyflie_pilot::{BaseDrone, Config, CrazyflieLink, Drone, FileTocCache, FlightPlan, Frame, Waypoint};

/// Fly a Crazyflie 2.1 through waypoints, relative to its initial pose
#[derive(Debug, Parser)]
#[command(name = "cfpilot", version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file (default: ./cfpilot.toml if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// URI of the Crazyflie, overrides the configuration
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Do not read or write the TOC cache
    #[arg(long, global = true)]
    no_toc_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Preview a flight plan on the LED ring, red for negative x and green otherwise
    Leds {
        /// TOML flight plan, defaults to the waypoints of the configuration
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,
    },
    #[command(flatten)]
    Flight(FlightCommand),
}

/// Commands that need the position estimate
#[derive(Debug, Subcommand)]
enum FlightCommand {
    /// Fly to a single point, then land with --land or disconnect.
    ///
    /// Without --land the firmware cuts the motors shortly after the link is closed.
    #[command(allow_negative_numbers = true)]
    FlyPoint {
        /// X (meters)
        x: f32,
        /// Y (meters)
        y: f32,
        /// Z (meters)
        z: f32,
        /// Yaw (degrees), defaults to the initial yaw
        #[arg(long)]
        yaw: Option<f32>,
        /// Send the point as is instead of relative to the initial pose
        #[arg(long)]
        absolute: bool,
        /// Land after reaching the point
        #[arg(long)]
        land: bool,
    },
    /// Fly a sequence of waypoints and stop the motors
    FlySequence {
        /// TOML flight plan, defaults to the waypoints of the configuration
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,
        /// Do not bring the drone down before cutting the motors
        #[arg(long)]
        no_z_safety: bool,
    },
    /// Fly from phrases read on stdin, one per line: start, left, stop
    Voice,
}

fn load_waypoints(plan: Option<PathBuf>, config: &Config) -> anyhow::Result<Vec<Waypoint>> {
    match plan {
        Some(path) => {
            let plan = FlightPlan::load(&path).with_context(|| format!("loading flight plan {}", path.display()))?;
            Ok(plan.waypoints)
        }
        None => Ok(config.waypoints.clone()),
    }
}

async fn show_leds(link: CrazyflieLink, plan: Option<PathBuf>, config: &Config) -> anyhow::Result<()> {
    let drone = BaseDrone::connect(link, config.leds.clone());

    let result = match load_waypoints(plan, config) {
        Ok(waypoints) => drone.led_ring().red_green_color(&waypoints).await.map_err(Into::into),
        Err(e) => Err(e),
    };

    drone.disconnect().await;
    result
}

async fn fly(drone: &Drone<CrazyflieLink>, command: FlightCommand, config: &Config) -> anyhow::Result<()> {
    match command {
        FlightCommand::FlyPoint {
            x,
            y,
            z,
            yaw,
            absolute,
            land,
        } => {
            let frame = if absolute { Frame::Absolute } else { Frame::Relative };
            drone.fly_to_point(Waypoint::new(x, y, z), yaw, frame).await?;
            if land {
                drone.land().await?;
            } else {
                warn!("Not landing, the motors stop once the setpoints time out");
            }
        }
        FlightCommand::FlySequence { plan, no_z_safety } => {
            let waypoints = load_waypoints(plan, config)?;
            info!("Flying {} waypoints", waypoints.len());
            drone
                .fly_sequence(
                    &waypoints,
                    config.flight.time_between_commands(),
                    config.flight.check_z_safety && !no_z_safety,
                )
                .await?;
        }
        FlightCommand::Voice => {
            let mut source = LineCommandSource::new(BufReader::new(tokio::io::stdin()));
            run_voice_session(drone, &mut source).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    if let Some(uri) = cli.uri {
        config.link.uri = uri;
    }

    let toc_cache = if cli.no_toc_cache {
        FileTocCache::disabled()
    } else {
        FileTocCache::from_path(config.link.toc_cache_path())
    };
    let link = CrazyflieLink::connect(&config.link.uri, toc_cache)
        .await
        .with_context(|| format!("connecting to {}", config.link.uri))?;

    let command = match cli.command {
        Command::Leds { plan } => return show_leds(link, plan, &config).await,
        Command::Flight(command) => command,
    };

    let drone = Drone::connect(link, config.initial_pose, &config)
        .await
        .context("waiting for the position estimator")?;

    let result = fly(&drone, command, &config).await;
    if let Err(e) = &result {
        error!("{:#}, stopping the motors", e);
        if let Err(e) = drone.stop().await {
            error!("Could not stop the motors: {}", e);
        }
    }

    drone.disconnect().await;
    result
}
